//! 子进程运行期间的信号处理
//!
//! 终端的 Ctrl+C 会同时送达本进程和解释器子进程。本进程只记录信号并继续等待子进程，
//! 这样子进程退出后临时挂载点仍能被删除。信号处理函数在 exec 时会被重置，
//! 子进程的信号语义保持不变。

#[cfg(unix)]
mod imp {
    use std::sync::atomic::{AtomicI32, Ordering};

    use log::debug;

    const FORWARDED: [libc::c_int; 4] = [libc::SIGINT, libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT];

    /// 最近一次收到的信号（0 表示没有）
    static RECEIVED: AtomicI32 = AtomicI32::new(0);

    /// 只做原子写入
    extern "C" fn record(signal: libc::c_int) {
        RECEIVED.store(signal, Ordering::SeqCst);
    }

    /// 安装期间屏蔽终止信号，drop 时恢复原来的处理方式
    pub struct SignalGuard {
        previous: Vec<(libc::c_int, libc::sighandler_t)>,
    }

    impl SignalGuard {
        pub fn install() -> Self {
            let handler = record as extern "C" fn(libc::c_int) as libc::sighandler_t;
            let mut previous = Vec::with_capacity(FORWARDED.len());
            for &signal in FORWARDED.iter() {
                let old = unsafe { libc::signal(signal, handler) };
                if old != libc::SIG_ERR {
                    previous.push((signal, old));
                }
            }
            debug!("signal handlers installed for {:?}", FORWARDED);
            Self { previous }
        }

        /// 子进程运行期间收到的信号
        pub fn received(&self) -> Option<i32> {
            match RECEIVED.load(Ordering::SeqCst) {
                0 => None,
                signal => Some(signal),
            }
        }
    }

    impl Drop for SignalGuard {
        fn drop(&mut self) {
            for &(signal, old) in &self.previous {
                unsafe {
                    libc::signal(signal, old);
                }
            }
        }
    }

    /// 以默认方式对自身重新发出信号，使父进程看到与子进程相同的终止原因
    pub fn reraise(signal: i32) {
        unsafe {
            libc::signal(signal, libc::SIG_DFL);
            libc::raise(signal);
        }
    }
}

#[cfg(not(unix))]
mod imp {
    pub struct SignalGuard;

    impl SignalGuard {
        pub fn install() -> Self {
            SignalGuard
        }

        pub fn received(&self) -> Option<i32> {
            None
        }
    }

    pub fn reraise(_signal: i32) {}
}

pub use imp::{reraise, SignalGuard};
