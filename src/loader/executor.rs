//! 执行器
//!
//! 把解析好的代码和身份信息交给解释器子进程。子进程先在挂载点下定位父包，
//! 然后换回原始搜索路径，最后在新命名空间中执行代码。目标程序的异常不做任何处理。

use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use log::{debug, warn};

use super::context::ExecutionContext;
use super::resolver::CodeUnit;
use crate::config::SEARCH_PATH_VAR;
use crate::error::{Result, RunError};
use crate::mount::{Mount, SearchPath};

/// 引导程序的 argv：
/// `<mount> <import_name> <main_name> <file> <package> <cached|-> <doc|-> <loader> <code_fd|-> [args...]`
pub const BOOTSTRAP: &str = r#"import os, sys, types
from importlib import util as _util

def _pkgrun_prepare():
    mount, name, main_name, file, package, cached, doc, loader, fd = sys.argv[1:10]
    original = [p for p in sys.path if p not in ("", os.getcwd())]
    sys.path = [mount]
    try:
        spec = _util.find_spec(name)
    except ImportError as exc:
        sys.stderr.write("pkgrun: cannot resolve module %r: %s\n" % (name, exc))
        sys.exit(1)
    finally:
        sys.path = []
    if spec is None or spec.loader is None:
        sys.stderr.write("pkgrun: cannot resolve module %r\n" % name)
        sys.exit(1)
    if type(spec.loader).__name__ != loader:
        sys.stderr.write("pkgrun: module %r has loader %s, expected %s\n"
                         % (name, type(spec.loader).__name__, loader))
        sys.exit(1)
    if fd == "-":
        code = spec.loader.get_code(name)
    else:
        with os.fdopen(int(fd), "rb") as f:
            code = compile(f.read(), file, "exec", dont_inherit=True)
    module = types.ModuleType(main_name)
    scope = module.__dict__
    scope.update(
        __name__=main_name,
        __file__=file,
        __cached__=None if cached == "-" else cached,
        __doc__=None if doc == "-" else doc,
        __loader__=spec.loader,
        __package__=package,
        __spec__=spec,
    )
    sys.modules[main_name] = module
    sys.argv = [file] + sys.argv[10:]
    sys.path = original
    return code, scope

_pkgrun_code, _pkgrun_scope = _pkgrun_prepare()
del _pkgrun_prepare
exec(_pkgrun_code, _pkgrun_scope)
"#;

/// 引导程序参数中表示"无"的占位符
const ABSENT: &str = "-";

/// 一次执行所需的全部输入
#[derive(Debug)]
pub struct Execution<'a> {
    pub context: &'a ExecutionContext,
    pub code: &'a CodeUnit,
    pub mount: &'a Mount,
    /// 已恢复的原始搜索路径
    pub search_path: &'a SearchPath,
    /// 原样转交给目标程序的参数
    pub args: &'a [OsString],
}

/// 子进程的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Exited(i32),
    /// 被信号终止
    Signaled(i32),
}

impl From<ExitStatus> for RunStatus {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return RunStatus::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return RunStatus::Signaled(signal);
            }
        }
        RunStatus::Exited(1)
    }
}

/// 执行代码的后端
pub trait Interpreter {
    fn execute(&self, execution: &Execution<'_>) -> Result<RunStatus>;
}

/// 以子进程方式运行的 Python 解释器
#[derive(Debug, Clone)]
pub struct PythonInterpreter {
    program: PathBuf,
}

impl PythonInterpreter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// 构建子进程命令；`code_fd` 为 `-` 时由子进程自己读取源码
    pub fn command(&self, execution: &Execution<'_>, code_fd: &str) -> Command {
        let ctx = execution.context;
        debug!(
            "identity: __name__={} __file__={} __package__={} __loader__={}",
            ctx.name,
            ctx.file.display(),
            ctx.package,
            ctx.loader.as_str(),
        );
        let cached = ctx
            .cached
            .as_deref()
            .map(Path::as_os_str)
            .unwrap_or_else(|| OsStr::new(ABSENT));
        let doc = ctx.doc.as_deref().unwrap_or(ABSENT);
        let mut cmd = Command::new(&self.program);
        // -B：不写字节码缓存
        cmd.arg("-B")
            .arg("-c")
            .arg(BOOTSTRAP)
            .arg(execution.mount.dir())
            .arg(ctx.import_name())
            .arg(&ctx.name)
            .arg(&ctx.file)
            .arg(&ctx.package)
            .arg(cached)
            .arg(doc)
            .arg(ctx.loader.as_str())
            .arg(code_fd)
            .args(execution.args);

        match execution.search_path.to_env_value() {
            Some(value) => cmd.env(SEARCH_PATH_VAR, value),
            None => cmd.env_remove(SEARCH_PATH_VAR),
        };
        cmd
    }

    fn spawn_error(&self, source: io::Error) -> RunError {
        RunError::Launch {
            program: self.program.clone(),
            source,
        }
    }
}

impl Interpreter for PythonInterpreter {
    #[cfg(unix)]
    fn execute(&self, execution: &Execution<'_>) -> Result<RunStatus> {
        use std::os::fd::AsRawFd;

        let (reader, mut writer) =
            pipe::code_pipe().map_err(|e| RunError::io(execution.mount.dir(), e))?;
        let mut cmd = self.command(execution, &reader.as_raw_fd().to_string());

        debug!("spawning {} for {}", self.program.display(), execution.context.import_name());
        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;
        drop(reader);

        debug!(
            "sending {} bytes of {}",
            execution.code.source.len(),
            execution.code.origin.display()
        );
        // 子进程可能在读取源码前就已退出
        if let Err(e) = writer.write_all(&execution.code.source) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                debug!("interpreter closed the code pipe early");
            } else {
                warn!("cannot send code to interpreter: {}", e);
            }
        }
        drop(writer);

        let status = child.wait().map_err(|e| self.spawn_error(e))?;
        debug!("interpreter finished: {}", status);
        Ok(status.into())
    }

    #[cfg(not(unix))]
    fn execute(&self, execution: &Execution<'_>) -> Result<RunStatus> {
        let mut cmd = self.command(execution, ABSENT);
        debug!("spawning {} for {}", self.program.display(), execution.context.import_name());
        let status = cmd.status().map_err(|e| self.spawn_error(e))?;
        debug!("interpreter finished: {}", status);
        Ok(status.into())
    }
}

#[cfg(unix)]
mod pipe {
    use std::fs::File;
    use std::io;
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    /// 创建传递源码的管道：读端由子进程继承，写端留在本进程
    pub fn code_pipe() -> io::Result<(OwnedFd, File)> {
        let mut fds = [0 as libc::c_int; 2];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: pipe 刚返回的两个描述符只在这里被接管一次
        let (reader, writer) = unsafe { (OwnedFd::from_raw_fd(fds[0]), File::from_raw_fd(fds[1])) };

        // 写端泄漏给子进程会导致子进程永远读不到 EOF
        if unsafe { libc::fcntl(writer.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok((reader, writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::resolver::{LoaderKind, ModuleKind, ModuleSpec};
    use crate::package::Target;
    use std::ffi::OsStr;

    fn fixture(mount: &Mount) -> (ExecutionContext, CodeUnit) {
        let target = Target {
            file: PathBuf::from("/work/proj.v1/pkg/sub.py"),
            dir: PathBuf::from("/work/proj.v1/pkg"),
        };
        let spec = ModuleSpec {
            name: "pkgrun-root.pkg.sub".to_string(),
            origin: mount.alias().join("pkg").join("sub.py"),
            kind: ModuleKind::Source,
            loader: LoaderKind::SourceFile,
        };
        let code = CodeUnit {
            origin: spec.origin.clone(),
            source: b"print('ok')\n".to_vec(),
        };
        (ExecutionContext::entry_point(&target, &spec), code)
    }

    #[test]
    fn test_command_layout() {
        let root = tempfile::tempdir().unwrap();
        let mount = Mount::create(root.path()).unwrap();
        let (ctx, code) = fixture(&mount);
        let search = SearchPath::new(vec![PathBuf::from("/opt/lib")]);
        let args = vec![OsString::from("--verbose"), OsString::from("input.txt")];

        let execution = Execution {
            context: &ctx,
            code: &code,
            mount: &mount,
            search_path: &search,
            args: &args,
        };
        let cmd = PythonInterpreter::new("python3").command(&execution, "7");

        assert_eq!(cmd.get_program(), OsStr::new("python3"));
        let argv: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(argv[0], "-B");
        assert_eq!(argv[1], "-c");
        assert_eq!(argv[2], BOOTSTRAP);
        assert_eq!(argv[3], mount.dir().as_os_str());
        assert_eq!(argv[4], "pkgrun-root.pkg.sub");
        assert_eq!(argv[5], "__main__");
        assert_eq!(argv[6], "/work/proj.v1/pkg/sub.py");
        assert_eq!(argv[7], "pkgrun-root.pkg");
        assert_eq!(argv[8], "-");
        assert_eq!(argv[9], "-");
        assert_eq!(argv[10], "SourceFileLoader");
        assert_eq!(argv[11], "7");
        assert_eq!(&argv[12..], &["--verbose", "input.txt"]);

        let envs: Vec<_> = cmd.get_envs().collect();
        assert_eq!(
            envs,
            vec![(OsStr::new(SEARCH_PATH_VAR), Some(OsStr::new("/opt/lib")))]
        );
    }

    #[test]
    fn test_identity_fields_are_passed_through() {
        let root = tempfile::tempdir().unwrap();
        let mount = Mount::create(root.path()).unwrap();
        let (mut ctx, code) = fixture(&mount);
        ctx.cached = Some(PathBuf::from("/cache/sub.pyc"));
        ctx.doc = Some("Tool entry.".to_string());
        let search = SearchPath::default();

        let execution = Execution {
            context: &ctx,
            code: &code,
            mount: &mount,
            search_path: &search,
            args: &[],
        };
        let cmd = PythonInterpreter::new("python3").command(&execution, "-");
        let argv: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(argv[8], "/cache/sub.pyc");
        assert_eq!(argv[9], "Tool entry.");
        assert_eq!(argv[10], "SourceFileLoader");
        assert_eq!(argv[11], "-");
        assert_eq!(argv.len(), 12);
    }

    #[test]
    fn test_empty_search_path_removes_variable() {
        let root = tempfile::tempdir().unwrap();
        let mount = Mount::create(root.path()).unwrap();
        let (ctx, code) = fixture(&mount);
        let search = SearchPath::default();

        let execution = Execution {
            context: &ctx,
            code: &code,
            mount: &mount,
            search_path: &search,
            args: &[],
        };
        let cmd = PythonInterpreter::new("python3").command(&execution, "-");
        let envs: Vec<_> = cmd.get_envs().collect();
        assert_eq!(envs, vec![(OsStr::new(SEARCH_PATH_VAR), None)]);
    }

    #[test]
    fn test_missing_interpreter_is_launch_error() {
        let root = tempfile::tempdir().unwrap();
        let mount = Mount::create(root.path()).unwrap();
        let (ctx, code) = fixture(&mount);
        let search = SearchPath::default();

        let execution = Execution {
            context: &ctx,
            code: &code,
            mount: &mount,
            search_path: &search,
            args: &[],
        };
        let err = PythonInterpreter::new("/nonexistent/pkgrun-python")
            .execute(&execution)
            .unwrap_err();
        assert!(matches!(err, RunError::Launch { .. }));
    }

    #[test]
    fn test_bootstrap_restores_path_before_exec() {
        let restore = BOOTSTRAP.find("sys.path = original").unwrap();
        let exec = BOOTSTRAP.find("exec(_pkgrun_code").unwrap();
        let find = BOOTSTRAP.find("find_spec(name)").unwrap();
        let loader = BOOTSTRAP.find("type(spec.loader).__name__ != loader").unwrap();
        assert!(find < loader && loader < restore && restore < exec);
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_conversion() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(RunStatus::from(ExitStatus::from_raw(3 << 8)), RunStatus::Exited(3));
        assert_eq!(RunStatus::from(ExitStatus::from_raw(9)), RunStatus::Signaled(9));
    }
}
