//! 模块根查找
//!
//! 查找逻辑：
//! 1. 若激活了隔离环境且起点目录以其路径为前缀，直接使用环境根目录
//! 2. 否则从起点目录向上逐级检查停止策略，命中即为模块根
//! 3. 到达文件系统根目录仍未命中时，使用最高的祖先目录

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;

/// 判断某个目录是否应当作为模块根
pub trait StopPolicy {
    fn is_root(&self, dir: &Path) -> bool;
}

impl<F> StopPolicy for F
where
    F: Fn(&Path) -> bool,
{
    fn is_root(&self, dir: &Path) -> bool {
        self(dir)
    }
}

/// 默认策略：目录名中含有 `.`（如 `proj.v1`、`site.env`）
#[derive(Debug, Clone, Copy, Default)]
pub struct DottedSegment;

impl StopPolicy for DottedSegment {
    fn is_root(&self, dir: &Path) -> bool {
        dir.file_name()
            .map(|name| name.to_string_lossy().contains('.'))
            .unwrap_or(false)
    }
}

/// 目录下存在指定名字的条目（如 `.git`）
#[derive(Debug, Clone)]
pub struct MarkerEntry(pub String);

impl StopPolicy for MarkerEntry {
    fn is_root(&self, dir: &Path) -> bool {
        dir.join(&self.0).symlink_metadata().is_ok()
    }
}

/// 任意一个策略命中即停止
#[derive(Default)]
pub struct AnyOf(pub Vec<Box<dyn StopPolicy>>);

impl AnyOf {
    pub fn push(&mut self, policy: impl StopPolicy + 'static) {
        self.0.push(Box::new(policy));
    }
}

impl StopPolicy for AnyOf {
    fn is_root(&self, dir: &Path) -> bool {
        self.0.iter().any(|policy| policy.is_root(dir))
    }
}

impl fmt::Debug for AnyOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyOf({} policies)", self.0.len())
    }
}

/// 模块根查找器
pub struct RootResolver {
    policy: Box<dyn StopPolicy>,
    /// 激活的隔离环境根目录
    active_env: Option<PathBuf>,
}

impl Default for RootResolver {
    fn default() -> Self {
        Self::new(DottedSegment)
    }
}

impl RootResolver {
    pub fn new(policy: impl StopPolicy + 'static) -> Self {
        Self {
            policy: Box::new(policy),
            active_env: None,
        }
    }

    /// 设置隔离环境根目录；空值视为未设置
    pub fn with_active_env(mut self, env_root: Option<OsString>) -> Self {
        self.active_env = env_root.filter(|v| !v.is_empty()).map(PathBuf::from);
        self
    }

    /// 从 `start` 开始查找模块根，结果总是 `start` 自身或它的祖先
    pub fn resolve(&self, start: &Path) -> PathBuf {
        if let Some(env_root) = self.env_short_circuit(start) {
            debug!("module root from active environment: {}", env_root.display());
            return env_root;
        }

        let mut current = start.to_path_buf();
        loop {
            if self.policy.is_root(&current) {
                debug!("stop policy matched at {}", current.display());
                return current;
            }

            // 向上一级目录
            match current.parent() {
                Some(parent) if parent != current && !parent.as_os_str().is_empty() => {
                    current = parent.to_path_buf();
                }
                _ => {
                    // 已到达根目录
                    debug!("no stop policy matched, falling back to {}", current.display());
                    return current;
                }
            }
        }
    }

    /// 环境根目录是起点目录的字面前缀时命中
    fn env_short_circuit(&self, start: &Path) -> Option<PathBuf> {
        let env_root = self.active_env.as_ref()?;
        let prefix = env_root.to_string_lossy();
        if start.to_string_lossy().starts_with(prefix.as_ref()) {
            Some(env_root.clone())
        } else {
            None
        }
    }
}
