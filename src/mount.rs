//! 临时命名空间挂载
//!
//! 在临时目录中放置唯一一个指向模块根的链接，名字固定为 [`MOUNT_SENTINEL`]。
//! 解析阶段只能看到这个临时目录；执行前再换回原始搜索路径。

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;

use crate::config::{MOUNT_SENTINEL, SEARCH_PATH_VAR};
use crate::error::{Result, RunError};
use crate::package::DottedName;

/// 有序的模块搜索路径
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    /// 从 `PYTHONPATH` 形式的值构建，去掉空项和工作目录
    pub fn from_env_value(value: Option<OsString>, cwd: &Path) -> Self {
        let entries = value
            .map(|v| {
                env::split_paths(&v)
                    .filter(|p| !p.as_os_str().is_empty() && p != cwd && p != Path::new("."))
                    .collect()
            })
            .unwrap_or_default();
        Self { entries }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 拼接为环境变量值
    pub fn to_env_value(&self) -> Option<OsString> {
        if self.entries.is_empty() {
            return None;
        }
        env::join_paths(&self.entries).ok()
    }
}

/// 搜索路径的生命周期：捕获 → 清空 → 挂载 → 恢复
///
/// 状态显式传递，不修改任何进程级全局量
#[derive(Debug)]
pub struct SearchPathState {
    original: SearchPath,
    active: SearchPath,
}

impl SearchPathState {
    /// 捕获当前环境中的原始搜索路径
    pub fn capture(cwd: &Path) -> Self {
        let original = SearchPath::from_env_value(env::var_os(SEARCH_PATH_VAR), cwd);
        Self::with_original(original)
    }

    pub fn with_original(original: SearchPath) -> Self {
        debug!("captured search path: {:?}", original.entries());
        Self {
            active: original.clone(),
            original,
        }
    }

    /// 清空，阻止任何解析看到外部路径
    pub fn clear(&mut self) {
        debug!("search path cleared");
        self.active = SearchPath::default();
    }

    /// 只保留挂载点
    pub fn mount(&mut self, mount: &Mount) {
        debug!("search path set to mount {}", mount.dir().display());
        self.active = SearchPath::new(vec![mount.dir().to_path_buf()]);
    }

    /// 当前用于解析的搜索路径
    pub fn active(&self) -> &SearchPath {
        &self.active
    }

    /// 恢复原始搜索路径并交出
    pub fn restore(self) -> SearchPath {
        debug!("search path restored: {:?}", self.original.entries());
        self.original
    }
}

/// 临时挂载点；被 drop 时目录连同链接一起删除
#[derive(Debug)]
pub struct Mount {
    dir: TempDir,
    alias: PathBuf,
}

impl Mount {
    /// 在新的临时目录中创建指向 `root` 的链接
    pub fn create(root: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("pkgrun-")
            .tempdir()
            .map_err(|source| RunError::Mount {
                alias: env::temp_dir(),
                root: root.to_path_buf(),
                source,
            })?;
        Self::create_in(dir, root)
    }

    fn create_in(dir: TempDir, root: &Path) -> Result<Self> {
        let alias = dir.path().join(MOUNT_SENTINEL);
        // 出错时 dir 在这里被 drop，临时目录随之删除
        symlink_dir(root, &alias).map_err(|source| RunError::Mount {
            alias: alias.clone(),
            root: root.to_path_buf(),
            source,
        })?;
        debug!("mounted {} at {}", root.display(), alias.display());

        Ok(Self { dir, alias })
    }

    /// 临时目录本身，唯一的搜索路径项
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// 指向模块根的链接
    pub fn alias(&self) -> &Path {
        &self.alias
    }

    /// 在挂载点下解析用的完整名字：`<sentinel>.<dotted>`
    pub fn qualified(&self, name: &DottedName) -> String {
        name.qualified(MOUNT_SENTINEL)
    }

    /// 显式删除临时目录，返回删除时的错误
    pub fn close(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!("removed mount {}", path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn symlink_dir(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink_dir(original: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(original, link)
}
