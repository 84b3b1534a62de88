//! 命令行目标规范化
//!
//! 把用户传入的路径转换为绝对文件路径；目录目标视为包，入口是 `__main__`

use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::config::{ENTRY_STEM, SOURCE_EXTENSION};
use crate::error::{Result, RunError};

/// 要执行的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// 文件的绝对路径
    pub file: PathBuf,
    /// 包含该文件的目录，向上查找模块根的起点
    pub dir: PathBuf,
}

impl Target {
    /// 从命令行参数构建目标
    ///
    /// 相对路径基于 `cwd` 解析；结果必须是一个已存在的普通文件
    pub fn from_arg(arg: &Path, cwd: &Path) -> Result<Self> {
        let path = if arg.is_absolute() {
            normalize_lexically(arg)
        } else {
            normalize_lexically(&cwd.join(arg))
        };

        let target = if path.is_dir() {
            let entry = format!("{}.{}", ENTRY_STEM, SOURCE_EXTENSION);
            debug!("directory target {}, using {}", path.display(), entry);
            Target {
                file: path.join(entry),
                dir: path,
            }
        } else {
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone());
            Target { file: path, dir }
        };

        if !target.file.is_file() {
            return Err(RunError::NotFound { path: target.file });
        }
        Ok(target)
    }
}

/// 纯词法的路径规范化：去掉 `.`，`..` 弹出上一级，不解析符号链接
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // 根目录的上一级仍是根目录
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                );
                if !at_root {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(normalize_lexically(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_lexically(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize_lexically(Path::new("/a/b/")), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_relative_file_resolves_against_cwd() {
        let tmp = tempfile::tempdir().unwrap();
        let pkg = tmp.path().join("pkg");
        fs::create_dir(&pkg).unwrap();
        fs::write(pkg.join("run.py"), "").unwrap();

        let target = Target::from_arg(Path::new("./pkg/run.py"), tmp.path()).unwrap();
        assert_eq!(target.file, pkg.join("run.py"));
        assert_eq!(target.dir, pkg);
    }

    #[test]
    fn test_directory_target_uses_entry_file() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("app");
        fs::create_dir(&app).unwrap();
        fs::write(app.join("__main__.py"), "").unwrap();

        let target = Target::from_arg(&app, Path::new("/unused")).unwrap();
        assert_eq!(target.file, app.join("__main__.py"));
        assert_eq!(target.dir, app);
    }

    #[test]
    fn test_directory_without_entry_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Target::from_arg(tmp.path(), Path::new("/")).unwrap_err();
        match err {
            RunError::NotFound { path } => assert_eq!(path, tmp.path().join("__main__.py")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Target::from_arg(Path::new("missing.py"), tmp.path()).unwrap_err();
        assert!(matches!(err, RunError::NotFound { ref path } if path == &tmp.path().join("missing.py")));
    }
}
