//! 点分名计算

use std::fmt;
use std::path::{Component, Path};

use crate::config::SOURCE_EXTENSION;
use crate::error::{Result, RunError};

/// 目标文件相对模块根的点分名，如 `pkg.sub`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedName(String);

impl DottedName {
    /// 根据模块根和目标文件计算点分名
    ///
    /// # 示例
    /// - root = "/work/proj.v1"
    /// - target = "/work/proj.v1/pkg/sub.py"
    /// - 返回 "pkg.sub"
    pub fn between(root: &Path, target: &Path) -> Result<Self> {
        let relative = target.strip_prefix(root).map_err(|_| {
            RunError::resolution(
                target.display().to_string(),
                format!("not inside module root {}", root.display()),
            )
        })?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
                _ => {
                    return Err(RunError::resolution(
                        relative.display().to_string(),
                        "path is not a plain descendant of the module root",
                    ))
                }
            }
        }

        // 模块名不能以扩展名结尾
        let suffix = format!(".{}", SOURCE_EXTENSION);
        if let Some(last) = segments.last_mut() {
            if let Some(stem) = last.strip_suffix(&suffix) {
                *last = stem.to_string();
            }
        }

        if segments.is_empty() || segments.iter().any(String::is_empty) {
            return Err(RunError::resolution(
                relative.display().to_string(),
                "empty module name",
            ));
        }
        Ok(DottedName(segments.join(".")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 挂在某个顶层名字下的完整导入名
    pub fn qualified(&self, top: &str) -> String {
        format!("{}.{}", top, self.0)
    }
}

impl fmt::Display for DottedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
