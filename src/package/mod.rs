//! 包层次模块
//!
//! 负责把命令行目标规范化为文件、向上查找模块根、计算点分名

mod name;
mod root;
mod target;

use std::path::Path;

pub use name::DottedName;
pub use root::{AnyOf, DottedSegment, MarkerEntry, RootResolver};
pub use target::Target;

/// 清理路径显示格式（移除 Windows 的 \\?\ 前缀）
pub fn display_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    // Windows canonicalize 返回 \\?\C:\... 格式，需要清理
    match s.strip_prefix(r"\\?\") {
        Some(rest) => rest.to_string(),
        None => s.to_string(),
    }
}
