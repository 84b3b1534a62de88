//! 错误类型
//!
//! 工具自身的错误都是致命的，不重试；目标程序自己的失败不在这里，
//! 它以子进程退出状态的形式原样传出

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::i18n::{format_message, messages, Locale};
use crate::package::display_path;

/// 一般错误的退出码
pub const EXIT_FAILURE: u8 = 1;
/// 解释器无法启动（与 shell 的 "command not found" 一致）
pub const EXIT_LAUNCH_FAILURE: u8 = 127;

#[derive(Debug, Error)]
pub enum RunError {
    /// 缺少必需参数或选项非法
    #[error("{0}")]
    Usage(String),

    /// 目标文件不存在
    #[error("file does not exist: {}", display_path(.path))]
    NotFound { path: PathBuf },

    /// 无法创建临时挂载点或其中的链接
    #[error("cannot mount {} as {}: {source}", display_path(.root), display_path(.alias))]
    Mount {
        alias: PathBuf,
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 点分名无法在挂载点下解析为代码
    #[error("cannot resolve module '{name}': {reason}")]
    Resolution { name: String, reason: String },

    /// 解释器无法启动
    #[error("cannot start interpreter '{}': {source}", display_path(.program))]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot access {}: {source}", display_path(.path))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RunError {
    pub fn resolution(name: impl Into<String>, reason: impl Into<String>) -> Self {
        RunError::Resolution {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RunError::Io {
            path: path.into(),
            source,
        }
    }

    /// 该错误对应的进程退出码
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Launch { .. } => EXIT_LAUNCH_FAILURE,
            _ => EXIT_FAILURE,
        }
    }

    /// 按语言渲染面向用户的消息
    pub fn localized(&self, locale: Locale) -> String {
        match self {
            RunError::Usage(msg) => msg.clone(),
            RunError::NotFound { path } => {
                format_message(messages::MSG_CLI_FILE_NOT_FOUND, locale, &[&display_path(path)])
            }
            RunError::Mount { alias, root, source } => format_message(
                messages::ERR_MOUNT_FAILED,
                locale,
                &[&display_path(root), &display_path(alias), &source.to_string()],
            ),
            RunError::Resolution { name, reason } => {
                format_message(messages::ERR_RESOLUTION_FAILED, locale, &[name, reason])
            }
            RunError::Launch { program, source } => format_message(
                messages::ERR_LAUNCH_FAILED,
                locale,
                &[&display_path(program), &source.to_string()],
            ),
            RunError::Io { path, source } => format_message(
                messages::ERR_IO_FAILED,
                locale,
                &[&display_path(path), &source.to_string()],
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_the_path() {
        let err = RunError::NotFound {
            path: PathBuf::from("/nowhere/script.py"),
        };
        assert_eq!(err.to_string(), "file does not exist: /nowhere/script.py");
        assert_eq!(err.localized(Locale::En), err.to_string());
        assert!(err.localized(Locale::Zh).contains("/nowhere/script.py"));
        assert_eq!(err.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_launch_failure_exit_code() {
        let err = RunError::Launch {
            program: PathBuf::from("python-missing"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.exit_code(), EXIT_LAUNCH_FAILURE);
        assert!(err.localized(Locale::En).starts_with("cannot start interpreter 'python-missing'"));
    }

    #[test]
    fn test_resolution_message() {
        let err = RunError::resolution("pkgrun-root.a.b", "no source file");
        assert_eq!(
            err.localized(Locale::En),
            "cannot resolve module 'pkgrun-root.a.b': no source file"
        );
    }
}
