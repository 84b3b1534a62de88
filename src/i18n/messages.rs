//! 消息键定义

// CLI 消息
pub const MSG_CLI_USAGE: &str = "cli.usage";
pub const MSG_CLI_FILE_NOT_FOUND: &str = "cli.file_not_found";
pub const MSG_CLI_DIAGNOSTIC: &str = "cli.diagnostic";
pub const MSG_CLI_ERROR: &str = "cli.error";

// 运行错误
pub const ERR_MOUNT_FAILED: &str = "err.mount_failed";
pub const ERR_RESOLUTION_FAILED: &str = "err.resolution_failed";
pub const ERR_LAUNCH_FAILED: &str = "err.launch_failed";
pub const ERR_IO_FAILED: &str = "err.io_failed";

/// 全部键，用于检查翻译是否齐全
#[cfg(test)]
pub const ALL: &[&str] = &[
    MSG_CLI_USAGE,
    MSG_CLI_FILE_NOT_FOUND,
    MSG_CLI_DIAGNOSTIC,
    MSG_CLI_ERROR,
    ERR_MOUNT_FAILED,
    ERR_RESOLUTION_FAILED,
    ERR_LAUNCH_FAILED,
    ERR_IO_FAILED,
];
