//! 中文消息

use super::messages::*;

/// 获取中文消息
pub fn get(key: &str) -> &'static str {
    match key {
        // CLI 消息
        MSG_CLI_USAGE => "用法: {} [选项] <路径> [参数...]",
        MSG_CLI_FILE_NOT_FOUND => "文件不存在: {}",
        // 诊断行格式固定，供脚本解析
        MSG_CLI_DIAGNOSTIC => "moduleroot={} import_name={}",
        MSG_CLI_ERROR => "错误: {}",

        // 运行错误
        ERR_MOUNT_FAILED => "无法将 {} 挂载为 {}: {}",
        ERR_RESOLUTION_FAILED => "无法解析模块 '{}': {}",
        ERR_LAUNCH_FAILED => "无法启动解释器 '{}': {}",
        ERR_IO_FAILED => "无法访问 {}: {}",

        // 未知消息键
        _ => "未知消息键",
    }
}
