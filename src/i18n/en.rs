//! English messages

use super::messages::*;

/// Get English message
pub fn get(key: &str) -> &'static str {
    match key {
        // CLI messages
        MSG_CLI_USAGE => "usage: {} [options] <path> [args...]",
        MSG_CLI_FILE_NOT_FOUND => "file does not exist: {}",
        MSG_CLI_DIAGNOSTIC => "moduleroot={} import_name={}",
        MSG_CLI_ERROR => "error: {}",

        // Run errors
        ERR_MOUNT_FAILED => "cannot mount {} as {}: {}",
        ERR_RESOLUTION_FAILED => "cannot resolve module '{}': {}",
        ERR_LAUNCH_FAILED => "cannot start interpreter '{}': {}",
        ERR_IO_FAILED => "cannot access {}: {}",

        // Unknown message key
        _ => "Unknown message key",
    }
}
