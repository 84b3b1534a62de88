//! 配置常量模块
//!
//! 所有与目标语言布局相关的常量都在这里定义，便于后期修改

/// 工具名称
pub const TOOL_NAME: &str = "pkgrun";

/// 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 源码文件扩展名
pub const SOURCE_EXTENSION: &str = "py";

/// 目录目标的入口文件名（不含扩展名）
pub const ENTRY_STEM: &str = "__main__";

/// 包初始化文件名（不含扩展名）
pub const PACKAGE_INIT_STEM: &str = "__init__";

/// 临时挂载点中唯一入口的名字
///
/// 含有 `-`，普通导入永远无法产生这个名字
pub const MOUNT_SENTINEL: &str = "pkgrun-root";

/// 激活的隔离环境根目录
pub const ACTIVE_ENV_VAR: &str = "VIRTUAL_ENV";

/// 原始模块搜索路径
pub const SEARCH_PATH_VAR: &str = "PYTHONPATH";

/// 默认解释器
pub const DEFAULT_INTERPRETER: &str = "python3";

/// 覆盖解释器的环境变量
pub const INTERPRETER_VAR: &str = "PKGRUN_PYTHON";

/// 日志过滤环境变量
pub const LOG_VAR: &str = "PKGRUN_LOG";
