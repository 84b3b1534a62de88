//! 执行上下文
//!
//! 描述"以程序入口身份运行某个文件"所需的全部元数据

use std::path::PathBuf;

use super::resolver::{LoaderKind, ModuleSpec};
use crate::package::Target;

/// 入口模块名
pub const MAIN_MODULE_NAME: &str = "__main__";

/// 注入到新命名空间中的身份信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// `__name__`
    pub name: String,
    /// `__file__`：目标文件的绝对路径（而非挂载点下的路径）
    pub file: PathBuf,
    /// `__package__`
    pub package: String,
    /// `__cached__`，始终为空
    pub cached: Option<PathBuf>,
    /// `__doc__`，始终为空
    pub doc: Option<String>,
    /// `__loader__`
    pub loader: LoaderKind,
    /// `__spec__`
    pub spec: ModuleSpec,
}

impl ExecutionContext {
    /// 以程序入口身份运行 `target`
    pub fn entry_point(target: &Target, spec: &ModuleSpec) -> Self {
        Self {
            name: MAIN_MODULE_NAME.to_string(),
            file: target.file.clone(),
            package: spec.parent().to_string(),
            cached: None,
            doc: None,
            loader: spec.loader,
            spec: spec.clone(),
        }
    }

    /// 解析时使用的完整导入名
    pub fn import_name(&self) -> &str {
        &self.spec.name
    }
}
