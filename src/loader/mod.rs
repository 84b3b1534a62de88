//! 加载与执行模块
//!
//! 负责在挂载点下解析模块名、读取代码、构建入口身份并交给解释器执行

mod context;
mod executor;
mod resolver;

pub use context::ExecutionContext;
pub use executor::{Execution, Interpreter, PythonInterpreter, RunStatus};
pub use resolver::ModuleResolver;
