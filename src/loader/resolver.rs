//! 模块名解析
//!
//! 按搜索路径逐项查找点分名对应的源文件。只定位、只读取，不执行任何代码。

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::{MOUNT_SENTINEL, PACKAGE_INIT_STEM, SOURCE_EXTENSION};
use crate::error::{Result, RunError};
use crate::mount::SearchPath;
use crate::package::display_path;

/// 模块类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// 普通源文件 `<name>.py`
    Source,
    /// 包初始化文件 `<name>/__init__.py`
    Package,
}

/// 加载器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    SourceFile,
}

impl LoaderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderKind::SourceFile => "SourceFileLoader",
        }
    }
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    /// 完整导入名，如 `pkgrun-root.pkg.sub`
    pub name: String,
    /// 源文件路径（位于挂载点之下）
    pub origin: PathBuf,
    pub kind: ModuleKind,
    pub loader: LoaderKind,
}

impl ModuleSpec {
    /// 所属包：包自身的名字，或去掉最后一段的名字
    pub fn parent(&self) -> &str {
        match self.kind {
            ModuleKind::Package => &self.name,
            ModuleKind::Source => self.name.rsplit_once('.').map(|(p, _)| p).unwrap_or(""),
        }
    }
}

/// 已读取但尚未执行的代码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeUnit {
    pub origin: PathBuf,
    pub source: Vec<u8>,
}

/// 模块解析器
#[derive(Debug, Default)]
pub struct ModuleResolver;

impl ModuleResolver {
    pub fn new() -> Self {
        Self
    }

    /// 在 `search` 中查找 `name`
    ///
    /// 中间段必须是目录（普通包或命名空间包）；最后一段先找包再找源文件
    pub fn find_spec(&self, name: &str, search: &SearchPath) -> Result<ModuleSpec> {
        let segments: Vec<&str> = name.split('.').collect();
        for (i, segment) in segments.iter().enumerate() {
            let valid = (i == 0 && *segment == MOUNT_SENTINEL) || is_identifier(segment);
            if !valid {
                return Err(RunError::resolution(
                    name,
                    format!("'{}' is not a valid module name segment", segment),
                ));
            }
        }

        if search.is_empty() {
            return Err(RunError::resolution(name, "search path is empty"));
        }

        let (leaf, parents) = segments
            .split_last()
            .ok_or_else(|| RunError::resolution(name, "empty module name"))?;

        for entry in search.entries() {
            if let Some(spec) = find_in(entry, parents, leaf, name) {
                debug!("resolved {} to {}", name, spec.origin.display());
                return Ok(spec);
            }
        }

        Err(RunError::resolution(
            name,
            format!("no module found on search path {:?}", search.entries()),
        ))
    }

    /// 读取模块源码，不执行
    pub fn load_code(&self, spec: &ModuleSpec) -> Result<CodeUnit> {
        let source = fs::read(&spec.origin).map_err(|e| {
            RunError::resolution(
                &spec.name,
                format!("cannot read {}: {}", spec.origin.display(), e),
            )
        })?;
        Ok(CodeUnit {
            origin: spec.origin.clone(),
            source,
        })
    }

    /// 确认解析结果就是目标文件本身
    ///
    /// 同名的包会遮蔽源文件：`tool/__init__.py` 优先于 `tool.py`
    pub fn verify_origin(&self, spec: &ModuleSpec, file: &Path) -> Result<()> {
        let origin = fs::canonicalize(&spec.origin).map_err(|e| RunError::io(&spec.origin, e))?;
        let expected = fs::canonicalize(file).map_err(|e| RunError::io(file, e))?;
        if origin != expected {
            return Err(RunError::resolution(
                &spec.name,
                format!("shadowed by {}", display_path(&origin)),
            ));
        }
        Ok(())
    }
}

fn find_in(entry: &Path, parents: &[&str], leaf: &str, name: &str) -> Option<ModuleSpec> {
    let mut dir = entry.to_path_buf();
    for parent in parents {
        dir.push(parent);
        if !dir.is_dir() {
            return None;
        }
    }

    let package_init = dir
        .join(leaf)
        .join(format!("{}.{}", PACKAGE_INIT_STEM, SOURCE_EXTENSION));
    if package_init.is_file() {
        return Some(ModuleSpec {
            name: name.to_string(),
            origin: package_init,
            kind: ModuleKind::Package,
            loader: LoaderKind::SourceFile,
        });
    }

    let module_file = dir.join(format!("{}.{}", leaf, SOURCE_EXTENSION));
    if module_file.is_file() {
        return Some(ModuleSpec {
            name: name.to_string(),
            origin: module_file,
            kind: ModuleKind::Source,
            loader: LoaderKind::SourceFile,
        });
    }
    None
}

/// 字母或 `_` 开头，其余为字母、数字或 `_`
pub fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}
