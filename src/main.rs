//! pkgrun：以所在包层次中的模块身份运行源文件
//!
//! 主入口点

mod config;
mod error;
mod i18n;
mod loader;
mod mount;
mod package;
mod signal;

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info, warn};

use config::{ACTIVE_ENV_VAR, DEFAULT_INTERPRETER, INTERPRETER_VAR, LOG_VAR, TOOL_NAME, VERSION};
use error::{Result, RunError, EXIT_FAILURE};
use i18n::{format_message, messages, Locale};
use loader::{Execution, ExecutionContext, Interpreter, ModuleResolver, PythonInterpreter, RunStatus};
use mount::{Mount, SearchPathState};
use package::{display_path, AnyOf, DottedName, DottedSegment, MarkerEntry, RootResolver, Target};
use signal::SignalGuard;

/// 命令行参数
///
/// `<path>` 之后的所有参数原样交给目标程序
#[derive(Parser, Debug)]
#[command(name = TOOL_NAME, version = VERSION, about, disable_help_subcommand = true)]
struct Cli {
    /// Interpreter used to execute the target
    #[arg(long, value_name = "EXE", env = INTERPRETER_VAR, default_value = DEFAULT_INTERPRETER)]
    python: PathBuf,

    /// Also stop the module root search at directories containing MARKER (e.g. .git)
    #[arg(long = "stop-at", value_name = "MARKER")]
    stop_at: Vec<String>,

    /// Do not treat directories whose name contains '.' as module roots
    #[arg(long)]
    no_dot_heuristic: bool,

    /// Do not print the module root and import name
    #[arg(short, long)]
    quiet: bool,

    /// Message language (en, zh)
    #[arg(long, value_name = "LANG", default_value = "en")]
    lang: String,

    /// File or package directory to run, then arguments passed through to the target program
    #[arg(value_name = "PATH", trailing_var_arg = true)]
    command: Vec<OsString>,
}

impl Cli {
    /// 目标路径与转交参数；第一个位置参数之后的内容不再被本工具解析
    fn target(&self) -> Option<(&Path, &[OsString])> {
        let (path, args) = self.command.split_first()?;
        Some((Path::new(path), args))
    }

    /// 根据选项组合停止策略
    fn root_resolver(&self) -> RootResolver {
        let mut policy = AnyOf::default();
        if !self.no_dot_heuristic {
            policy.push(DottedSegment);
        }
        for marker in &self.stop_at {
            policy.push(MarkerEntry(marker.clone()));
        }
        RootResolver::new(policy).with_active_env(env::var_os(ACTIVE_ENV_VAR))
    }
}

/// 解析、挂载并运行目标文件
fn run_file(cli: &Cli, path: &Path, args: &[OsString], locale: Locale) -> Result<RunStatus> {
    let cwd = env::current_dir().map_err(|e| RunError::io(".", e))?;

    // 先捕获原始搜索路径，随后立即清空
    let mut search = SearchPathState::capture(&cwd);
    search.clear();

    let target = Target::from_arg(path, &cwd)?;
    let root = cli.root_resolver().resolve(&target.dir);
    let name = DottedName::between(&root, &target.file)?;

    if !cli.quiet {
        println!(
            "{}",
            format_message(
                messages::MSG_CLI_DIAGNOSTIC,
                locale,
                &[&display_path(&root), name.as_str()],
            )
        );
    }
    let mount = Mount::create(&root)?;
    info!("module root {} mounted at {} as {}", root.display(), mount.alias().display(), name);
    search.mount(&mount);

    let resolver = ModuleResolver::new();
    let spec = resolver.find_spec(&mount.qualified(&name), search.active())?;
    resolver.verify_origin(&spec, &target.file)?;
    let code = resolver.load_code(&spec)?;
    let context = ExecutionContext::entry_point(&target, &spec);

    // 执行前恢复原始搜索路径
    let original = search.restore();

    let interpreter = PythonInterpreter::new(&cli.python);
    let guard = SignalGuard::install();
    let status = interpreter.execute(&Execution {
        context: &context,
        code: &code,
        mount: &mount,
        search_path: &original,
        args,
    });
    if let Some(sig) = guard.received() {
        debug!("received signal {} while the target was running", sig);
    }
    drop(guard);

    if let Err(e) = mount.close() {
        warn!("cannot remove temporary mount: {}", e);
    }
    status
}

/// 把子进程的结束方式转换为本进程的退出码
fn exit_with(status: RunStatus) -> ExitCode {
    match status {
        RunStatus::Exited(code) => ExitCode::from((code & 0xff) as u8),
        RunStatus::Signaled(sig) => {
            signal::reraise(sig);
            // 信号未能终止本进程时，按 shell 的约定返回
            ExitCode::from((128 + sig).clamp(0, 255) as u8)
        }
    }
}

fn usage(locale: Locale) -> String {
    let program = env::args().next().unwrap_or_else(|| TOOL_NAME.to_string());
    format_message(messages::MSG_CLI_USAGE, locale, &[&program])
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_VAR, "warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    let locale = Locale::from_tag(&cli.lang);

    let Some((path, args)) = cli.target() else {
        let err = RunError::Usage(usage(locale));
        eprintln!("{}", err.localized(locale));
        return ExitCode::from(err.exit_code());
    };

    match run_file(&cli, path, args, locale) {
        Ok(status) => exit_with(status),
        Err(e) => {
            debug!("run failed: {:?}", e);
            eprintln!(
                "{}",
                format_message(messages::MSG_CLI_ERROR, locale, &[&e.localized(locale)])
            );
            ExitCode::from(e.exit_code())
        }
    }
}
