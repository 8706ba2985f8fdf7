//! smapcheck CLI binary entry point.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tempfile::TempDir;

use smapcheck::cases;
use smapcheck::report::RunStats;
use smapcheck::runner::run_case;
use smapcheck::toolchain::{
    resolve_compiler, select_compiler, CommandTools, ToolCommand, ToolchainConfig,
};

/// Correctness harness for semantic-map and rename tooling.
///
/// Runs every test case (or one named case) through a three-phase check:
/// the source must compile, the semantic map must cover the independently
/// listed identifier occurrences, and every occurrence must survive a
/// mechanical rename and recompile.
#[derive(Parser, Debug)]
#[command(name = "smapcheck", version, about)]
struct Cli {
    /// Run a single named case instead of the whole corpus.
    case: Option<String>,

    /// Corpus root containing the test case directories.
    #[arg(long, default_value = ".")]
    cases_dir: PathBuf,

    /// Compiler executable override (default: per-architecture lookup).
    #[arg(long)]
    compiler: Option<String>,

    /// Semantic-map generator command.
    #[arg(long, default_value = "gocode smap")]
    smap_cmd: String,

    /// Identifier lister command.
    #[arg(long, default_value = "listidents")]
    lister_cmd: String,

    /// Rename tool command.
    #[arg(long, default_value = "rename")]
    rename_cmd: String,

    /// Per-subprocess timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Log level for tracing output (stderr).
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Resolve the toolchain configuration once at startup.
fn build_config(cli: &Cli, scratch: &TempDir) -> Result<ToolchainConfig, String> {
    let compiler_name = select_compiler(cli.compiler.as_deref())
        .ok_or_else(|| "no compiler known for this architecture; use --compiler".to_string())?;
    let compiler = resolve_compiler(&compiler_name)
        .map_err(|err| format!("compiler '{compiler_name}' not found on PATH: {err}"))?;

    let mut config = ToolchainConfig::new(compiler, scratch.path().to_path_buf());
    config.smap = ToolCommand::parse(&cli.smap_cmd)
        .ok_or_else(|| "--smap-cmd must not be empty".to_string())?;
    config.lister = ToolCommand::parse(&cli.lister_cmd)
        .ok_or_else(|| "--lister-cmd must not be empty".to_string())?;
    config.rename = ToolCommand::parse(&cli.rename_cmd)
        .ok_or_else(|| "--rename-cmd must not be empty".to_string())?;
    config.timeout = Duration::from_secs(cli.timeout);
    Ok(config)
}

fn run(cli: Cli) -> Result<ExitCode, String> {
    let scratch = TempDir::with_prefix("smapcheck_")
        .map_err(|err| format!("could not create scratch directory: {err}"))?;
    let config = build_config(&cli, &scratch)?;
    let tools = CommandTools::new(config);

    let cases = match &cli.case {
        Some(name) => vec![cases::single(&cli.cases_dir, name).map_err(|err| err.to_string())?],
        None => cases::discover(&cli.cases_dir)
            .map_err(|err| format!("could not scan {}: {err}", cli.cases_dir.display()))?,
    };

    let mut stats = RunStats::new();
    for case in &cases {
        let report = run_case(&tools, case);
        stats.record(&report);
    }
    println!("{}", stats.render());

    Ok(if stats.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match run(cli) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("smapcheck: error: {message}");
            ExitCode::from(2)
        }
    }
}
