//! External collaborator invocation.
//!
//! Every collaborator is a subprocess with captured stdout/stderr and a
//! bounded wait. The `Tools` trait is the seam the case runner depends on;
//! `CommandTools` is the subprocess implementation. Tests substitute fakes.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::error::{ToolError, ToolResult};
use crate::smap::{IdentOccurrence, SmapEntry};

/// Default per-subprocess timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// Compiler Selection
// ============================================================================

/// Map an architecture identifier to the compiler invocation name.
///
/// Accepts both the toolchain's own names (`386`, `amd64`, `arm`) and the
/// host identifiers Rust reports (`x86`, `x86_64`).
pub fn compiler_for_arch(arch: &str) -> Option<&'static str> {
    match arch {
        "386" | "x86" | "i386" | "i486" | "i586" | "i686" => Some("8g"),
        "amd64" | "x86_64" => Some("6g"),
        "arm" => Some("5g"),
        _ => None,
    }
}

/// Pick the compiler invocation name for this run.
///
/// Resolution order: explicit override, the `GOARCH` environment variable,
/// the host architecture. Resolved once at startup; never re-derived per
/// case.
pub fn select_compiler(override_name: Option<&str>) -> Option<String> {
    if let Some(name) = override_name {
        return Some(name.to_string());
    }
    if let Ok(goarch) = std::env::var("GOARCH") {
        return compiler_for_arch(&goarch).map(str::to_string);
    }
    compiler_for_arch(std::env::consts::ARCH).map(str::to_string)
}

/// Resolve a compiler name to an executable path on `PATH`.
///
/// Failing fast here gives one clear startup error instead of an identical
/// spawn failure per case.
pub fn resolve_compiler(name: &str) -> Result<PathBuf, which::Error> {
    which::which(name)
}

// ============================================================================
// Tool Invocation
// ============================================================================

/// Captured outcome of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Whether the process exited successfully. A timed-out process counts
    /// as unsuccessful.
    pub success: bool,
    /// Exit code if the process exited on its own.
    pub exit_code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

/// Run one tool to completion with a bounded wait.
///
/// The child is killed and reaped if it exceeds `timeout`; the timeout is
/// reported as an unsuccessful `ToolOutput` rather than an error, since the
/// protocol treats it as a failure of whatever phase it occurred in.
pub fn run_tool(program: &Path, args: &[String], timeout: Duration) -> ToolResult<ToolOutput> {
    let start = Instant::now();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ToolError::Spawn {
            tool: program.display().to_string(),
            source,
        })?;

    match child.wait_timeout(timeout)? {
        Some(status) => {
            let stdout = child
                .stdout
                .take()
                .map(|mut s| {
                    let mut buf = Vec::new();
                    std::io::Read::read_to_end(&mut s, &mut buf).ok();
                    buf
                })
                .unwrap_or_default();
            let stderr = child
                .stderr
                .take()
                .map(|mut s| {
                    let mut buf = Vec::new();
                    std::io::Read::read_to_end(&mut s, &mut buf).ok();
                    buf
                })
                .unwrap_or_default();

            debug!(
                tool = %program.display(),
                code = ?status.code(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "tool finished"
            );

            Ok(ToolOutput {
                success: status.success(),
                exit_code: status.code(),
                stdout: String::from_utf8_lossy(&stdout).to_string(),
                stderr: String::from_utf8_lossy(&stderr).to_string(),
            })
        }
        None => {
            let _ = child.kill();
            let _ = child.wait(); // Reap the zombie
            warn!(tool = %program.display(), ?timeout, "tool timed out");
            Ok(ToolOutput {
                success: false,
                exit_code: None,
                stdout: String::new(),
                stderr: format!("timed out after {timeout:?}"),
            })
        }
    }
}

// ============================================================================
// Collaborator Capabilities
// ============================================================================

/// The external collaborators the case runner depends on.
pub trait Tools {
    /// Type-check/compile a source file. Success is the exit status.
    fn check_source(&self, source: &Path) -> ToolResult<ToolOutput>;

    /// Produce the semantic map for a source file.
    fn semantic_map(&self, source: &Path) -> ToolResult<Vec<SmapEntry>>;

    /// Produce the ground-truth identifier occurrence list.
    fn list_idents(&self, source: &Path) -> ToolResult<Vec<IdentOccurrence>>;

    /// Rename the identifier at `offset` to `new_name`. The rewritten
    /// source is the tool's stdout; success is the exit status.
    fn rename(&self, source: &Path, offset: usize, new_name: &str) -> ToolResult<ToolOutput>;
}

/// One collaborator command: a program plus its fixed leading arguments.
///
/// The smap generator is typically a subcommand of a larger tool
/// (`gocode smap <file>`), so the fixed part can be more than one word.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub base_args: Vec<String>,
}

impl ToolCommand {
    /// Parse a whitespace-separated command string.
    pub fn parse(command: &str) -> Option<Self> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = PathBuf::from(words.next()?);
        Some(ToolCommand {
            program,
            base_args: words.collect(),
        })
    }

    fn invoke(&self, extra: &[String], timeout: Duration) -> ToolResult<ToolOutput> {
        let mut args = self.base_args.clone();
        args.extend_from_slice(extra);
        run_tool(&self.program, &args, timeout)
    }
}

/// Configuration for the subprocess toolchain, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Compiler executable (already resolved on `PATH`).
    pub compiler: PathBuf,
    /// Semantic-map generator command.
    pub smap: ToolCommand,
    /// Identifier lister command.
    pub lister: ToolCommand,
    /// Rename tool command.
    pub rename: ToolCommand,
    /// Per-subprocess timeout.
    pub timeout: Duration,
    /// Directory for compile artifacts (object files).
    pub scratch_dir: PathBuf,
}

impl ToolchainConfig {
    /// Default collaborator commands with an explicit compiler and scratch
    /// directory.
    pub fn new(compiler: PathBuf, scratch_dir: PathBuf) -> Self {
        ToolchainConfig {
            compiler,
            smap: ToolCommand {
                program: PathBuf::from("gocode"),
                base_args: vec!["smap".to_string()],
            },
            lister: ToolCommand {
                program: PathBuf::from("listidents"),
                base_args: Vec::new(),
            },
            rename: ToolCommand {
                program: PathBuf::from("rename"),
                base_args: Vec::new(),
            },
            timeout: DEFAULT_TIMEOUT,
            scratch_dir,
        }
    }
}

/// Subprocess implementation of the collaborator capabilities.
#[derive(Debug)]
pub struct CommandTools {
    config: ToolchainConfig,
    obj_path: PathBuf,
}

impl CommandTools {
    pub fn new(config: ToolchainConfig) -> Self {
        let obj_path = config.scratch_dir.join("check.obj");
        CommandTools { config, obj_path }
    }

    /// Invoke a tool whose stdout must parse as JSON, converting a failing
    /// exit or unparseable output into the corresponding `ToolError`.
    fn parsed<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
        cmd: &ToolCommand,
        source: &Path,
    ) -> ToolResult<T> {
        let out = cmd.invoke(&[source.display().to_string()], self.config.timeout)?;
        if !out.success {
            return Err(ToolError::Unsuccessful {
                tool: name.to_string(),
                code: out.exit_code,
                stderr: out.stderr,
            });
        }
        serde_json::from_str(&out.stdout).map_err(|err| ToolError::Malformed {
            tool: name.to_string(),
            source: err,
        })
    }
}

impl Tools for CommandTools {
    fn check_source(&self, source: &Path) -> ToolResult<ToolOutput> {
        let args = vec![
            "-o".to_string(),
            self.obj_path.display().to_string(),
            source.display().to_string(),
        ];
        run_tool(&self.config.compiler, &args, self.config.timeout)
    }

    fn semantic_map(&self, source: &Path) -> ToolResult<Vec<SmapEntry>> {
        self.parsed("semantic-map generator", &self.config.smap, source)
    }

    fn list_idents(&self, source: &Path) -> ToolResult<Vec<IdentOccurrence>> {
        self.parsed("identifier lister", &self.config.lister, source)
    }

    fn rename(&self, source: &Path, offset: usize, new_name: &str) -> ToolResult<ToolOutput> {
        self.config.rename.invoke(
            &[
                source.display().to_string(),
                offset.to_string(),
                new_name.to_string(),
            ],
            self.config.timeout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod compiler_selection {
        use super::*;

        #[test]
        fn arch_table_matches_toolchain_names() {
            assert_eq!(compiler_for_arch("386"), Some("8g"));
            assert_eq!(compiler_for_arch("amd64"), Some("6g"));
            assert_eq!(compiler_for_arch("arm"), Some("5g"));
        }

        #[test]
        fn arch_table_matches_host_names() {
            assert_eq!(compiler_for_arch("x86"), Some("8g"));
            assert_eq!(compiler_for_arch("i686"), Some("8g"));
            assert_eq!(compiler_for_arch("x86_64"), Some("6g"));
        }

        #[test]
        fn unknown_arch_is_none() {
            assert_eq!(compiler_for_arch("riscv64"), None);
        }

        #[test]
        fn explicit_override_wins() {
            assert_eq!(select_compiler(Some("mycc")), Some("mycc".to_string()));
        }
    }

    mod command_parsing {
        use super::*;

        #[test]
        fn single_word_command() {
            let cmd = ToolCommand::parse("listidents").unwrap();
            assert_eq!(cmd.program, PathBuf::from("listidents"));
            assert!(cmd.base_args.is_empty());
        }

        #[test]
        fn subcommand_form() {
            let cmd = ToolCommand::parse("gocode smap").unwrap();
            assert_eq!(cmd.program, PathBuf::from("gocode"));
            assert_eq!(cmd.base_args, vec!["smap".to_string()]);
        }

        #[test]
        fn empty_command_is_rejected() {
            assert!(ToolCommand::parse("   ").is_none());
        }
    }

    #[cfg(unix)]
    mod invocation {
        use super::*;

        fn sh(script: &str) -> ToolResult<ToolOutput> {
            run_tool(
                Path::new("sh"),
                &["-c".to_string(), script.to_string()],
                Duration::from_secs(10),
            )
        }

        #[test]
        fn captures_stdout_and_exit_status() {
            let out = sh("echo hello").unwrap();
            assert!(out.success);
            assert_eq!(out.exit_code, Some(0));
            assert_eq!(out.stdout.trim(), "hello");
        }

        #[test]
        fn nonzero_exit_is_unsuccessful_not_an_error() {
            let out = sh("echo oops >&2; exit 3").unwrap();
            assert!(!out.success);
            assert_eq!(out.exit_code, Some(3));
            assert_eq!(out.stderr.trim(), "oops");
        }

        #[test]
        fn missing_program_is_a_spawn_error() {
            let err = run_tool(
                Path::new("/nonexistent/tool"),
                &[],
                Duration::from_secs(1),
            )
            .unwrap_err();
            assert!(matches!(err, ToolError::Spawn { .. }));
        }

        #[test]
        fn timeout_kills_and_reports_unsuccessful() {
            let out = run_tool(
                Path::new("sleep"),
                &["10".to_string()],
                Duration::from_millis(200),
            )
            .unwrap();
            assert!(!out.success);
            assert!(out.exit_code.is_none());
            assert!(out.stderr.contains("timed out"));
        }
    }
}
