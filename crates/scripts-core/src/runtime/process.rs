//! Synchronous-from-the-caller execution of external tools
//!
//! Tools are resolved from the project's `node_modules/.bin` first and fall back
//! to the bare command name on `PATH`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command as TokioCommand;

/// Errors raised while running an external tool
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with code {code}")]
    ExitStatus { command: String, code: String },
}

/// How the child's standard streams are wired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdioMode {
    #[default]
    Inherit,
    Piped,
}

/// A single external tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Full environment for the child; `None` inherits the parent's
    pub env: Option<HashMap<String, String>>,
    pub stdio: StdioMode,
    /// Turn a nonzero exit into an error
    pub reject_on_error: bool,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I, cwd: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.into(),
            env: None,
            stdio: StdioMode::Inherit,
            reject_on_error: true,
        }
    }

    pub fn env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    pub fn stdio(mut self, stdio: StdioMode) -> Self {
        self.stdio = stdio;
        self
    }

    pub fn allow_failure(mut self) -> Self {
        self.reject_on_error = false;
        self
    }

    /// `program arg1 arg2`, as shown in error messages
    pub fn display(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
            .trim()
            .to_string()
    }
}

/// Outcome of a finished invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Exit code; `None` when the child was killed by a signal
    pub status: Option<i32>,
    pub stdout: Vec<u8>,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Executes external tools on behalf of commands
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: Invocation) -> Result<RunResult, ProcessError>;
}

/// Runner that spawns real processes and waits for them to exit
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, invocation: Invocation) -> Result<RunResult, ProcessError> {
        let bin = resolve_bin(&invocation.program, &invocation.cwd);
        tracing::debug!(bin = %bin.display(), args = ?invocation.args, "spawning");

        let mut command = TokioCommand::new(&bin);
        command.args(&invocation.args).current_dir(&invocation.cwd);

        if let Some(env) = &invocation.env {
            command.env_clear().envs(env);
        }

        let (status, stdout) = match invocation.stdio {
            StdioMode::Inherit => {
                let status = command.status().await.map_err(|source| ProcessError::Spawn {
                    command: invocation.program.clone(),
                    source,
                })?;
                (status, Vec::new())
            }
            StdioMode::Piped => {
                let output = command
                    .stdin(Stdio::null())
                    .stderr(Stdio::inherit())
                    .output()
                    .await
                    .map_err(|source| ProcessError::Spawn {
                        command: invocation.program.clone(),
                        source,
                    })?;
                (output.status, output.stdout)
            }
        };

        let result = RunResult {
            status: status.code(),
            stdout,
        };

        if invocation.reject_on_error && !result.success() {
            return Err(ProcessError::ExitStatus {
                command: invocation.display(),
                code: result
                    .status
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "null".to_string()),
            });
        }

        Ok(result)
    }
}

fn bin_extensions() -> &'static [&'static str] {
    if cfg!(windows) {
        &[".cmd", ".exe", ""]
    } else {
        &["", ".js"]
    }
}

/// Resolve a tool binary from `<cwd>/node_modules/.bin`, else leave it to `PATH`
pub fn resolve_bin(command: &str, cwd: &Path) -> PathBuf {
    let bin_dir = cwd.join("node_modules").join(".bin");

    for ext in bin_extensions() {
        let candidate = bin_dir.join(format!("{}{}", command, ext));
        if candidate.exists() {
            return candidate;
        }
    }

    PathBuf::from(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_bin_prefers_local_tool_directory() {
        let temp = tempfile::tempdir().unwrap();
        let bin_dir = temp.path().join("node_modules").join(".bin");
        std::fs::create_dir_all(&bin_dir).unwrap();
        let local = bin_dir.join(format!("tsc{}", bin_extensions()[0]));
        std::fs::write(&local, "").unwrap();

        assert_eq!(resolve_bin("tsc", temp.path()), local);
    }

    #[test]
    fn test_resolve_bin_falls_back_to_bare_name() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(resolve_bin("rollup", temp.path()), PathBuf::from("rollup"));
    }

    #[test]
    fn test_invocation_display_trims_empty_args() {
        let invocation = Invocation::new("jest", Vec::<String>::new(), ".");
        assert_eq!(invocation.display(), "jest");

        let invocation = Invocation::new("eslint", [".", "--fix"], ".");
        assert_eq!(invocation.display(), "eslint . --fix");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_rejects_nonzero_exit() {
        let temp = tempfile::tempdir().unwrap();
        let err = SystemRunner
            .run(Invocation::new("sh", ["-c", "exit 3"], temp.path()))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "sh -c exit 3 exited with code 3");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_allows_failure_when_asked() {
        let temp = tempfile::tempdir().unwrap();
        let result = SystemRunner
            .run(Invocation::new("sh", ["-c", "exit 2"], temp.path()).allow_failure())
            .await
            .unwrap();

        assert_eq!(result.status, Some(2));
        assert!(!result.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_captures_piped_stdout() {
        let temp = tempfile::tempdir().unwrap();
        let result = SystemRunner
            .run(
                Invocation::new("sh", ["-c", "printf hello"], temp.path())
                    .stdio(StdioMode::Piped),
            )
            .await
            .unwrap();

        assert_eq!(result.stdout, b"hello");
    }
}
