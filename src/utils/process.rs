//! Subprocess execution with timeouts and consistent logging.
//!
//! Both the GitHub CLI (`gh`) and `git` are driven through [`HostCommand`], a
//! small fluent builder. Callers get the raw stdout bytes on success and a
//! [`CommandFailure`] they can classify (auth, not found, ...) on failure.

use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::DEFAULT_COMMAND_TIMEOUT;

/// Output of a successful command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Raw standard output
    pub stdout: Vec<u8>,
    /// Standard error decoded lossily
    pub stderr: String,
}

impl CommandOutput {
    /// Standard output decoded lossily.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }
}

/// Why a command did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFailure {
    /// The program could not be started (usually not installed).
    Spawn {
        /// Program name
        program: String,
        /// OS error text
        reason: String,
    },
    /// The program did not finish within the timeout.
    TimedOut {
        /// Program name
        program: String,
        /// Timeout that elapsed
        seconds: u64,
    },
    /// The program exited unsuccessfully.
    Exit {
        /// Exit code if the process was not killed by a signal
        code: Option<i32>,
        /// Standard error (or stdout when stderr was empty)
        stderr: String,
    },
}

impl std::fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn {
                program,
                reason,
            } => write!(f, "could not run {program}: {reason}"),
            Self::TimedOut {
                program,
                seconds,
            } => write!(f, "{program} timed out after {seconds}s"),
            Self::Exit {
                code,
                stderr,
            } => match code {
                Some(code) => write!(f, "exit code {code}: {}", stderr.trim()),
                None => write!(f, "terminated by signal: {}", stderr.trim()),
            },
        }
    }
}

/// Fluent builder for a host subprocess.
///
/// # Examples
///
/// ```rust,ignore
/// use awf_cli::utils::process::HostCommand;
///
/// # async fn example() -> Result<(), awf_cli::utils::process::CommandFailure> {
/// let output = HostCommand::new("git")
///     .args(["ls-remote", "--tags", "https://github.com/actions/checkout.git"])
///     .with_context("listing tags")
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HostCommand {
    program: String,
    args: Vec<String>,
    env_vars: Vec<(String, String)>,
    timeout_duration: Duration,
    context: Option<String>,
}

impl HostCommand {
    /// Create a builder for `program` with the default timeout.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env_vars: Vec::new(),
            timeout_duration: DEFAULT_COMMAND_TIMEOUT,
            context: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Override the timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Attach a short description used in log lines.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// The arguments collected so far.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Run the command, capturing output.
    pub async fn execute(self) -> Result<CommandOutput, CommandFailure> {
        let start = Instant::now();
        let rendered = format!("{} {}", self.program, self.args.join(" "));
        match &self.context {
            Some(ctx) => tracing::debug!(target: "process", "({ctx}) Executing: {rendered}"),
            None => tracing::debug!(target: "process", "Executing: {rendered}"),
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }
        cmd.kill_on_drop(true);

        let output = match timeout(self.timeout_duration, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CommandFailure::Spawn {
                    program: self.program,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                tracing::warn!(
                    target: "process",
                    "Command timed out after {} seconds: {rendered}",
                    self.timeout_duration.as_secs()
                );
                return Err(CommandFailure::TimedOut {
                    program: self.program,
                    seconds: self.timeout_duration.as_secs(),
                });
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            tracing::debug!(
                target: "process",
                "Command failed with exit code {:?}: {}",
                output.status.code(),
                stderr.trim()
            );
            let stderr = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).to_string()
            } else {
                stderr
            };
            return Err(CommandFailure::Exit {
                code: output.status.code(),
                stderr,
            });
        }

        let elapsed = start.elapsed();
        if elapsed.as_millis() > 1000 {
            let seconds = elapsed.as_secs_f64();
            tracing::info!(target: "process::perf", "{rendered} took {seconds:.2}s");
        }

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr,
        })
    }
}
