//! External command execution.
//!
//! Commands inherit stdin/stdout/stderr and get exactly the environment in
//! their [`Invocation`]. Only the exit status is observed.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use thiserror::Error;

use gke_deploy_core::EnvSnapshot;

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: EnvSnapshot,
    /// `None` runs in the current directory.
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>, env: &EnvSnapshot) -> Self {
        Self {
            program: program.into(),
            args,
            env: env.clone(),
            cwd: None,
        }
    }

    pub fn current_dir(mut self, cwd: Option<PathBuf>) -> Self {
        self.cwd = cwd;
        self
    }

    /// The command line, for logs and error messages. Never includes the
    /// environment.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Failure of a single external command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started at all.
    #[error("could not run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully. `code` is `None` when it was
    /// terminated by a signal.
    #[error("`{command}` exited with {}", describe_code(*code))]
    Failed { command: String, code: Option<i32> },
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Runs [`Invocation`]s. The pipeline only cares whether they succeeded.
pub trait CommandRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<(), CommandError>;
}

/// Runs commands as real child processes, blocking until each exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<(), CommandError> {
        let command = invocation.command_line();
        tracing::debug!(%command, "running");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .env_clear()
            .envs(invocation.env.pairs().filter(|(k, _)| !k.is_empty()))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }

        let status = cmd
            .status()
            .map_err(|source| CommandError::Spawn {
                command: command.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(CommandError::Failed {
                command,
                code: status.code(),
            })
        }
    }
}
