//! Helpers for driving the `mural` binary
//!
//! Every command runs against a config file inside a temp directory, so
//! tests never touch the user's real config or data dirs.

#![allow(dead_code)]

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Temp directory holding a config file and a board store
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    /// Config pointing storage at `<tmp>/store`
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let workspace = Self { dir };
        fs::write(
            workspace.config_path(),
            format!(
                "[board]\nwidth = 4\nheight = 2\n\n[storage]\npath = {:?}\n",
                workspace.store_path()
            ),
        )?;
        Ok(workspace)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    /// `mural --config <tmp>/config.toml <args..>`
    pub fn mural(&self, args: &[&str]) -> MuralCommand {
        let mut command = MuralCommand::new(self.dir.path());
        command.args(&["--config", &self.config_path().to_string_lossy()]);
        command.args(args);
        command
    }
}

/// CLI command builder
pub struct MuralCommand {
    working_dir: PathBuf,
    args: Vec<String>,
}

impl MuralCommand {
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn execute(&self) -> Result<CommandResult> {
        let output = Command::new(env!("CARGO_BIN_EXE_mural"))
            .args(&self.args)
            .current_dir(&self.working_dir)
            .env_remove("RUST_LOG")
            .output()
            .context("Failed to execute command")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }
}
