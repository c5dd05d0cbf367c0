use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::PluginError;
use crate::util::interpolate_command;

/// Captured result of one external process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status 0
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout followed by stderr, for the build log
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

/// Runs external commands on behalf of plugins.
///
/// A non-zero exit is not an error: it comes back as
/// `CommandOutput { success: false, .. }` and the caller decides.
pub trait CommandRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput, PluginError>;

    /// Run `template` with its `%s` placeholder replaced by `args`
    async fn run_with_args(&self, template: &str, args: &str) -> Result<CommandOutput, PluginError> {
        self.run(&interpolate_command(template, args)).await
    }
}

/// Runs commands through the platform shell inside the build directory
#[derive(Debug, Clone)]
pub struct ShellRunner {
    cwd: PathBuf,
}

impl ShellRunner {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }
}

impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput, PluginError> {
        debug!("Executing: {}", command);

        #[cfg(windows)]
        let output = Command::new("cmd")
            .arg("/C")
            .arg(command)
            .current_dir(&self.cwd)
            .output()
            .await;
        #[cfg(not(windows))]
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.cwd)
            .output()
            .await;

        let output = output.map_err(|source| PluginError::Spawn {
            command: command.to_string(),
            source,
        })?;

        let result = CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        trace!(
            "Command finished with {} ({} bytes stdout, {} bytes stderr)",
            output.status,
            result.stdout.len(),
            result.stderr.len()
        );
        Ok(result)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_output() {
        let out = CommandOutput {
            success: true,
            stdout: "out\n".into(),
            stderr: "err".into(),
        };
        assert_eq!(out.combined(), "out\nerr");

        let only_err = CommandOutput {
            stderr: "err".into(),
            ..Default::default()
        };
        assert_eq!(only_err.combined(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runner_captures_stdout_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ShellRunner::new(dir.path());

        let ok = runner.run_with_args("echo %s", "hello").await.unwrap();
        assert!(ok.success);
        assert_eq!(ok.stdout.trim(), "hello");

        let failed = runner.run("echo oops >&2; exit 3").await.unwrap();
        assert!(!failed.success);
        assert_eq!(failed.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runner_uses_build_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let runner = ShellRunner::new(dir.path());

        let out = runner.run("ls").await.unwrap();
        assert!(out.stdout.contains("marker.txt"));
    }
}
