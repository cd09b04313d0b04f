//! Subprocess execution for external bundlers

use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// Result of a subprocess execution
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,

    /// Process exit code
    pub exit_code: i32,

    /// Execution duration
    pub duration: Duration,
}

impl CommandResult {
    /// Create a CommandResult from an exit status
    pub fn from_status(status: ExitStatus, duration: Duration) -> Self {
        Self {
            success: status.success(),
            exit_code: status.code().unwrap_or(-1),
            duration,
        }
    }
}

/// Run `program` in `cwd` with extra environment variables
///
/// The child shares the terminal, so bundler progress is shown as it happens.
pub fn run_command(program: &str, args: &[String], cwd: &Path, envs: &[(&str, &str)]) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    for (key, value) in envs {
        cmd.env(key, value);
    }

    let status = cmd
        .status()
        .with_context(|| format!("Failed to execute {}", program))?;

    Ok(CommandResult::from_status(status, start.elapsed()))
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_in_cwd_with_env() {
        let dir = tempfile::tempdir().unwrap();

        let result = run_command(
            "sh",
            &["-c".to_string(), "echo \"$BUNDLE_MODE\" > mode.txt".to_string()],
            dir.path(),
            &[("BUNDLE_MODE", "production")],
        )
        .unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, 0);
        let written = std::fs::read_to_string(dir.path().join("mode.txt")).unwrap();
        assert_eq!(written.trim(), "production");
    }

    #[test]
    fn test_run_command_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_command("sh", &["-c".to_string(), "exit 3".to_string()], dir.path(), &[]).unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
    }

    #[test]
    fn test_run_command_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_command("appship-definitely-not-a-real-binary", &[], dir.path(), &[]).unwrap_err();
        assert!(err.to_string().contains("Failed to execute"));
    }

    #[test]
    fn test_command_exists() {
        assert!(command_exists("sh"));
        assert!(!command_exists("appship-definitely-not-a-real-binary"));
    }
}
