//! Subordinate build commands.
//!
//! Bundled libraries that ship their own build system (the clustering
//! library's `make install`) are run through [`run_command`]. Each child is
//! spawned in its own process group and receives SIGTERM if this process
//! dies, so an interrupted install does not leave a detached `make` running.

use nix::libc;
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::error::{Result, SetupError};

/// Extension trait for std::process::Command to set up process groups
pub trait CommandProcessGroup {
    /// Configure the command to run in its own process group
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // SAFETY: the closure only calls async-signal-safe functions
        // (setpgid, prctl) between fork and exec.
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(std::io::Error::from)?;

                if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) == -1 {
                    return Err(std::io::Error::last_os_error());
                }

                Ok(())
            });
        }
        self
    }
}

/// A command to run in a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl BuildCommand {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `make install` in `dir`.
    pub fn make_install(dir: &Path) -> Self {
        Self::new("make", dir).arg("install")
    }
}

/// Output from a subordinate command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl CommandOutput {
    /// Turn a non-zero exit into an error naming `context`.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            let code = self.exit_code.unwrap_or(-1);
            Err(SetupError::subprocess(format!(
                "{} failed (exit code {}): {}",
                context,
                code,
                self.stderr.trim()
            )))
        }
    }
}

/// Run `command` to completion, capturing its output.
///
/// Spawn failures are errors; a non-zero exit is reported through
/// [`CommandOutput::success`].
pub fn run_command(command: &BuildCommand) -> Result<CommandOutput> {
    info!(
        "running {} {:?} in {}",
        command.program,
        command.args,
        command.cwd.display()
    );

    let output = Command::new(&command.program)
        .args(&command.args)
        .current_dir(&command.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .in_new_process_group()
        .output()
        .map_err(|e| SetupError::subprocess(format!("failed to spawn {}: {}", command.program, e)))?;

    let result = CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code(),
        success: output.status.success(),
    };
    debug!("{} exited with {:?}", command.program, result.exit_code);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_install_command() {
        let cmd = BuildCommand::make_install(Path::new("/src/Algorithm-Cluster-1.49"));
        assert_eq!(cmd.program, "make");
        assert_eq!(cmd.args, vec!["install".to_string()]);
        assert_eq!(cmd.cwd, PathBuf::from("/src/Algorithm-Cluster-1.49"));
    }

    #[test]
    fn test_run_successful_command() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cmd = BuildCommand::new("sh", dir.path()).arg("-c").arg("echo built; pwd");
        let output = run_command(&cmd).expect("Should run");
        assert!(output.success);
        assert!(output.stdout.contains("built"));
        assert!(output.ensure_success("sh").is_ok());
    }

    #[test]
    fn test_failing_command_reports_exit_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cmd = BuildCommand::new("sh", dir.path())
            .arg("-c")
            .arg("echo broken >&2; exit 3");
        let output = run_command(&cmd).expect("Should run");
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        let err = output.ensure_success("make install").unwrap_err();
        assert!(err.to_string().contains("exit code 3"));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_missing_program_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cmd = BuildCommand::new("definitely-not-a-real-program-xyz", dir.path());
        assert!(matches!(run_command(&cmd), Err(SetupError::Subprocess(_))));
    }
}
