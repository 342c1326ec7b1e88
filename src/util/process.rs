//! External commands: compiler and linker steps, the built program and the
//! test command.
//!
//! Children inherit stdout/stderr so compiler diagnostics and program output
//! reach the terminal as they are produced. Every command is timed so the
//! caller can grade it.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// An external command to run to completion.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

/// Exit status of a finished command and how long it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedStatus {
    pub status: ExitStatus,
    pub elapsed: Duration,
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Run the command from `cwd` instead of the current directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Run to completion. `Err` only if the command could not be started.
    pub fn status(&self) -> Result<ExitStatus> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.status()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))
    }

    /// [`status`](Self::status), measuring the wall-clock run time.
    pub fn timed(&self) -> Result<TimedStatus> {
        tracing::debug!("running `{}`", self.display_command());
        let start = Instant::now();
        let status = self.status()?;
        Ok(TimedStatus {
            status,
            elapsed: start.elapsed(),
        })
    }

    /// The command line, for status and error messages.
    pub fn display_command(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// A command line run through the platform shell (`sh -c` or `cmd /C`).
pub fn shell_command(command: &str) -> ProcessBuilder {
    if cfg!(windows) {
        ProcessBuilder::new("cmd").arg("/C").arg(command)
    } else {
        ProcessBuilder::new("sh").arg("-c").arg(command)
    }
}

/// Find a C++ compiler driver.
///
/// `$CXX` wins if it resolves, otherwise the usual driver names are tried.
pub fn find_cxx_compiler() -> Option<PathBuf> {
    let from_env = std::env::var("CXX")
        .ok()
        .and_then(|cxx| which::which(cxx).ok());

    from_env.or_else(|| {
        ["g++", "clang++", "c++"]
            .iter()
            .find_map(|name| which::which(name).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("g++").args(["-c", "-o", "out/a.o", "src/a.cpp"]);

        assert_eq!(pb.display_command(), "g++ -c -o out/a.o src/a.cpp");
    }

    #[cfg(unix)]
    #[test]
    fn test_status_reports_exit_code() {
        let ok = shell_command("exit 0").status().unwrap();
        assert!(ok.success());

        let failed = shell_command("exit 3").timed().unwrap();
        assert_eq!(failed.status.code(), Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_timed_measures_run_time() {
        let run = shell_command("sleep 0.2").timed().unwrap();
        assert!(run.status.success());
        assert!(run.elapsed >= Duration::from_millis(150));
    }

    #[cfg(unix)]
    #[test]
    fn test_cwd_is_applied() {
        let tmp = tempfile::TempDir::new().unwrap();
        let status = shell_command("test -f marker || touch marker")
            .cwd(tmp.path())
            .status()
            .unwrap();
        assert!(status.success());
        assert!(tmp.path().join("marker").exists());
    }

    #[test]
    fn test_missing_program_is_error() {
        let result = ProcessBuilder::new("definitely-not-a-real-program-xyz").status();
        assert!(result.is_err());
    }
}
