use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use crate::pipeline::supervise_use_case::ChildRunner;

/// Runs the tracker as a child process and waits for it.
///
/// The child inherits stdin, stdout and stderr so the user can still type
/// `q` to stop it.
pub struct ProcessChildRunner {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessChildRunner {
    pub fn new(program: PathBuf, args: Vec<OsString>) -> Self {
        Self { program, args }
    }

    /// Re-runs the current executable with `args`.
    pub fn current_exe(args: Vec<OsString>) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(std::env::current_exe()?, args))
    }
}

impl ChildRunner for ProcessChildRunner {
    fn run(&mut self) -> Result<Option<i32>, Box<dyn std::error::Error>> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|e| format!("failed to start {}: {e}", self.program.display()))?;
        log::debug!("{} exited with {status}", self.program.display());
        Ok(status.code())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ProcessChildRunner {
        ProcessChildRunner::new(
            PathBuf::from("/bin/sh"),
            vec!["-c".into(), script.into()],
        )
    }

    #[test]
    fn test_reports_exit_code() {
        assert_eq!(sh("exit 10").run().unwrap(), Some(10));
        assert_eq!(sh("exit 0").run().unwrap(), Some(0));
    }

    #[test]
    fn test_signal_has_no_code() {
        assert_eq!(sh("kill -9 $$").run().unwrap(), None);
    }

    #[test]
    fn test_missing_program_is_error() {
        let mut runner = ProcessChildRunner::new(PathBuf::from("/nonexistent/autoenroll"), vec![]);
        assert!(runner.run().is_err());
    }
}
