use std::process::Command;

use energy_harness::{ExecuteError, Payload, PrepareError};
use tracing::debug;

use crate::{Error, Result};

/// Runs an external program through the platform shell.
///
/// This measures the energy of a whole process: start-up, work and exit. The result is the
/// exit code. A non-zero exit code, termination by a signal or failure to start the shell
/// all fail the iteration.
#[derive(Debug)]
pub struct ShellCommand {
    command: String,
}

impl ShellCommand {
    /// Name of the kernel.
    pub const NAME: &str = "command";

    /// Creates the kernel for a shell command line.
    ///
    /// # Errors
    ///
    /// Fails if the command line is empty or only whitespace.
    pub fn new(command: impl Into<String>) -> Result<Self> {
        let command = command.into();

        if command.trim().is_empty() {
            return Err(Error::invalid_size(Self::NAME, "command", "must not be empty"));
        }

        Ok(Self { command })
    }

    /// The command line that is run.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    fn shell(&self) -> Command {
        if cfg!(windows) {
            let mut shell = Command::new("cmd");
            shell.arg("/C").arg(&self.command);
            shell
        } else {
            let mut shell = Command::new("sh");
            shell.arg("-c").arg(&self.command);
            shell
        }
    }
}

impl Payload for ShellCommand {
    type State = ();
    type Output = i32;

    fn prepare(&mut self) -> std::result::Result<(), PrepareError> {
        Ok(())
    }

    fn execute(&mut self, _: &mut ()) -> std::result::Result<i32, ExecuteError> {
        let status = self.shell().status().map_err(|e| {
            ExecuteError::with_source(format!("cannot start '{}'", self.command), e)
        })?;

        debug!(command = %self.command, %status, "command finished");

        match status.code() {
            Some(0) => Ok(0),
            Some(code) => Err(ExecuteError::new(format!(
                "'{}' exited with code {code}",
                self.command
            ))),
            None => Err(ExecuteError::new(format!(
                "'{}' was terminated by a signal",
                self.command
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        assert!(ShellCommand::new("").is_err());
        assert!(ShellCommand::new("   ").is_err());
    }

    #[test]
    fn successful_command() {
        let mut kernel = ShellCommand::new("exit 0").unwrap();

        assert_eq!(kernel.execute(&mut ()).unwrap(), 0);
    }

    #[test]
    fn failing_command() {
        let mut kernel = ShellCommand::new("exit 3").unwrap();

        let error = kernel.execute(&mut ()).unwrap_err();

        assert!(error.message().contains("exited with code 3"), "{error}");
    }
}
