//! External command execution
//!
//! Scanners never spawn processes directly. They go through a
//! [`CommandRunner`] so that tests can feed canned tool output.

use flipperpi_core::error::{Error, Result};
use std::process::{Command, Stdio};

/// Runs an external program and returns its standard output
pub trait CommandRunner: Send {
    /// Run `program` with `args` and return stdout as text
    ///
    /// A non-zero exit status is reported as [`Error::CommandFailed`].
    fn run(&mut self, program: &str, args: &[&str]) -> Result<String>;
}

/// Runs commands on the host with `std::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> Result<String> {
        log::debug!("Running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| Error::CommandSpawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::CommandFailed {
                program: program.to_string(),
                status: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
