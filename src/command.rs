//! External command runner.
//!
//! Two flavors of invocation, matching the two ways the tool treats a
//! non-zero exit:
//!
//! - [`run`] captures output and fails on a non-zero exit — used for git
//!   queries whose output the caller needs.
//! - [`silent`] discards output and only reports the exit code — used for
//!   build invocations where failure is a *signal* (a broken historic
//!   commit), not an error.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Result, SizeError};

/// Captured output of a completed command.
///
/// Lines are stored in order with trailing whitespace stripped.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

fn command_line<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut line = String::from(program);
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect()
}

/// Run a command in `dir` and capture its output.
///
/// # Errors
///
/// Returns [`SizeError::CommandFailed`] if the process cannot be spawned
/// or exits with a non-zero status.
pub fn run<S: AsRef<OsStr>>(dir: &Path, program: &str, args: &[S]) -> Result<Capture> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .map_err(|_| SizeError::CommandFailed {
            command: command_line(program, args),
            code: None,
        })?;

    if !output.status.success() {
        return Err(SizeError::CommandFailed {
            command: command_line(program, args),
            code: output.status.code(),
        });
    }

    Ok(Capture {
        stdout: split_lines(&output.stdout),
        stderr: split_lines(&output.stderr),
    })
}

/// Run a command in `dir` with all output discarded, returning its exit
/// code.
///
/// Never fails: a process that cannot be spawned or is killed by a signal
/// reports `-1`.
pub fn silent<S: AsRef<OsStr>>(dir: &Path, program: &str, args: &[S]) -> i32 {
    let status = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) => status.code().unwrap_or(-1),
        Err(_) => -1,
    }
}

/// Run an argv-style command (program followed by its arguments) through
/// [`silent`].
///
/// An empty argv reports `-1` rather than panicking; the caller treats it
/// like any other failed invocation.
pub fn silent_argv(dir: &Path, argv: &[String]) -> i32 {
    match argv.split_first() {
        Some((program, args)) => silent(dir, program, args),
        None => -1,
    }
}
