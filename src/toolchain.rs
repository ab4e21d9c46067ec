//! Compiler version probe.
//!
//! The probed version string is the build-label every measurement is
//! keyed under, so two toolchains never mix their size histories.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::command::run;
use crate::error::{Result, SizeError};

fn gcc_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"gcc version ([0-9.]+)").unwrap())
}

pub(crate) fn find_gcc_version(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .find_map(|line| gcc_version_re().captures(line))
        .map(|captures| captures[1].to_string())
}

/// Probe a gcc-flavored compiler for its version string.
///
/// Runs `<compiler> -v` and scans for a `gcc version X.Y.Z` line — gcc
/// prints its banner on stderr, so that side is searched first.
///
/// # Errors
///
/// [`SizeError::CommandFailed`] if the compiler cannot be run, or
/// [`SizeError::CompilerVersionNotFound`] if no version line appears.
pub fn compiler_version(dir: &Path, compiler: &str) -> Result<String> {
    let capture = run(dir, compiler, &["-v"])?;
    find_gcc_version(&capture.stderr)
        .or_else(|| find_gcc_version(&capture.stdout))
        .ok_or_else(|| SizeError::CompilerVersionNotFound(compiler.to_string()))
}
