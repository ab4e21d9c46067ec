//! Error types for sizetrack.
//!
//! All fallible operations in the crate return [`Result`], built on
//! [`SizeError`] — `thiserror` for the definitions, `miette` for the
//! diagnostic output the CLI prints.
//!
//! # Error Handling Strategy
//!
//! - External commands invoked through the non-silent runner fail with
//!   [`SizeError::CommandFailed`]; commands whose failure is merely a
//!   signal go through the silent runner and never produce an error.
//! - Missing persisted ledger files are *not* errors — loading returns an
//!   empty collection instead.
//! - A build failure while recording a historic revision is reported as a
//!   diagnostic and recorded as an empty artifact map, never raised.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error types that can occur in sizetrack operations.
#[derive(Error, Debug, Diagnostic)]
pub enum SizeError {
    /// An external command exited with a non-zero status.
    ///
    /// Raised by the non-silent command runner for git invocations
    /// (rev-list, log, remote) and, fatally, for checkout during the
    /// history walk. `code` is `None` when the process was killed by a
    /// signal or could not be spawned.
    #[error("command '{command}' failed{}", describe_exit(.code))]
    #[diagnostic(
        code(sizetrack::command::failed),
        help("Ensure the command is installed and runnable from the working directory.")
    )]
    CommandFailed {
        /// The full command line that failed
        command: String,
        /// The exit code, if the process ran to completion
        code: Option<i32>,
    },

    /// `git branch` produced no current-branch marker.
    ///
    /// Happens on a detached HEAD or outside a repository. The tool
    /// cannot walk history without knowing which branch to restore.
    #[error("could not determine the current git branch")]
    #[diagnostic(
        code(sizetrack::git::branch_not_found),
        help("Run sizetrack from a checked-out branch, or pass --branch explicitly.")
    )]
    BranchNotFound,

    /// The named remote does not appear in `git remote -v`.
    #[error("cannot find git remote '{0}'")]
    #[diagnostic(
        code(sizetrack::git::remote_not_found),
        help("Check `git remote -v` and pass --remote if the remote has a different name.")
    )]
    RemoteNotFound(
        /// The remote name that was looked up
        String,
    ),

    /// The remote URL is neither an SSH-style `user@host:path` nor an
    /// http(s) URL, so no browsing URL can be derived for the report.
    #[error("cannot parse remote URL '{0}'")]
    #[diagnostic(code(sizetrack::git::remote_url_unsupported))]
    RemoteUrlUnsupported(
        /// The URL that could not be rewritten
        String,
    ),

    /// The compiler probe found no `gcc version` line in the output.
    ///
    /// The version string is the build-label every measurement is keyed
    /// under, so the tool is unusable without it.
    #[error("could not determine the version of '{0}'")]
    #[diagnostic(
        code(sizetrack::toolchain::version_not_found),
        help("Pass --compiler to point at a gcc-flavored toolchain driver.")
    )]
    CompilerVersionNotFound(
        /// The compiler command that was probed
        String,
    ),

    /// File system I/O error during sizetrack operations.
    ///
    /// Common causes: permission denied, disk full, or an unreadable
    /// template file.
    #[error("I/O error accessing '{path}'")]
    #[diagnostic(code(sizetrack::io_error))]
    IoError {
        /// The path that caused the I/O error
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A persisted ledger file exists but does not contain valid JSON of
    /// the expected shape.
    ///
    /// Missing files are fine (empty ledger); corrupt files are not,
    /// since silently discarding one would drop recorded history.
    #[error("failed to parse JSON in '{path}'")]
    #[diagnostic(
        code(sizetrack::persist::json_error),
        help("The ledger file may be corrupted. Move it aside to start a fresh ledger.")
    )]
    JsonError {
        /// The ledger file that failed to parse
        path: PathBuf,
        /// The underlying serde_json error
        #[source]
        source: serde_json::Error,
    },

    /// The report template file is missing or unusable.
    #[error("template error: {0}")]
    #[diagnostic(code(sizetrack::report::template_error))]
    TemplateError(
        /// Description of the template problem
        String,
    ),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => String::from(" to run"),
    }
}

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, SizeError>;
