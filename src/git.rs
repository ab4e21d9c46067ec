//! Git collaborator surface.
//!
//! Everything sizetrack needs from version control goes through the git
//! command line: current-branch query, revision listing, checkout, the
//! pretty-format log the commit metadata is parsed from, and the remote
//! lookup feeding the report's browsing URL.
//!
//! Metadata parsing is best-effort by design: unknown header keys are
//! ignored and missing keys leave the field absent. Only `hash` (ledger
//! identity) and `date` (chronological ordering) carry semantic weight.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::command::run;
use crate::error::{Result, SizeError};

/// The log header format. The key names here determine what ends up in
/// [`CommitInfo`]; the full body (`%B`) follows so multi-line messages
/// don't get mistaken for headers of the next record.
const LOG_PRETTY: &str =
    "hash: %H%nshort: %h%nauthor: %an%nemail: %ae%ndate: %ai%ncomment: %s%n%B";

/// Identity snapshot of one revision, as recorded under the `"git"` key
/// of a historic size snapshot.
///
/// Immutable once read. All fields except `hash` are display data and may
/// be absent when the log omits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Full commit hash; the unique ledger key.
    pub hash: String,

    /// Abbreviated hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    /// Author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Author email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Author date, ISO-8601 with offset (`%ai`); the chronological
    /// ordering key for the historic ledger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Subject line of the commit message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl CommitInfo {
    fn from_fields(hash: String) -> Self {
        Self {
            hash,
            short: None,
            author: None,
            email: None,
            date: None,
            comment: None,
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        let value = value.to_string();
        match key {
            "short" => self.short = Some(value),
            "author" => self.author = Some(value),
            "email" => self.email = Some(value),
            "date" => self.date = Some(value),
            "comment" => self.comment = Some(value),
            // "hash" started the record; anything else is ignored.
            _ => {}
        }
    }
}

fn key_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z_]+): (.*)$").unwrap())
}

/// Parse a pretty-format log stream into commit records, oldest first.
///
/// A `hash:` header always starts a new record; `key: value` lines fill
/// the known fields; anything else (body lines, unknown keys) is skipped.
pub(crate) fn parse_log(lines: &[String]) -> Vec<CommitInfo> {
    let mut log: Vec<CommitInfo> = Vec::new();
    let mut current: Option<CommitInfo> = None;

    for line in lines {
        let Some(captures) = key_value_re().captures(line) else {
            continue;
        };
        let (key, value) = (&captures[1], &captures[2]);

        if key == "hash" {
            if let Some(info) = current.take() {
                log.push(info);
            }
            current = Some(CommitInfo::from_fields(value.to_string()));
        } else if let Some(info) = current.as_mut() {
            info.set(key, value);
        }
    }
    if let Some(info) = current {
        log.push(info);
    }

    // git emits newest first
    log.reverse();
    log
}

/// Read commit metadata from `git log`, oldest first.
///
/// # Errors
///
/// Fails with [`SizeError::CommandFailed`] if git cannot be run; parsing
/// itself is best-effort and does not fail.
pub fn commit_log(dir: &Path, limit: Option<usize>) -> Result<Vec<CommitInfo>> {
    let pretty = format!("--pretty={LOG_PRETTY}");
    let mut args = vec!["log".to_string(), pretty];
    if let Some(limit) = limit {
        args.push("-n".to_string());
        args.push(limit.to_string());
    }

    let capture = run(dir, "git", &args)?;
    Ok(parse_log(&capture.stdout))
}

pub(crate) fn parse_branch(lines: &[String]) -> Result<String> {
    for line in lines {
        if let Some(name) = line.strip_prefix("* ") {
            // "* (HEAD detached at ...)" is not a branch
            if !name.starts_with('(') {
                return Ok(name.to_string());
            }
        }
    }
    Err(SizeError::BranchNotFound)
}

/// The currently checked-out branch.
///
/// # Errors
///
/// [`SizeError::BranchNotFound`] when no branch marker is present
/// (detached HEAD), or [`SizeError::CommandFailed`] if git fails.
pub fn current_branch(dir: &Path) -> Result<String> {
    let capture = run(dir, "git", &["branch"])?;
    parse_branch(&capture.stdout)
}

/// All revisions reachable from `branch`, newest first as git emits them.
///
/// The history walk reverses this to process oldest-first, building the
/// size history chronologically.
pub fn rev_list(dir: &Path, branch: &str) -> Result<Vec<String>> {
    let capture = run(dir, "git", &["rev-list", branch, "--"])?;
    Ok(capture
        .stdout
        .iter()
        .filter(|line| !line.is_empty())
        .cloned()
        .collect())
}

/// Quietly check out a revision or branch.
///
/// # Errors
///
/// A failed checkout is always fatal for the caller — the tree is in an
/// indeterminate state otherwise.
pub fn checkout(dir: &Path, rev: &str) -> Result<()> {
    run(dir, "git", &["checkout", "-q", rev])?;
    Ok(())
}

pub(crate) fn find_remote_url(lines: &[String], remote: &str) -> Result<String> {
    let pattern = format!(r"{}\s+([\w@.:/_-]+)\s+\(fetch\)", regex::escape(remote));
    let re = Regex::new(&pattern).map_err(|_| SizeError::RemoteNotFound(remote.to_string()))?;
    for line in lines {
        if let Some(captures) = re.captures(line) {
            return Ok(captures[1].to_string());
        }
    }
    Err(SizeError::RemoteNotFound(remote.to_string()))
}

/// The fetch URL of the named remote.
pub fn remote_url(dir: &Path, remote: &str) -> Result<String> {
    let capture = run(dir, "git", &["remote", "-v"])?;
    find_remote_url(&capture.stdout, remote)
}

fn ssh_remote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+@([\w._-]+):(\S+)").unwrap())
}

fn http_remote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://([^/\s]+)(/\S*)?$").unwrap())
}

/// Rewrite a remote URL into an https browsing URL for the report.
///
/// SSH-style `user@host:path` remotes become `https://host/path`; http
/// URLs are forced to https; anything else is unsupported.
///
/// # Errors
///
/// [`SizeError::RemoteUrlUnsupported`] for URL schemes the report cannot
/// link to.
pub fn browse_url(url: &str) -> Result<String> {
    if let Some(captures) = ssh_remote_re().captures(url) {
        return Ok(format!("https://{}/{}", &captures[1], &captures[2]));
    }

    if let Some(captures) = http_remote_re().captures(url) {
        let path = captures.get(2).map_or("", |m| m.as_str());
        return Ok(format!("https://{}{}", &captures[1], path));
    }

    Err(SizeError::RemoteUrlUnsupported(url.to_string()))
}
