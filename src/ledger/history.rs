//! History update: the checkout → clean → build → scan → record walk.
//!
//! This is the one operation that mutates the working tree. Its
//! reliability contract: whatever happens mid-walk (checkout failure,
//! I/O error, panic), the tree is restored to the original branch. The
//! restore is a scoped guard created before the first checkout, not
//! cleanup calls at call sites.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::command::{silent, silent_argv};
use crate::error::Result;
use crate::git::{self, CommitInfo};
use crate::ledger::{ArtifactSizes, HistoricLedger, SizeSnapshot};
use crate::logging::Logger;
use crate::persist;
use crate::scan::Scanner;

/// Inputs to a history update.
#[derive(Debug, Clone)]
pub struct HistoryOptions {
    /// Build-label the measurements are recorded under (typically the
    /// compiler version string).
    pub label: String,

    /// Branch whose revision list is walked; the current branch when
    /// `None`.
    pub branch: Option<String>,

    /// From-scratch build command, argv style. Run through the silent
    /// runner: failure marks the commit as broken, it does not abort.
    pub build: Vec<String>,

    /// Best-effort clean command for the final restore step.
    pub restore: Vec<String>,
}

impl HistoryOptions {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            branch: None,
            build: vec!["make".into(), "clean".into(), "all".into()],
            restore: vec!["make".into(), "clean".into()],
        }
    }

    pub fn branch(mut self, branch: Option<impl Into<String>>) -> Self {
        self.branch = branch.map(Into::into);
        self
    }

    pub fn build(mut self, argv: Vec<String>) -> Self {
        self.build = argv;
        self
    }

    pub fn restore(mut self, argv: Vec<String>) -> Self {
        self.restore = argv;
        self
    }
}

/// Restores the working tree when dropped: check out the original
/// branch, drop the dependency cache, run the best-effort clean. All
/// steps go through the silent runner — this runs during unwinding and
/// must never raise.
struct TreeRestore<'a> {
    scanner: &'a Scanner,
    branch: &'a str,
    restore: &'a [String],
}

impl Drop for TreeRestore<'_> {
    fn drop(&mut self) {
        let dir = self.scanner.dir();
        silent(dir, "git", &["checkout", "-q", self.branch]);
        let _ = self.scanner.remove_depend();
        silent_argv(dir, self.restore);
    }
}

/// Walk the branch's revision list and record artifact sizes for every
/// revision not yet measured under the target build-label.
///
/// Steps, in order:
///
/// 1. Load the historic ledger from `git_sizes_path` (empty if absent).
/// 2. Compute the branch's revision list.
/// 3. Staleness pass: drop snapshots whose hash is no longer on the
///    branch (history rewrites), with a diagnostic per removal.
/// 4. Recording pass, oldest revision first: checkout (fatal on
///    failure), clean, from-scratch build (failure recorded, not
///    raised), scan, then merge into the existing snapshot for that
///    hash or append a new one from the commit metadata.
/// 5. Guaranteed cleanup: restore the original branch whether the pass
///    completed, failed, or panicked.
/// 6. Stable-sort ascending by commit date.
///
/// The caller persists the returned ledger.
///
/// # Errors
///
/// Fails if the ledger file is corrupt, the branch cannot be resolved,
/// or a git query/checkout fails. Build failures of individual historic
/// commits are diagnostics, not errors.
pub fn update_history(
    scanner: &Scanner,
    opts: &HistoryOptions,
    logger: &Logger,
    git_sizes_path: &Path,
) -> Result<HistoricLedger> {
    let dir = scanner.dir();
    let mut ledger = persist::load_history(git_sizes_path)?;

    let branch = match &opts.branch {
        Some(branch) => branch.clone(),
        None => git::current_branch(dir)?,
    };

    // Newest first, as git emits it; the walk below goes oldest first.
    let revisions = git::rev_list(dir, &branch)?;
    let on_branch: HashSet<&str> = revisions.iter().map(String::as_str).collect();

    ledger.retain_with(
        |snapshot| on_branch.contains(snapshot.git.hash.as_str()),
        |snapshot| logger.info(format!("{} no longer on '{branch}', removing", snapshot.git.hash)),
    );

    {
        let _restore = TreeRestore {
            scanner,
            branch: &branch,
            restore: &opts.restore,
        };
        record_revisions(scanner, opts, logger, &mut ledger, &revisions)?;
    }

    ledger.sort_by_date();
    Ok(ledger)
}

fn record_revisions(
    scanner: &Scanner,
    opts: &HistoryOptions,
    logger: &Logger,
    ledger: &mut HistoricLedger,
    revisions: &[String],
) -> Result<()> {
    let dir = scanner.dir();

    // Index for the duration of the pass; the ordered sequence is only
    // the boundary representation.
    let mut by_hash: HashMap<String, usize> = ledger
        .iter()
        .enumerate()
        .map(|(idx, snapshot)| (snapshot.git.hash.clone(), idx))
        .collect();

    for rev in revisions.iter().rev() {
        let known = by_hash
            .get(rev)
            .and_then(|&idx| ledger.snapshots().get(idx))
            .is_some_and(|snapshot| snapshot.is_recorded(&opts.label));
        if known {
            logger.info(format!("{rev} already recorded"));
            continue;
        }

        // Indeterminate tree state if this fails; abort (guard restores).
        git::checkout(dir, rev)?;

        scanner.clean()?;
        let rc = silent_argv(dir, &opts.build);

        let mut sizes = ArtifactSizes::new();
        for artifact in scanner.bin_files()? {
            sizes.insert(artifact.name, artifact.size);
        }

        match by_hash.get(rev) {
            Some(&idx) => {
                if let Some(snapshot) = ledger.get_mut(idx) {
                    snapshot.sizes.insert(opts.label.clone(), sizes);
                }
            }
            None => {
                let info = git::commit_log(dir, Some(1))?
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| CommitInfo {
                        hash: rev.clone(),
                        short: None,
                        author: None,
                        email: None,
                        date: None,
                        comment: None,
                    });
                let mut snapshot = SizeSnapshot::new(info);
                snapshot.sizes.insert(opts.label.clone(), sizes);
                by_hash.insert(rev.clone(), ledger.len());
                ledger.push(snapshot);
            }
        }

        if rc == 0 {
            logger.info(format!("{rev} ok"));
        } else {
            logger.info(format!("{rev} build failed (exit {rc})"));
        }
    }

    Ok(())
}
