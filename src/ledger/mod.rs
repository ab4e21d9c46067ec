//! The size ledger: the data model and operations behind both persisted
//! datasets.
//!
//! Two collections live here:
//!
//! - the *historic* ledger — an ordered list of per-commit size
//!   snapshots, built by walking the revision list
//!   ([`history::update_history`]);
//! - the *recent* ledger — a per-build-label, per-artifact size-over-time
//!   trace of the current working tree ([`RecentLedger::update`]).
//!
//! Serde shapes mirror the persisted JSON exactly: a snapshot is an
//! object with one key per build-label plus a `"git"` identity object; a
//! recent ledger is an object with a `counter` plus one key per label.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::git::CommitInfo;

pub mod history;
mod recent;


pub use history::{HistoryOptions, update_history};
pub use recent::{RecentEntry, RecentLedger};

/// Map from artifact name to byte size, as measured for one build-label.
pub type ArtifactSizes = BTreeMap<String, u64>;

/// One historic ledger entry: a commit identity plus the artifact sizes
/// measured under each build-label.
///
/// JSON shape: `{ "<label>": {"a.bin": 1234}, "git": {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeSnapshot {
    /// Commit identity, serialized under the `"git"` key.
    pub git: CommitInfo,

    /// Build-label → artifact → size. An empty map under a label records
    /// that the commit failed to build for that label — absence of data
    /// is itself meaningful.
    #[serde(flatten)]
    pub sizes: BTreeMap<String, ArtifactSizes>,
}

impl SizeSnapshot {
    pub fn new(git: CommitInfo) -> Self {
        Self {
            git,
            sizes: BTreeMap::new(),
        }
    }

    /// Whether this snapshot already carries a measurement for `label`.
    ///
    /// An empty artifact map does not count: a failed build leaves the
    /// commit eligible for re-recording on a later run.
    pub fn is_recorded(&self, label: &str) -> bool {
        self.sizes.get(label).is_some_and(|map| !map.is_empty())
    }
}

/// Two snapshots are size-equal iff their build-label sets are identical
/// and every label's artifact→size map matches. Commit identity is
/// excluded — it differs by construction.
pub fn size_equal(a: &SizeSnapshot, b: &SizeSnapshot) -> bool {
    a.sizes == b.sizes
}

/// The ordered sequence of historic size snapshots.
///
/// Kept ascending by commit date (stable — equal dates preserve relative
/// order), with at most one snapshot per commit hash.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoricLedger {
    snapshots: Vec<SizeSnapshot>,
}

impl HistoricLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SizeSnapshot> {
        self.snapshots.iter()
    }

    pub fn snapshots(&self) -> &[SizeSnapshot] {
        &self.snapshots
    }

    /// Position of the snapshot recorded for `hash`, if any.
    pub fn position(&self, hash: &str) -> Option<usize> {
        self.snapshots.iter().position(|s| s.git.hash == hash)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SizeSnapshot> {
        self.snapshots.get_mut(index)
    }

    pub fn push(&mut self, snapshot: SizeSnapshot) {
        self.snapshots.push(snapshot);
    }

    /// Append a snapshot for `info` carrying `sizes` under `label`,
    /// unless a snapshot with the same hash is already present.
    ///
    /// Returns whether an entry was appended.
    pub fn append(&mut self, label: &str, sizes: ArtifactSizes, info: CommitInfo) -> bool {
        if self.position(&info.hash).is_some() {
            return false;
        }
        let mut snapshot = SizeSnapshot::new(info);
        snapshot.sizes.insert(label.to_string(), sizes);
        self.snapshots.push(snapshot);
        true
    }

    /// Drop snapshots not satisfying the predicate, reporting each
    /// removal to `removed`.
    pub fn retain_with(
        &mut self,
        mut keep: impl FnMut(&SizeSnapshot) -> bool,
        mut removed: impl FnMut(&SizeSnapshot),
    ) {
        self.snapshots.retain(|snapshot| {
            let kept = keep(snapshot);
            if !kept {
                removed(snapshot);
            }
            kept
        });
    }

    /// Stable sort ascending by commit date. Snapshots without a date
    /// sort first; equal dates keep their relative order from the
    /// revision list.
    pub fn sort_by_date(&mut self) {
        self.snapshots
            .sort_by_key(|s| s.git.date.clone().unwrap_or_default());
    }

    /// Remove snapshots that are size-equal to their immediate
    /// predecessor, left to right in a single pass over indices.
    ///
    /// The first entry is never pruned. Non-adjacent duplicates (a size
    /// regresses and later returns to an old value) are intentionally
    /// kept — only redundant intermediates carry no information.
    pub fn prune(&mut self) {
        let mut prune = Vec::new();
        for idx in 1..self.snapshots.len() {
            if size_equal(&self.snapshots[idx - 1], &self.snapshots[idx]) {
                prune.push(idx);
            }
        }
        for idx in prune.into_iter().rev() {
            self.snapshots.remove(idx);
        }
    }
}

impl IntoIterator for HistoricLedger {
    type Item = SizeSnapshot;
    type IntoIter = std::vec::IntoIter<SizeSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.into_iter()
    }
}
