//! The recent-sizes ledger: a per-artifact size-over-time trace of the
//! current working tree, one point per observed size change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scan::Artifact;

/// One point in an artifact's size trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    /// Value of the shared monotonic counter when this change was seen.
    pub index: u64,
    /// Artifact size in bytes.
    pub size: u64,
    /// Artifact modification time, unix seconds.
    pub mtime: i64,
}

/// Mapping from build-label to artifact-name to ordered size trace, plus
/// the shared monotonic counter.
///
/// JSON shape:
/// `{ "counter": 2, "<label>": {"a.bin": [{"index":1,"size":100,"mtime":...}]} }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentLedger {
    /// Incremented once per update pass that detected any change, never
    /// per artifact.
    #[serde(default)]
    pub counter: u64,

    #[serde(flatten)]
    labels: BTreeMap<String, BTreeMap<String, Vec<RecentEntry>>>,
}

impl RecentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The trace recorded for one artifact under one build-label.
    pub fn trace(&self, label: &str, artifact: &str) -> Option<&[RecentEntry]> {
        self.labels
            .get(label)
            .and_then(|artifacts| artifacts.get(artifact))
            .map(Vec::as_slice)
    }

    /// Record the current artifact scan under `label`.
    ///
    /// For every artifact whose size differs from the last recorded entry
    /// (or that has no entries yet — first observation always counts), a
    /// new [`RecentEntry`] is appended carrying the next counter value.
    /// The counter advances once per call iff anything was appended.
    ///
    /// Returns whether the ledger changed.
    pub fn update(&mut self, label: &str, artifacts: &[Artifact]) -> bool {
        let next_index = self.counter + 1;
        let mut changed = false;

        for artifact in artifacts {
            let trace = self
                .labels
                .entry(label.to_string())
                .or_default()
                .entry(artifact.name.clone())
                .or_default();

            if trace.last().is_none_or(|last| last.size != artifact.size) {
                trace.push(RecentEntry {
                    index: next_index,
                    size: artifact.size,
                    mtime: artifact.mtime,
                });
                changed = true;
            }
        }

        if changed {
            self.counter = next_index;
        }
        changed
    }
}
