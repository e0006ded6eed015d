//! Diff result types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Classification of a single change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffKind {
    /// Present only in the new state.
    Add,
    /// Added, and the addition forces replacement.
    AddReplace,
    /// Present in both with different values.
    Update,
    /// Updated, and the update forces replacement.
    UpdateReplace,
    /// Present only in the old state.
    Delete,
    /// Deleted, and the deletion forces replacement.
    DeleteReplace,
    /// Unchanged.
    Stable,
}

impl DiffKind {
    /// The replace variant of this kind. `Stable` stays `Stable`.
    #[must_use]
    pub const fn as_replace(self) -> Self {
        match self {
            Self::Add | Self::AddReplace => Self::AddReplace,
            Self::Update | Self::UpdateReplace => Self::UpdateReplace,
            Self::Delete | Self::DeleteReplace => Self::DeleteReplace,
            Self::Stable => Self::Stable,
        }
    }

    /// Returns true for the replace variants.
    #[must_use]
    pub const fn is_replace(self) -> bool {
        matches!(self, Self::AddReplace | Self::UpdateReplace | Self::DeleteReplace)
    }

    /// Returns true for anything but `Stable`.
    #[must_use]
    pub const fn is_change(self) -> bool {
        !matches!(self, Self::Stable)
    }
}

/// One entry of a detailed diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// Fully-qualified property path.
    pub key: String,
    /// Change classification.
    pub kind: DiffKind,
    /// Whether this change was escalated to a replacement.
    pub force_replace: bool,
    /// Whether the change is between inputs (as opposed to outputs).
    pub input_affecting: bool,
}

impl DiffEntry {
    /// Creates an input-affecting entry.
    #[must_use]
    pub fn new(key: impl Into<String>, kind: DiffKind) -> Self {
        Self {
            key: key.into(),
            kind,
            force_replace: kind.is_replace(),
            input_affecting: true,
        }
    }
}

/// Ordered, deduplicated diff output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    entries: BTreeMap<String, DiffEntry>,
    replaces: BTreeSet<String>,
    changed_keys: BTreeSet<String>,
}

impl DiffResult {
    /// Creates an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entry under `top_level` key. A later entry for the same path wins.
    pub fn record(&mut self, top_level: &str, entry: DiffEntry) {
        if entry.kind.is_change() {
            self.changed_keys.insert(top_level.to_string());
        }
        if entry.force_replace {
            self.replaces.insert(top_level.to_string());
        }
        self.entries.insert(entry.key.clone(), entry);
    }

    /// Adds an unconditional `Update` on `key`, independent of any comparison.
    pub fn force_update(&mut self, key: &str) {
        self.record(key, DiffEntry::new(key, DiffKind::Update));
    }

    /// Entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.values()
    }

    /// Entry for an exact path.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DiffEntry> {
        self.entries.get(key)
    }

    /// Top-level keys whose change forces replacement.
    #[must_use]
    pub const fn replaces(&self) -> &BTreeSet<String> {
        &self.replaces
    }

    /// Top-level keys with at least one change below them.
    #[must_use]
    pub const fn changed_keys(&self) -> &BTreeSet<String> {
        &self.changed_keys
    }

    /// Returns true if the top-level `key` changed.
    #[must_use]
    pub fn changed(&self, key: &str) -> bool {
        self.changed_keys.contains(key)
    }

    /// Returns true if nothing but `Stable` entries were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed_keys.is_empty()
    }

    /// Number of non-stable entries.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.entries.values().filter(|e| e.kind.is_change()).count()
    }

    /// Builds the host-facing diff response.
    #[must_use]
    pub fn to_response(&self, delete_before_replace: bool) -> DiffResponse {
        let detailed_diff = self
            .entries
            .values()
            .filter(|e| e.kind.is_change())
            .map(|e| {
                (
                    e.key.clone(),
                    PropertyDiff {
                        kind: e.kind,
                        input_diff: e.input_affecting,
                    },
                )
            })
            .collect();

        DiffResponse {
            changes: if self.is_empty() { DiffChanges::None } else { DiffChanges::Some },
            diffs: self.changed_keys.iter().cloned().collect(),
            replaces: self.replaces.iter().cloned().collect(),
            detailed_diff,
            delete_before_replace,
        }
    }
}

/// Whether a diff found changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffChanges {
    /// No changes.
    None,
    /// At least one change.
    Some,
}

/// Per-path change reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDiff {
    /// Change classification.
    pub kind: DiffKind,
    /// Whether the change is between inputs.
    pub input_diff: bool,
}

/// Response to a diff call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResponse {
    /// Overall verdict.
    pub changes: DiffChanges,
    /// Changed top-level keys.
    #[serde(default)]
    pub diffs: Vec<String>,
    /// Top-level keys forcing replacement.
    #[serde(default)]
    pub replaces: Vec<String>,
    /// Detailed per-path changes.
    #[serde(default)]
    pub detailed_diff: BTreeMap<String, PropertyDiff>,
    /// Whether a replacement must delete the old object first.
    #[serde(default)]
    pub delete_before_replace: bool,
}

impl DiffResponse {
    /// A response reporting no changes.
    #[must_use]
    pub const fn unchanged() -> Self {
        Self {
            changes: DiffChanges::None,
            diffs: Vec::new(),
            replaces: Vec::new(),
            detailed_diff: BTreeMap::new(),
            delete_before_replace: false,
        }
    }
}
