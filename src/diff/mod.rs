//! Diff engine for comparing recorded and desired resource state.
//!
//! This module computes detailed, path-addressed diffs between two property
//! maps, escalates changes on replace-triggering keys, and builds the
//! response handed back to the host engine.

mod engine;
mod types;

pub use engine::{DiffEngine, DiffOptions};
pub use types::{DiffChanges, DiffEntry, DiffKind, DiffResponse, DiffResult, PropertyDiff};
