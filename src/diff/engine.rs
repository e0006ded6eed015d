//! Structural diff of two property maps.
//!
//! Objects are compared member by member and arrays element by element, so
//! every reported path points at the smallest differing subtree. Top-level
//! keys are reported verbatim. `Null` is the same as absent and secrecy alone
//! is never a change.

use std::collections::BTreeSet;
use tracing::trace;

use crate::property::path::{push_index, push_key};
use crate::property::{PropertyMap, PropertyValue};

use super::types::{DiffEntry, DiffKind, DiffResult};

/// Engine configuration.
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Top-level keys whose changes force replacement.
    pub replace_keys: BTreeSet<String>,
    /// Escalate every change to a replacement.
    pub any_diff_replaces: bool,
    /// Top-level keys excluded from comparison.
    pub ignore_changes: BTreeSet<String>,
    /// Report `Stable` entries too.
    pub include_stable: bool,
}

/// Engine computing detailed diffs with replace escalation.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    /// Creates an engine that never escalates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with explicit options.
    #[must_use]
    pub const fn with_options(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Sets the replace-triggering keys.
    #[must_use]
    pub fn replace_on<'a>(mut self, keys: impl IntoIterator<Item = &'a str>) -> Self {
        self.options.replace_keys = keys.into_iter().map(str::to_string).collect();
        self
    }

    /// Escalates every change.
    #[must_use]
    pub const fn replace_on_any_change(mut self) -> Self {
        self.options.any_diff_replaces = true;
        self
    }

    /// Excludes top-level keys from comparison.
    #[must_use]
    pub fn ignoring<'a>(mut self, keys: impl IntoIterator<Item = &'a str>) -> Self {
        self.options.ignore_changes.extend(keys.into_iter().map(str::to_string));
        self
    }

    /// Also reports unchanged leaves.
    #[must_use]
    pub const fn include_stable(mut self) -> Self {
        self.options.include_stable = true;
        self
    }

    /// Diffs `old` against `new`.
    #[must_use]
    pub fn diff(&self, old: &PropertyMap, new: &PropertyMap) -> DiffResult {
        let mut result = DiffResult::new();

        let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        for key in keys {
            if self.options.ignore_changes.contains(key.as_str()) {
                continue;
            }
            let mut walk = Walk {
                engine: self,
                top: key,
                result: &mut result,
            };
            walk.value(key, old.get(key.as_str()), new.get(key.as_str()));
        }

        trace!("Diff produced {} changes", result.change_count());
        result
    }

    fn escalates(&self, top: &str) -> bool {
        self.options.any_diff_replaces || self.options.replace_keys.contains(top)
    }
}

struct Walk<'a> {
    engine: &'a DiffEngine,
    top: &'a str,
    result: &'a mut DiffResult,
}

impl Walk<'_> {
    fn value(&mut self, path: &str, old: Option<&PropertyValue>, new: Option<&PropertyValue>) {
        let old = old.map(PropertyValue::unwrap_secret).filter(|v| !v.is_null());
        let new = new.map(PropertyValue::unwrap_secret).filter(|v| !v.is_null());

        match (old, new) {
            (None, None) => {}
            (Some(_), None) => self.emit(path, DiffKind::Delete),
            (None, Some(_)) => self.emit(path, DiffKind::Add),
            (Some(PropertyValue::Unknown), Some(PropertyValue::Unknown)) => {
                self.emit(path, DiffKind::Stable);
            }
            (Some(_), Some(PropertyValue::Unknown)) => self.emit(path, DiffKind::Update),
            (Some(PropertyValue::Object(a)), Some(PropertyValue::Object(b))) => self.object(path, a, b),
            (Some(PropertyValue::Array(a)), Some(PropertyValue::Array(b))) => self.array(path, a, b),
            (Some(a), Some(b)) => {
                let kind = if a == b { DiffKind::Stable } else { DiffKind::Update };
                self.emit(path, kind);
            }
        }
    }

    fn object(&mut self, path: &str, old: &PropertyMap, new: &PropertyMap) {
        if old.is_empty() && new.is_empty() {
            self.emit(path, DiffKind::Stable);
            return;
        }
        let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        for key in keys {
            self.value(&push_key(path, key), old.get(key.as_str()), new.get(key.as_str()));
        }
    }

    fn array(&mut self, path: &str, old: &[PropertyValue], new: &[PropertyValue]) {
        if old.is_empty() && new.is_empty() {
            self.emit(path, DiffKind::Stable);
            return;
        }
        for i in 0..old.len().max(new.len()) {
            self.value(&push_index(path, i), old.get(i), new.get(i));
        }
    }

    fn emit(&mut self, path: &str, kind: DiffKind) {
        if !kind.is_change() {
            if self.engine.options.include_stable {
                self.result.record(self.top, DiffEntry::new(path, kind));
            }
            return;
        }

        let mut entry = DiffEntry::new(path, kind);
        if self.engine.escalates(self.top) {
            entry.kind = kind.as_replace();
            entry.force_replace = true;
        }
        self.result.record(self.top, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PropertyMap {
        PropertyMap::new()
            .with("organization", "acme")
            .with("name", "web")
            .with("active", true)
            .with("ports", vec![PropertyValue::from(80.0), PropertyValue::from(443.0)])
            .with(
                "settings",
                PropertyMap::new()
                    .with("branch", "main")
                    .with("env vars", PropertyMap::new().with("A", "1")),
            )
    }

    #[test]
    fn test_identical_maps_have_no_changes() {
        let engine = DiffEngine::new().replace_on(["organization"]);
        let result = engine.diff(&sample(), &sample());
        assert!(result.is_empty());
        assert_eq!(result.entries().count(), 0);
        assert!(result.replaces().is_empty());
    }

    #[test]
    fn test_include_stable_reports_leaves() {
        let result = DiffEngine::new().include_stable().diff(&sample(), &sample());
        assert!(result.is_empty());
        assert_eq!(result.get("settings.branch").map(|e| e.kind), Some(DiffKind::Stable));
        assert_eq!(result.get("ports[1]").map(|e| e.kind), Some(DiffKind::Stable));
    }

    #[test]
    fn test_add_and_delete_are_antisymmetric() {
        let a = sample();
        let mut b = sample().with("description", "new").with("extra", 1.0);
        b.remove("active");

        let forward = DiffEngine::new().diff(&a, &b);
        let backward = DiffEngine::new().diff(&b, &a);

        for entry in forward.entries() {
            let mirrored = backward.get(&entry.key).map(|e| e.kind);
            match entry.kind {
                DiffKind::Add => assert_eq!(mirrored, Some(DiffKind::Delete)),
                DiffKind::Delete => assert_eq!(mirrored, Some(DiffKind::Add)),
                _ => {}
            }
        }
        assert_eq!(forward.get("description").map(|e| e.kind), Some(DiffKind::Add));
        assert_eq!(forward.get("active").map(|e| e.kind), Some(DiffKind::Delete));
    }

    #[test]
    fn test_top_level_keys_are_verbatim() {
        let old = PropertyMap::new()
            .with("my-key", "a")
            .with("aws:region", "us-east-1")
            .with("tags", PropertyMap::new().with("cost-center", "1"));
        let new = PropertyMap::new()
            .with("my-key", "b")
            .with("aws:region", "us-west-2")
            .with("tags", PropertyMap::new().with("cost-center", "2"));

        let result = DiffEngine::new().replace_on(["my-key"]).diff(&old, &new);
        let keys: Vec<&str> = result.entries().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["aws:region", "my-key", "tags[\"cost-center\"]"]);
        assert!(result.changed("my-key"));
        assert_eq!(result.get("my-key").map(|e| e.kind), Some(DiffKind::UpdateReplace));

        let response = result.to_response(false);
        assert_eq!(response.diffs, vec!["aws:region", "my-key", "tags"]);
        assert_eq!(response.replaces, vec!["my-key"]);
        assert!(response.detailed_diff.contains_key("my-key"));
    }

    #[test]
    fn test_nested_paths() {
        let mut new = sample();
        new.insert(
            String::from("settings"),
            PropertyValue::Object(
                PropertyMap::new()
                    .with("branch", "dev")
                    .with("env vars", PropertyMap::new().with("A", "2")),
            ),
        );
        new.insert(String::from("ports"), PropertyValue::Array(vec![PropertyValue::from(80.0)]));

        let result = DiffEngine::new().diff(&sample(), &new);
        let kinds: Vec<(&str, DiffKind)> = result.entries().map(|e| (e.key.as_str(), e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("ports[1]", DiffKind::Delete),
                ("settings.branch", DiffKind::Update),
                ("settings[\"env vars\"].A", DiffKind::Update),
            ]
        );
        assert!(result.changed("settings"));
        assert!(!result.changed("name"));
    }

    #[test]
    fn test_replace_escalation_is_confined_to_replace_keys() {
        let new = sample().with("organization", "other").with("name", "api");
        let result = DiffEngine::new().replace_on(["organization"]).diff(&sample(), &new);

        let org = result.get("organization").expect("organization entry");
        assert_eq!(org.kind, DiffKind::UpdateReplace);
        assert!(org.force_replace);

        let name = result.get("name").expect("name entry");
        assert_eq!(name.kind, DiffKind::Update);
        assert!(!name.force_replace);

        assert_eq!(result.replaces().iter().collect::<Vec<_>>(), vec!["organization"]);
    }

    #[test]
    fn test_nested_change_escalates_top_level_key() {
        let mut new = sample();
        new.insert(
            String::from("settings"),
            PropertyValue::Object(PropertyMap::new().with("branch", "main")),
        );
        let result = DiffEngine::new().replace_on(["settings"]).diff(&sample(), &new);
        assert_eq!(
            result.get("settings[\"env vars\"]").map(|e| e.kind),
            Some(DiffKind::DeleteReplace)
        );
        assert!(result.replaces().contains("settings"));
    }

    #[test]
    fn test_any_diff_replaces() {
        let new = sample().with("active", false);
        let result = DiffEngine::new().replace_on_any_change().diff(&sample(), &new);
        assert_eq!(result.get("active").map(|e| e.kind), Some(DiffKind::UpdateReplace));
        assert!(result.replaces().contains("active"));
    }

    #[test]
    fn test_null_is_absent_and_secrecy_is_not_a_change() {
        let old = PropertyMap::new().with("token", "abc").with("gone", PropertyValue::Null);
        let new = PropertyMap::new().with("token", PropertyValue::secret("abc"));
        assert!(DiffEngine::new().diff(&old, &new).is_empty());
    }

    #[test]
    fn test_unknown_in_new_is_an_update() {
        let old = PropertyMap::new().with("url", "https://a");
        let new = PropertyMap::new().with("url", PropertyValue::Unknown);
        let result = DiffEngine::new().diff(&old, &new);
        assert_eq!(result.get("url").map(|e| e.kind), Some(DiffKind::Update));
    }

    #[test]
    fn test_ignored_keys_are_skipped() {
        let new = sample().with("name", "api");
        let result = DiffEngine::new().ignoring(["name"]).diff(&sample(), &new);
        assert!(result.is_empty());
    }

    #[test]
    fn test_kind_change_is_an_update_at_that_path() {
        let new = sample().with("ports", "80,443");
        let result = DiffEngine::new().diff(&sample(), &new);
        assert_eq!(result.get("ports").map(|e| e.kind), Some(DiffKind::Update));
        assert!(result.get("ports[0]").is_none());
    }
}
