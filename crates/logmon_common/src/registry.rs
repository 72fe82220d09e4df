//! Registry Store - persisted, ordered list of monitor rules
//!
//! The whole list is the unit of persistence: every mutation reloads the
//! document, edits it in memory and rewrites it. Rules are addressed by their
//! current position. There is no locking; callers must serialise writers.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One alerting rule definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorRule {
    #[serde(rename = "Monitor_Name")]
    pub name: String,

    /// Display name of the index; resolved through the index mapping downstream
    #[serde(rename = "Index")]
    pub index_key: String,

    #[serde(rename = "Text2Scan_in_Message")]
    pub match_text: String,

    /// Duration expression such as "5m"
    #[serde(rename = "Time2Scan")]
    pub scan_window: String,

    // Field name matches the documents the alerting job already consumes.
    #[serde(rename = "notificantion_channel")]
    pub channel: String,
}

impl MonitorRule {
    pub fn new(
        name: impl Into<String>,
        index_key: impl Into<String>,
        match_text: impl Into<String>,
        scan_window: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            index_key: index_key.into(),
            match_text: match_text.into(),
            scan_window: scan_window.into(),
            channel: channel.into(),
        }
    }
}

/// On-disk registry document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(rename = "Monitors")]
    pub monitors: Vec<MonitorRule>,
}

impl Default for RegistryFile {
    fn default() -> Self {
        Self {
            monitors: default_rules(),
        }
    }
}

/// The two example rules written when no registry exists yet
pub fn default_rules() -> Vec<MonitorRule> {
    vec![
        MonitorRule::new(
            "Index A check for error",
            "Index_A",
            "error",
            "5m",
            "notification_channel_1",
        ),
        MonitorRule::new(
            "Index B check for error",
            "Index_B",
            "error",
            "5m",
            "notification_channel_2",
        ),
    ]
}

/// JSON-file backed rule registry
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all rules, creating the default document on first access
    pub fn load(&self) -> Result<Vec<MonitorRule>, RegistryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "No registry at {}, writing default rules",
                    self.path.display()
                );
                let rules = default_rules();
                self.save(&rules)?;
                return Ok(rules);
            }
            Err(e) => return Err(RegistryError::storage(&self.path, e)),
        };

        let doc: RegistryFile =
            serde_json::from_str(&content).map_err(|source| RegistryError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        debug!("Loaded {} rules from {}", doc.monitors.len(), self.path.display());
        Ok(doc.monitors)
    }

    /// Overwrite the document with `rules`, preserving order
    pub fn save(&self, rules: &[MonitorRule]) -> Result<(), RegistryError> {
        let doc = RegistryFile {
            monitors: rules.to_vec(),
        };
        let json = serde_json::to_string_pretty(&doc)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| RegistryError::storage(parent, e))?;
            }
        }

        // Atomic write
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json).map_err(|e| RegistryError::storage(&temp_path, e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| RegistryError::storage(&self.path, e))?;

        debug!("Saved {} rules to {}", rules.len(), self.path.display());
        Ok(())
    }

    /// Add a rule at the end of the list
    pub fn append(&self, rule: MonitorRule) -> Result<(), RegistryError> {
        let mut rules = self.load()?;
        rules.push(rule);
        self.save(&rules)?;
        info!("Added rule at position {}", rules.len() - 1);
        Ok(())
    }

    /// Overwrite the rule at `position`
    pub fn replace_at(&self, position: usize, rule: MonitorRule) -> Result<(), RegistryError> {
        let mut rules = self.load()?;
        let len = rules.len();
        let slot = rules
            .get_mut(position)
            .ok_or(RegistryError::PositionOutOfRange { position, len })?;
        *slot = rule;
        self.save(&rules)?;
        info!("Updated rule at position {}", position);
        Ok(())
    }

    /// Delete the rule at `position`; later rules shift down by one
    pub fn remove_at(&self, position: usize) -> Result<MonitorRule, RegistryError> {
        let mut rules = self.load()?;
        if position >= rules.len() {
            return Err(RegistryError::PositionOutOfRange {
                position,
                len: rules.len(),
            });
        }
        let removed = rules.remove(position);
        self.save(&rules)?;
        info!(
            "Deleted rule at position {} ({} remaining)",
            position,
            rules.len()
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (RegistryStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path().join("monitors.json"));
        (store, dir)
    }

    fn rule(name: &str) -> MonitorRule {
        MonitorRule::new(name, "Index_C", "timeout", "10m", "ops")
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let (store, _dir) = store();
        assert!(!store.path().exists());

        let rules = store.load().unwrap();
        assert_eq!(rules, default_rules());
        assert!(store.path().exists());

        // Second load reads the persisted document
        assert_eq!(store.load().unwrap(), default_rules());
    }

    #[test]
    fn test_document_uses_reference_field_names() {
        let (store, _dir) = store();
        store.load().unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        let first = &raw["Monitors"][0];
        assert_eq!(first["Monitor_Name"], "Index A check for error");
        assert_eq!(first["Index"], "Index_A");
        assert_eq!(first["Text2Scan_in_Message"], "error");
        assert_eq!(first["Time2Scan"], "5m");
        assert_eq!(first["notificantion_channel"], "notification_channel_1");
    }

    #[test]
    fn test_save_load_roundtrip_preserves_order() {
        let (store, _dir) = store();
        let rules = vec![rule("c"), rule("a"), rule("b")];
        store.save(&rules).unwrap();
        assert_eq!(store.load().unwrap(), rules);
    }

    #[test]
    fn test_save_empty_list() {
        let (store, _dir) = store();
        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_document_is_surfaced() {
        let (store, _dir) = store();
        fs::write(store.path(), "{\"Monitors\": [{\"Monitor_Name\": 3}]}").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, RegistryError::Malformed { .. }));
        // Not repaired
        assert!(fs::read_to_string(store.path()).unwrap().contains("\"Monitor_Name\": 3"));
    }

    #[test]
    fn test_unresolvable_index_key_is_tolerated() {
        let (store, _dir) = store();
        store
            .append(MonitorRule::new("x", "Index_Z", "panic", "1m", "ch"))
            .unwrap();
        assert_eq!(store.load().unwrap()[2].index_key, "Index_Z");
    }

    #[test]
    fn test_append_adds_last() {
        let (store, _dir) = store();
        let before = store.load().unwrap();
        store.append(rule("new")).unwrap();

        let after = store.load().unwrap();
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(&after[..before.len()], &before[..]);
        assert_eq!(after.last().unwrap(), &rule("new"));
    }

    #[test]
    fn test_replace_at_changes_only_target() {
        let (store, _dir) = store();
        store.save(&[rule("a"), rule("b"), rule("c")]).unwrap();

        store.replace_at(1, rule("B")).unwrap();
        assert_eq!(store.load().unwrap(), vec![rule("a"), rule("B"), rule("c")]);
    }

    #[test]
    fn test_replace_at_out_of_range() {
        let (store, _dir) = store();
        store.save(&[rule("a")]).unwrap();

        let err = store.replace_at(1, rule("B")).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::PositionOutOfRange { position: 1, len: 1 }
        ));
        assert_eq!(store.load().unwrap(), vec![rule("a")]);
    }

    #[test]
    fn test_remove_at_shifts_later_rules() {
        let (store, _dir) = store();
        store
            .save(&[rule("a"), rule("b"), rule("c"), rule("d")])
            .unwrap();

        let removed = store.remove_at(1).unwrap();
        assert_eq!(removed, rule("b"));
        assert_eq!(store.load().unwrap(), vec![rule("a"), rule("c"), rule("d")]);
    }

    #[test]
    fn test_remove_at_out_of_range_leaves_document_unchanged() {
        let (store, _dir) = store();
        store.save(&[rule("a"), rule("b")]).unwrap();
        let before = fs::read(store.path()).unwrap();

        let err = store.remove_at(2).unwrap_err();
        assert!(err.is_addressing());
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path().join("nested/config/monitors.json"));
        store.save(&[rule("a")]).unwrap();
        assert_eq!(store.load().unwrap(), vec![rule("a")]);
    }
}
