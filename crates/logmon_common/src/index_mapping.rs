//! Index Mapping - display name to physical index name table
//!
//! Built once at startup from configuration and handed to the probe and the
//! provisioning workflow. Read-only after construction.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// One display-name to physical-name pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBinding {
    /// Human-facing label used by monitor rules (e.g. "Index_A")
    pub display: String,
    /// Physical index name on the cluster (e.g. "index_a")
    pub physical: String,
}

impl IndexBinding {
    pub fn new(display: impl Into<String>, physical: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            physical: physical.into(),
        }
    }
}

/// Ordered, immutable mapping of display names to physical index names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMapping {
    bindings: Vec<IndexBinding>,
}

impl IndexMapping {
    /// Build a mapping, rejecting duplicate display names
    pub fn new(bindings: Vec<IndexBinding>) -> Result<Self, ConfigError> {
        for (i, binding) in bindings.iter().enumerate() {
            if bindings[..i].iter().any(|b| b.display == binding.display) {
                return Err(ConfigError::DuplicateIndex(binding.display.clone()));
            }
        }
        Ok(Self { bindings })
    }

    /// Resolve a display name to its physical index name
    pub fn resolve(&self, display: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.display == display)
            .map(|b| b.physical.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexBinding> {
        self.bindings.iter()
    }

    pub fn bindings(&self) -> &[IndexBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for IndexMapping {
    fn default() -> Self {
        Self {
            bindings: default_bindings(),
        }
    }
}

/// The three indexes of the reference deployment
pub fn default_bindings() -> Vec<IndexBinding> {
    vec![
        IndexBinding::new("Index_A", "index_a"),
        IndexBinding::new("Index_B", "index_b"),
        IndexBinding::new("Index_C", "index_c"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping() {
        let mapping = IndexMapping::default();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.resolve("Index_A"), Some("index_a"));
        assert_eq!(mapping.resolve("Index_C"), Some("index_c"));
        assert_eq!(mapping.resolve("index_a"), None);
    }

    #[test]
    fn test_mapping_preserves_order() {
        let mapping = IndexMapping::new(vec![
            IndexBinding::new("Zeta", "z"),
            IndexBinding::new("Alpha", "a"),
        ])
        .unwrap();
        let names: Vec<&str> = mapping.iter().map(|b| b.display.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_duplicate_display_rejected() {
        let result = IndexMapping::new(vec![
            IndexBinding::new("Index_A", "index_a"),
            IndexBinding::new("Index_A", "index_other"),
        ]);
        assert!(matches!(result, Err(ConfigError::DuplicateIndex(name)) if name == "Index_A"));
    }
}
