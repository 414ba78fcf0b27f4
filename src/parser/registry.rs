//! Per-document identifier registries.
//!
//! Filled while block matching runs and only read afterwards, so forward
//! references resolve during inline matching.

use std::collections::HashMap;

/// A link reference definition recorded during block matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionEntry {
    pub label: String,
    pub url: String,
    pub title: Option<String>,
}

/// Stores definitions and footnote definitions of one document.
/// Labels are stored normalized; the first definition of a label wins.
#[derive(Debug, Clone, Default)]
pub struct IdentifierRegistry {
    definitions: HashMap<String, DefinitionEntry>,
    footnotes: HashMap<String, String>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the label was already defined.
    pub fn add_definition(&mut self, label: &str, url: String, title: Option<String>) -> bool {
        let identifier = normalize_identifier(label);
        if identifier.is_empty() || self.definitions.contains_key(&identifier) {
            return false;
        }
        log::trace!("Registered definition {:?}", identifier);
        self.definitions.insert(
            identifier,
            DefinitionEntry {
                label: label.to_string(),
                url,
                title,
            },
        );
        true
    }

    pub fn definition(&self, label: &str) -> Option<&DefinitionEntry> {
        self.definitions.get(&normalize_identifier(label))
    }

    pub fn has_definition(&self, label: &str) -> bool {
        self.definitions.contains_key(&normalize_identifier(label))
    }

    pub fn add_footnote(&mut self, label: &str) -> bool {
        let identifier = normalize_identifier(label);
        if identifier.is_empty() || self.footnotes.contains_key(&identifier) {
            return false;
        }
        log::trace!("Registered footnote {:?}", identifier);
        self.footnotes.insert(identifier, label.to_string());
        true
    }

    pub fn has_footnote(&self, label: &str) -> bool {
        self.footnotes.contains_key(&normalize_identifier(label))
    }
}

/// Normalize a link label: trim, collapse internal whitespace and case-fold.
pub fn normalize_identifier(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .replace('ß', "ss")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_and_whitespace_insensitive() {
        let mut registry = IdentifierRegistry::new();
        registry.add_definition("Foo  Bar", "/url".to_string(), None);
        assert!(registry.has_definition("foo bar"));
        assert!(registry.has_definition(" FOO\nbar "));
        assert_eq!(registry.definition("FOO BAR").unwrap().url, "/url");
    }

    #[test]
    fn first_definition_wins() {
        let mut registry = IdentifierRegistry::new();
        assert!(registry.add_definition("a", "/one".to_string(), None));
        assert!(!registry.add_definition("A", "/two".to_string(), None));
        assert_eq!(registry.definition("a").unwrap().url, "/one");
    }

    #[test]
    fn footnotes_are_separate_from_definitions() {
        let mut registry = IdentifierRegistry::new();
        registry.add_footnote("1");
        assert!(registry.has_footnote("1"));
        assert!(!registry.has_definition("1"));
    }

    #[test]
    fn empty_labels_are_rejected() {
        let mut registry = IdentifierRegistry::new();
        assert!(!registry.add_definition("  ", "/x".to_string(), None));
    }
}
