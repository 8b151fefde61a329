//! Extension → MIME type registry.
//!
//! A [`MimeRegistry`] is plain owned data: build one, keep it next to the
//! code that needs lookups, and pass it by reference. It is not internally
//! synchronised; wrap it in a lock if several threads mutate it.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::MimeConfig;
use crate::mime::defaults::DEFAULT_TYPES;

/// Mapping of lower-case extensions (no leading dot) to MIME type strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MimeRegistry {
    #[serde(flatten)]
    types: HashMap<String, String>,
}

impl MimeRegistry {
    /// Create a registry seeded with the built-in extension table.
    #[must_use]
    pub fn new() -> Self {
        let types = DEFAULT_TYPES
            .iter()
            .map(|(ext, mime)| ((*ext).to_owned(), (*mime).to_owned()))
            .collect();
        Self { types }
    }

    /// Create a registry with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Build a registry from configuration: optionally seed the defaults,
    /// then apply every configured pair with [`MimeRegistry::set`].
    #[must_use]
    pub fn from_config(config: &MimeConfig) -> Self {
        let mut registry = if config.defaults {
            Self::new()
        } else {
            Self::empty()
        };
        for (ext, mime) in &config.types {
            registry.set(ext.as_str(), mime.as_str());
        }
        registry
    }

    /// Exact, case-sensitive lookup.
    #[must_use]
    pub fn get(&self, extension: &str) -> Option<&str> {
        self.types.get(extension).map(String::as_str)
    }

    /// Insert `mime` for `extension` unless the key already exists.
    ///
    /// Returns `true` if the entry was inserted.
    pub fn add(&mut self, extension: impl Into<String>, mime: impl Into<String>) -> bool {
        match self.types.entry(extension.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(mime.into());
                true
            }
        }
    }

    /// Insert or overwrite the entry, returning the previous value.
    pub fn set(&mut self, extension: impl Into<String>, mime: impl Into<String>) -> Option<String> {
        self.types.insert(extension.into(), mime.into())
    }

    /// Remove the entry and return the value it held.
    pub fn pull(&mut self, extension: &str) -> Option<String> {
        self.types.remove(extension)
    }

    /// Remove the entry if present. Returns whether anything was removed.
    pub fn remove(&mut self, extension: &str) -> bool {
        self.types.remove(extension).is_some()
    }

    /// Returns `true` if `extension` has an entry.
    #[must_use]
    pub fn has(&self, extension: &str) -> bool {
        self.types.contains_key(extension)
    }

    /// Sorted snapshot of every entry.
    #[must_use]
    pub fn all(&self) -> BTreeMap<String, String> {
        self.types
            .iter()
            .map(|(ext, mime)| (ext.clone(), mime.clone()))
            .collect()
    }

    /// Remove every entry.
    pub fn flush(&mut self) {
        self.types.clear();
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Look up the MIME type for a path's extension, lower-casing it first.
    #[must_use]
    pub fn lookup_path(&self, path: &Path) -> Option<&str> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.get(&ext)
    }
}

impl Default for MimeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
