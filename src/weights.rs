//! Weight-catalog model built by the header scan.

use std::collections::BTreeMap;

/// A single `<weight>` declaration: its attributes in declaration order
/// (`id` included) and its unescaped body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightDef {
    pub id: String,
    pub attributes: Vec<(String, String)>,
    pub content: String,
}

/// The start tag of the `<weightgroup>` owning a weight, with every child
/// `<weight>` stripped. This is the metadata shared by a family of variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeightGroupShell {
    pub attributes: Vec<(String, String)>,
}

/// Everything needed to rebuild the header for one weight id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightEntry {
    pub group: WeightGroupShell,
    pub def: WeightDef,
}

/// The declared weight variants of an LHE file, keyed by id.
///
/// Iteration order is ascending by id, which makes the per-id output order
/// deterministic regardless of declaration order in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightCatalog {
    version: String,
    entries: BTreeMap<String, WeightEntry>,
}

impl WeightCatalog {
    pub(crate) fn new(version: impl Into<String>) -> Self {
        WeightCatalog {
            version: version.into(),
            entries: BTreeMap::new(),
        }
    }

    /// The `version` attribute of the root element.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub(crate) fn set_version(&mut self, version: String) {
        self.version = version;
    }

    /// Records an entry under its weight id. A later declaration of an id
    /// already present replaces the earlier one.
    pub(crate) fn insert(&mut self, entry: WeightEntry) {
        self.entries.insert(entry.def.id.clone(), entry);
    }

    pub fn get(&self, id: &str) -> Option<&WeightEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weight ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WeightEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }
}
