//! Schema index: the registry of document types known to the content model.
//!
//! Loaded from a JSON manifest listing `(name, title)` pairs in declaration
//! order. The internal name is the stable identifier used in documents' type
//! tags; the title is operator-facing and NOT guaranteed unique. Lookups by
//! title therefore return every match, and callers take the first-declared
//! entry as the tie-break.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::config::Config;

/// A registered document type: stable internal name plus display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTypeEntry {
    pub name: String,
    pub title: String,
}

/// Read-only index over the registered document types.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    entries: Vec<SchemaTypeEntry>,
    names: HashSet<String>,
}

impl SchemaIndex {
    /// Build an index from entries in declaration order.
    pub fn new(entries: Vec<SchemaTypeEntry>) -> Self {
        let names = entries.iter().map(|e| e.name.clone()).collect();
        Self { entries, names }
    }

    /// Load the index from a JSON manifest file.
    ///
    /// The manifest is an array of `{"name": ..., "title": ...}` objects;
    /// array order is declaration order.
    pub fn from_manifest(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema manifest: {}", path.display()))?;

        let entries: Vec<SchemaTypeEntry> =
            serde_json::from_str(&content).with_context(|| "Failed to parse schema manifest")?;

        if entries.is_empty() {
            bail!("Schema manifest lists no document types");
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.name.is_empty() {
                bail!("Schema manifest contains an entry with an empty name");
            }
            if !seen.insert(entry.name.as_str()) {
                bail!("Schema manifest declares type '{}' twice", entry.name);
            }
        }

        Ok(Self::new(entries))
    }

    /// All entries in declaration order.
    pub fn entries(&self) -> &[SchemaTypeEntry] {
        &self.entries
    }

    /// True if `name` is a registered type name.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// All entries whose title equals `title`, in declaration order.
    ///
    /// Titles are not unique; callers that need a single entry apply the
    /// first-declared tie-break via [`resolve_title`](Self::resolve_title).
    pub fn entries_by_title(&self, title: &str) -> Vec<&SchemaTypeEntry> {
        self.entries.iter().filter(|e| e.title == title).collect()
    }

    /// The first-declared entry whose title equals `title`.
    pub fn resolve_title(&self, title: &str) -> Option<&SchemaTypeEntry> {
        self.entries.iter().find(|e| e.title == title)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// CLI entry point — prints the registered document types.
pub fn run_types(config: &Config) -> Result<()> {
    let index = SchemaIndex::from_manifest(&config.schema.manifest)?;

    println!("{:<24} TITLE", "NAME");
    for entry in index.entries() {
        println!("{:<24} {}", entry.name, entry.title);
    }

    Ok(())
}
