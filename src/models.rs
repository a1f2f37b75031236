//! Core data models used throughout the duplicator.
//!
//! These types represent the documents, selection inputs, and working sets
//! that flow through the query resolution pipeline.

use serde::{Deserialize, Serialize};

/// Reserved identifier prefix marking an unpublished working copy.
///
/// Documents whose `_id` starts with this prefix are shadow copies of
/// published documents and are never offered as duplication sources.
pub const DRAFT_PREFIX: &str = "drafts.";

/// A document as returned by the content store.
///
/// Only the identifier and type tag are interpreted here; all other fields
/// are carried through verbatim for the duplication engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub type_tag: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// True if the identifier carries the draft marker.
    pub fn is_draft(&self) -> bool {
        self.id.starts_with(DRAFT_PREFIX)
    }
}

/// The validated, draft-free, schema-conformant sequence of documents
/// currently selected for duplication.
///
/// A working set is recomputed wholesale on each successful query
/// execution; it is never patched incrementally. Relative order follows
/// the raw result the set was filtered from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkingSet {
    docs: Vec<Document>,
}

impl WorkingSet {
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs }
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.docs.iter()
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.docs
    }
}

/// Which input path produces the next working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryMode {
    /// Free-form query string, passed verbatim to the content store.
    FreeQuery,
    /// A document type picked from the schema index by display title.
    TypeSelect,
}

impl Default for QueryMode {
    fn default() -> Self {
        QueryMode::FreeQuery
    }
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryMode::FreeQuery => write!(f, "free-query"),
            QueryMode::TypeSelect => write!(f, "type-select"),
        }
    }
}

/// A submitted selection input, tagged with the mode that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    /// An opaque query string in the store's query language.
    FreeQuery(String),
    /// A document-type display title to resolve against the schema index.
    TypeSelect(String),
}
