//! Document filter: raw query results to a validated working set.
//!
//! Two independent passes, both required: keep only documents whose type tag
//! is registered in the schema index, then drop documents whose identifier
//! carries the draft marker. Survivors keep their relative order.

use crate::models::{Document, WorkingSet};
use crate::schema::SchemaIndex;

/// Filter a raw result sequence into a working set.
pub fn filter_documents(raw: Vec<Document>, schema: &SchemaIndex) -> WorkingSet {
    let docs = raw
        .into_iter()
        .filter(|doc| schema.contains(&doc.type_tag))
        .filter(|doc| !doc.is_draft())
        .collect();

    WorkingSet::new(docs)
}
