//! Query executor adapter: selection input to a validated working set.
//!
//! Free-form queries pass verbatim to the store; type picks are resolved
//! against the schema index first and rewritten into the equivalent query.
//! The store's answer must be array-shaped — anything else coerces to the
//! empty sequence rather than erroring. Transport and store failures are
//! captured into [`ResolveOutcome::Failed`] so the caller decides whether
//! to surface them; a failed resolve never destroys a previously valid
//! working set.

use anyhow::Result;
use async_trait::async_trait;

use crate::filter::filter_documents;
use crate::models::{Document, QueryInput, WorkingSet};
use crate::schema::SchemaIndex;

/// Executes a query-language string against the content store.
///
/// The production implementation is [`crate::store::StoreClient`]; tests
/// substitute canned executors.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &str) -> Result<serde_json::Value>;
}

/// Outcome of one resolve invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveOutcome {
    /// The query executed; the filtered working set (possibly empty).
    Resolved(WorkingSet),
    /// The query could not be executed. Carries the error text for the
    /// host surface to show or discard.
    Failed(String),
}

/// Build the query string for an input.
///
/// TypeSelect inputs resolve the display title to an internal type name via
/// the schema index (first match in declaration order) and select every
/// document carrying that type tag.
pub fn build_query(input: &QueryInput, schema: &SchemaIndex) -> Result<String> {
    match input {
        QueryInput::FreeQuery(query) => Ok(query.clone()),
        QueryInput::TypeSelect(title) => match schema.resolve_title(title) {
            Some(entry) => Ok(format!("*[_type == \"{}\"]", entry.name)),
            None => anyhow::bail!("No schema type titled \"{}\"", title),
        },
    }
}

/// Resolve an input into a working set: build the query, execute it,
/// coerce the result shape, and filter against the schema index.
pub async fn resolve(
    input: &QueryInput,
    schema: &SchemaIndex,
    executor: &dyn QueryExecutor,
) -> ResolveOutcome {
    let query = match build_query(input, schema) {
        Ok(q) => q,
        Err(err) => return ResolveOutcome::Failed(format!("{:#}", err)),
    };

    match executor.execute(&query).await {
        Ok(value) => {
            let raw = coerce_documents(value);
            ResolveOutcome::Resolved(filter_documents(raw, schema))
        }
        Err(err) => {
            eprintln!("Query execution failed: {:#}", err);
            ResolveOutcome::Failed(format!("{:#}", err))
        }
    }
}

/// Coerce a raw query result into a document sequence.
///
/// A non-array result is treated as zero matches, not an error. Array
/// elements that do not carry `_id` and `_type` are dropped the same way.
pub fn coerce_documents(value: serde_json::Value) -> Vec<Document> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<Document>(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}
