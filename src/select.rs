//! Document selection: one-shot pipeline and view-state boundary.
//!
//! The view is a three-way state machine keyed by whether a resolve has ever
//! completed and whether the working set is empty. Idle prompts for input,
//! Empty reports zero matches, Populated is the only state that hands
//! documents onward to duplication.

use anyhow::{bail, Result};
use serde::Serialize;

use crate::config::Config;
use crate::models::{Document, QueryInput, QueryMode};
use crate::resolve::{resolve, QueryExecutor};
use crate::schema::SchemaIndex;
use crate::session::{reduce, SessionEvent, SessionState};
use crate::store::StoreClient;

/// The three presentation states of a selection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewState {
    /// Nothing has ever been submitted.
    Idle,
    /// A query resolved to zero surviving documents.
    Empty,
    /// A non-empty working set is ready for duplication.
    Populated,
}

/// Derive the view state from session state.
pub fn view_state(state: &SessionState) -> ViewState {
    match state.working_set {
        None => ViewState::Idle,
        Some(ref ws) if ws.is_empty() => ViewState::Empty,
        Some(_) => ViewState::Populated,
    }
}

/// JSON-facing snapshot of a session, served by the HTTP surface.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub state: ViewState,
    pub mode: QueryMode,
    pub count: usize,
    pub documents: Vec<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionView {
    pub fn from_state(state: &SessionState) -> Self {
        let documents = state
            .working_set
            .as_ref()
            .map(|ws| ws.documents().to_vec())
            .unwrap_or_default();
        Self {
            state: view_state(state),
            mode: state.mode,
            count: documents.len(),
            documents,
            error: state.last_error.clone(),
        }
    }
}

/// Run one submit through a fresh session: set the input, resolve, apply.
pub async fn select_once(
    input: QueryInput,
    schema: &SchemaIndex,
    executor: &dyn QueryExecutor,
) -> SessionState {
    let mut state = SessionState::new();

    let (mode, value) = match &input {
        QueryInput::FreeQuery(q) => (QueryMode::FreeQuery, q.clone()),
        QueryInput::TypeSelect(t) => (QueryMode::TypeSelect, t.clone()),
    };
    state = reduce(state, SessionEvent::SetMode(mode));
    state = reduce(state, SessionEvent::SetInput(value));

    let Some(submission) = state.begin_submit() else {
        return state;
    };
    let outcome = resolve(&submission.input, schema, executor).await;
    reduce(
        state,
        SessionEvent::ResolveCompleted {
            seq: submission.seq,
            outcome,
        },
    )
}

/// Turn `--query` / `--type` CLI flags into a selection input.
pub fn input_from_flags(query: Option<String>, type_title: Option<String>) -> Result<QueryInput> {
    match (query, type_title) {
        (Some(q), None) if !q.is_empty() => Ok(QueryInput::FreeQuery(q)),
        (None, Some(t)) if !t.is_empty() => Ok(QueryInput::TypeSelect(t)),
        (Some(_), Some(_)) => bail!("Pass either --query or --type, not both"),
        _ => bail!("Pass a non-empty --query or --type"),
    }
}

/// CLI entry point — resolve a selection and print the working set.
pub async fn run_select(
    config: &Config,
    query: Option<String>,
    type_title: Option<String>,
) -> Result<()> {
    let input = input_from_flags(query, type_title)?;
    let schema = SchemaIndex::from_manifest(&config.schema.manifest)?;
    let client = StoreClient::from_config(&config.store);

    let state = select_once(input, &schema, &client).await;

    if let Some(ref message) = state.last_error {
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }

    print_selection(&state);
    Ok(())
}

/// Print a session's view to stdout.
pub fn print_selection(state: &SessionState) {
    match state.working_set {
        None => {
            println!("Start with a query or a schema type to load documents.");
        }
        Some(ref ws) if ws.is_empty() => {
            println!("No documents registered to the schema match this query.");
        }
        Some(ref ws) => {
            println!("{} document(s) selected for duplication", ws.len());
            for (i, doc) in ws.iter().enumerate() {
                let title = doc
                    .fields
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or("(untitled)");
                println!("{:>3}. {:<32} {:<16} {}", i + 1, doc.id, doc.type_tag, title);
            }
        }
    }
}
