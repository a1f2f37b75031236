//! Selection session: a pure reducer over explicit state.
//!
//! The session tracks which input path is active (free-form query or schema
//! type pick), the text of both inputs, and the current working set. All
//! mutation happens by applying a [`SessionEvent`] through [`reduce`], which
//! keeps ordering assumptions out of the host surface and makes overlapping
//! resolves testable.
//!
//! Overlapping resolves are serialized by a request sequence number: each
//! submission takes the next number, and a completion is applied only if its
//! number is the highest the session has observed. A slow resolve that lands
//! after a newer submission's completion is discarded instead of clobbering
//! the newer result.

use crate::models::{QueryInput, QueryMode, WorkingSet};
use crate::resolve::ResolveOutcome;

/// Session state. Owned by one session; never shared between operators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Which input path the next submit uses.
    pub mode: QueryMode,
    /// Free-form query text. Preserved, but unused, while TypeSelect is active.
    pub free_query: String,
    /// Selected type title. Preserved, but unused, while FreeQuery is active.
    pub type_title: String,
    /// `None` until a resolve has completed successfully — distinguishable
    /// from `Some` with an empty set.
    pub working_set: Option<WorkingSet>,
    /// Error text from the most recent failed resolve, if any.
    pub last_error: Option<String>,
    next_seq: u64,
    applied_seq: u64,
}

/// A submission handed to the resolve pipeline: the input snapshot plus the
/// sequence number its completion must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub seq: u64,
    pub input: QueryInput,
}

/// The three events a session reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SetMode(QueryMode),
    SetInput(String),
    ResolveCompleted { seq: u64, outcome: ResolveOutcome },
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session with a pre-filled free-form query.
    pub fn with_initial_query(initial_query: Option<String>) -> Self {
        Self {
            free_query: initial_query.unwrap_or_default(),
            ..Self::default()
        }
    }

    /// The input the active mode would submit, or `None` if it is empty.
    pub fn active_input(&self) -> Option<QueryInput> {
        match self.mode {
            QueryMode::FreeQuery if !self.free_query.is_empty() => {
                Some(QueryInput::FreeQuery(self.free_query.clone()))
            }
            QueryMode::TypeSelect if !self.type_title.is_empty() => {
                Some(QueryInput::TypeSelect(self.type_title.clone()))
            }
            _ => None,
        }
    }

    /// Take a sequence number for a new submission.
    ///
    /// Returns `None` when the active input is empty — an empty input is not
    /// submittable, mirroring a disabled submit control.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        let input = self.active_input()?;
        self.next_seq += 1;
        Some(Submission {
            seq: self.next_seq,
            input,
        })
    }

    /// True if the session should fire its one automatic initial submit:
    /// a non-empty active input with no working set yet.
    pub fn needs_autoload(&self) -> bool {
        self.working_set.is_none() && self.active_input().is_some()
    }
}

/// Apply one event to the session state.
pub fn reduce(state: SessionState, event: SessionEvent) -> SessionState {
    let mut state = state;
    match event {
        // Switching modes does not clear the inactive input; stale text is
        // preserved and simply unused until the operator switches back.
        SessionEvent::SetMode(mode) => {
            state.mode = mode;
        }
        SessionEvent::SetInput(value) => match state.mode {
            QueryMode::FreeQuery => state.free_query = value,
            QueryMode::TypeSelect => state.type_title = value,
        },
        SessionEvent::ResolveCompleted { seq, outcome } => {
            // Sequence guard: only the newest submission's completion counts.
            if seq <= state.applied_seq {
                return state;
            }
            state.applied_seq = seq;
            match outcome {
                ResolveOutcome::Resolved(working_set) => {
                    state.working_set = Some(working_set);
                    state.last_error = None;
                }
                ResolveOutcome::Failed(message) => {
                    // The prior working set survives a failed resolve.
                    state.last_error = Some(message);
                }
            }
        }
    }
    state
}
