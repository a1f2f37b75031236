//! Session HTTP server.
//!
//! Hosts one long-lived selection session behind a JSON API. The session is
//! mutated exclusively by event application, so concurrent submits are safe:
//! each takes its own sequence number and the reducer discards completions
//! that are older than the newest one applied.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/schema/types` | Registered document types |
//! | `GET`  | `/session/view` | Current view state and working set |
//! | `POST` | `/session/mode` | Switch the active input path |
//! | `POST` | `/session/input` | Update the active input's text |
//! | `POST` | `/session/submit` | Resolve the active input once |
//! | `POST` | `/session/duplicate` | Forward a populated working set |
//!
//! # Error Contract
//!
//! Error responses use the shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "nothing to duplicate" } }
//! ```
//!
//! A failed resolve is NOT an HTTP error: the submit response carries the
//! error text in its `error` field and the working set is left unchanged.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the API can back a
//! browser-embedded operator surface.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::duplicate::{build_request, DuplicationEngine, DuplicationOptions, HttpDuplicationEngine};
use crate::models::QueryMode;
use crate::resolve::resolve;
use crate::schema::{SchemaIndex, SchemaTypeEntry};
use crate::select::SessionView;
use crate::session::{reduce, SessionEvent, SessionState};
use crate::store::StoreClient;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    schema: Arc<SchemaIndex>,
    store: Arc<StoreClient>,
    session: Arc<Mutex<SessionState>>,
}

/// Start the session server.
///
/// Binds to `[server].bind`, loads the schema manifest, and serves until the
/// process is terminated. If `[session].initial_query` is set and no working
/// set exists yet, exactly one resolve runs before the server starts
/// accepting requests.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let schema = Arc::new(SchemaIndex::from_manifest(&config.schema.manifest)?);
    let store = Arc::new(StoreClient::from_config(&config.store));

    let mut session = SessionState::with_initial_query(config.session.initial_query.clone());

    // One automatic initial submit when the session starts pre-filled.
    if session.needs_autoload() {
        if let Some(submission) = session.begin_submit() {
            let outcome = resolve(&submission.input, &schema, store.as_ref()).await;
            session = reduce(
                session,
                SessionEvent::ResolveCompleted {
                    seq: submission.seq,
                    outcome,
                },
            );
        }
    }

    let state = AppState {
        config: Arc::new(config.clone()),
        schema,
        store,
        session: Arc::new(Mutex::new(session)),
    };

    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let app = router(state).layer(cors);

    println!("Session server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/schema/types", get(handle_types))
        .route("/session/view", get(handle_view))
        .route("/session/mode", post(handle_mode))
        .route("/session/input", post(handle_input))
        .route("/session/submit", post(handle_submit))
        .route("/session/duplicate", post(handle_duplicate))
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 error for duplication engine failures.
fn engine_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "engine_error".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /schema/types ============

#[derive(Serialize)]
struct TypesResponse {
    types: Vec<SchemaTypeEntry>,
}

async fn handle_types(State(state): State<AppState>) -> Json<TypesResponse> {
    Json(TypesResponse {
        types: state.schema.entries().to_vec(),
    })
}

// ============ Session handlers ============

async fn handle_view(State(state): State<AppState>) -> Json<SessionView> {
    let session = state.session.lock().unwrap();
    Json(SessionView::from_state(&session))
}

#[derive(Deserialize)]
struct ModeBody {
    mode: QueryMode,
}

async fn handle_mode(
    State(state): State<AppState>,
    Json(body): Json<ModeBody>,
) -> Json<SessionView> {
    let mut session = state.session.lock().unwrap();
    apply(&mut session, SessionEvent::SetMode(body.mode));
    Json(SessionView::from_state(&session))
}

#[derive(Deserialize)]
struct InputBody {
    value: String,
}

async fn handle_input(
    State(state): State<AppState>,
    Json(body): Json<InputBody>,
) -> Json<SessionView> {
    let mut session = state.session.lock().unwrap();
    apply(&mut session, SessionEvent::SetInput(body.value));
    Json(SessionView::from_state(&session))
}

/// Handler for `POST /session/submit`.
///
/// Takes a sequence number under the lock, resolves without holding it, and
/// applies the completion through the reducer. Two overlapping submits both
/// resolve; the sequence guard decides which result sticks.
async fn handle_submit(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    let submission = {
        let mut session = state.session.lock().unwrap();
        session
            .begin_submit()
            .ok_or_else(|| bad_request("active input is empty"))?
    };

    let outcome = resolve(&submission.input, &state.schema, state.store.as_ref()).await;

    let mut session = state.session.lock().unwrap();
    apply(
        &mut session,
        SessionEvent::ResolveCompleted {
            seq: submission.seq,
            outcome,
        },
    );
    Ok(Json(SessionView::from_state(&session)))
}

/// Handler for `POST /session/duplicate`.
///
/// Only a populated working set is forwarded; Idle and Empty sessions are
/// rejected before the engine is contacted.
async fn handle_duplicate(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let working_set = {
        let session = state.session.lock().unwrap();
        match session.working_set {
            Some(ref ws) if !ws.is_empty() => ws.clone(),
            _ => return Err(bad_request("nothing to duplicate: working set is empty")),
        }
    };

    let token = std::env::var(&state.config.store.token_env).map_err(|_| {
        bad_request(format!(
            "capability token required: set the {} environment variable",
            state.config.store.token_env
        ))
    })?;

    let engine = HttpDuplicationEngine::from_config(&state.config)
        .map_err(|e| bad_request(e.to_string()))?;

    let request = build_request(
        &working_set,
        token,
        DuplicationOptions::from_config(&state.config.duplication),
    );

    let receipt = engine
        .duplicate(&request)
        .await
        .map_err(|e| engine_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "forwarded": working_set.len(),
        "receipt": receipt,
    })))
}

/// Apply an event to the session slot in place.
fn apply(session: &mut SessionState, event: SessionEvent) {
    let prev = std::mem::take(session);
    *session = reduce(prev, event);
}
