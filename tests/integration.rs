use std::collections::HashMap;
use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use axum::extract::{Path as AxumPath, Query};
use axum::routing::{get, post};
use axum::{Json, Router};

fn ddup_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("ddup");
    path
}

/// Start a mock content store + duplication engine on an ephemeral port.
///
/// `GET /query/{dataset}` answers canned results keyed off the query text;
/// `POST /duplicate` echoes back how many documents it received.
fn spawn_mock_store() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            listener.set_nonblocking(true).unwrap();
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();

            let app = Router::new()
                .route("/query/{dataset}", get(handle_query))
                .route("/duplicate", post(handle_duplicate));

            axum::serve(listener, app).await.unwrap();
        });
    });

    port
}

async fn handle_query(
    AxumPath(_dataset): AxumPath<String>,
    Query(params): Query<HashMap<String, String>>,
) -> axum::response::Response {
    use axum::response::IntoResponse;

    let query = params.get("query").cloned().unwrap_or_default();

    if query.contains("syntax error") {
        return (
            axum::http::StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "invalid query"})),
        )
            .into_response();
    }

    if query.contains("single-object") {
        // A query that resolves to one object, not an array.
        return Json(serde_json::json!({
            "result": {"_id": "a1", "_type": "article"}
        }))
        .into_response();
    }

    if query.contains("article") {
        return Json(serde_json::json!({
            "result": [
                {"_id": "a1", "_type": "article", "title": "First"},
                {"_id": "drafts.a1", "_type": "article", "title": "First (draft)"},
                {"_id": "x1", "_type": "legacyType", "title": "Retired"},
                {"_id": "a2", "_type": "article", "title": "Second"}
            ]
        }))
        .into_response();
    }

    Json(serde_json::json!({"result": []})).into_response()
}

async fn handle_duplicate(Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
    let count = body["documents"].as_array().map(|a| a.len()).unwrap_or(0);
    Json(serde_json::json!({"accepted": count, "status": "queued"}))
}

fn setup_test_env(store_port: u16) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let manifest_path = root.join("schema.json");
    fs::write(
        &manifest_path,
        r#"[
            {"name": "article", "title": "Article"},
            {"name": "page", "title": "Page"},
            {"name": "article_v2", "title": "Article"}
        ]"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[store]
base_url = "http://127.0.0.1:{port}"
dataset = "production"
max_retries = 0

[schema]
manifest = "{manifest}"

[duplication]
engine_url = "http://127.0.0.1:{port}"
target_dataset = "staging"
"#,
        port = store_port,
        manifest = manifest_path.display(),
    );

    let config_path = root.join("ddup.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_ddup(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = ddup_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env("DDUP_TOKEN", "test-token")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run ddup binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_types_lists_schema_entries() {
    let port = spawn_mock_store();
    let (_tmp, config_path) = setup_test_env(port);

    let (stdout, stderr, ok) = run_ddup(&config_path, &["types"]);
    assert!(ok, "types failed: {}", stderr);
    assert!(stdout.contains("article"));
    assert!(stdout.contains("Article"));
    assert!(stdout.contains("page"));
    assert!(stdout.contains("article_v2"));
}

#[test]
fn test_select_query_filters_drafts_and_unregistered() {
    let port = spawn_mock_store();
    let (_tmp, config_path) = setup_test_env(port);

    let (stdout, stderr, ok) = run_ddup(
        &config_path,
        &["select", "--query", r#"*[_type == "article"]"#],
    );
    assert!(ok, "select failed: {}", stderr);
    assert!(stdout.contains("2 document(s) selected"));
    assert!(stdout.contains("a1"));
    assert!(stdout.contains("a2"));
    assert!(!stdout.contains("drafts.a1"));
    assert!(!stdout.contains("x1"));
}

#[test]
fn test_select_by_type_title() {
    let port = spawn_mock_store();
    let (_tmp, config_path) = setup_test_env(port);

    // "Article" is ambiguous (article and article_v2); the first-declared
    // entry wins, so the mock sees `*[_type == "article"]`.
    let (stdout, stderr, ok) = run_ddup(&config_path, &["select", "--type", "Article"]);
    assert!(ok, "select failed: {}", stderr);
    assert!(stdout.contains("2 document(s) selected"));
}

#[test]
fn test_select_non_array_result_is_empty() {
    let port = spawn_mock_store();
    let (_tmp, config_path) = setup_test_env(port);

    let (stdout, _stderr, ok) = run_ddup(&config_path, &["select", "--query", "single-object"]);
    assert!(ok);
    assert!(stdout.contains("No documents registered to the schema match this query."));
}

#[test]
fn test_select_zero_matches() {
    let port = spawn_mock_store();
    let (_tmp, config_path) = setup_test_env(port);

    let (stdout, _stderr, ok) = run_ddup(
        &config_path,
        &["select", "--query", r#"*[_type == "page"]"#],
    );
    assert!(ok);
    assert!(stdout.contains("No documents registered to the schema match this query."));
}

#[test]
fn test_select_store_error_is_surfaced() {
    let port = spawn_mock_store();
    let (_tmp, config_path) = setup_test_env(port);

    let (_stdout, stderr, ok) = run_ddup(&config_path, &["select", "--query", "syntax error"]);
    assert!(!ok);
    assert!(stderr.contains("Error:"));
}

#[test]
fn test_select_unknown_type_title_fails() {
    let port = spawn_mock_store();
    let (_tmp, config_path) = setup_test_env(port);

    let (_stdout, stderr, ok) = run_ddup(&config_path, &["select", "--type", "Nonexistent"]);
    assert!(!ok);
    assert!(stderr.contains("No schema type titled"));
}

#[test]
fn test_duplicate_forwards_working_set() {
    let port = spawn_mock_store();
    let (_tmp, config_path) = setup_test_env(port);

    let (stdout, stderr, ok) = run_ddup(&config_path, &["duplicate", "--type", "Article"]);
    assert!(ok, "duplicate failed: {}", stderr);
    assert!(stdout.contains("Forwarded 2 document(s)"));
    assert!(stdout.contains("\"accepted\": 2"));
}

#[test]
fn test_duplicate_empty_selection_forwards_nothing() {
    let port = spawn_mock_store();
    let (_tmp, config_path) = setup_test_env(port);

    let (stdout, _stderr, ok) = run_ddup(
        &config_path,
        &["duplicate", "--query", r#"*[_type == "page"]"#],
    );
    assert!(ok);
    assert!(stdout.contains("Nothing forwarded"));
}

// ============ Session server ============

#[test]
fn test_session_server_flow() {
    let store_port = spawn_mock_store();
    let (_tmp, config_path) = setup_test_env(store_port);

    // Append a server section with its own ephemeral port.
    let server_port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut config_content = fs::read_to_string(&config_path).unwrap();
    config_content.push_str(&format!(
        "\n[server]\nbind = \"127.0.0.1:{}\"\n",
        server_port
    ));
    fs::write(&config_path, config_content).unwrap();

    let mut child = Command::new(ddup_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("serve")
        .env("DDUP_TOKEN", "test-token")
        .spawn()
        .unwrap();

    let base = format!("http://127.0.0.1:{}", server_port);
    let client = reqwest::blocking::Client::new();

    // Wait for the server to come up.
    let mut healthy = false;
    for _ in 0..50 {
        if client.get(format!("{}/health", base)).send().is_ok() {
            healthy = true;
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    assert!(healthy, "server did not start");

    // Fresh session: idle, nothing ever submitted.
    let view: serde_json::Value = client
        .get(format!("{}/session/view", base))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(view["state"], "idle");

    // Submitting with an empty input is rejected.
    let resp = client
        .post(format!("{}/session/submit", base))
        .send()
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Compose and submit a free-form query.
    client
        .post(format!("{}/session/input", base))
        .json(&serde_json::json!({"value": "*[_type == \"article\"]"}))
        .send()
        .unwrap();
    let view: serde_json::Value = client
        .post(format!("{}/session/submit", base))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(view["state"], "populated");
    assert_eq!(view["count"], 2);

    // Switch to type-select: the free-form text is preserved but unused,
    // and the new mode's input starts empty.
    let view: serde_json::Value = client
        .post(format!("{}/session/mode", base))
        .json(&serde_json::json!({"mode": "type-select"}))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(view["mode"], "type-select");
    let resp = client
        .post(format!("{}/session/submit", base))
        .send()
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Forward the populated working set to the engine.
    let receipt: serde_json::Value = client
        .post(format!("{}/session/duplicate", base))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(receipt["forwarded"], 2);
    assert_eq!(receipt["receipt"]["accepted"], 2);

    child.kill().unwrap();
    child.wait().unwrap();
}
