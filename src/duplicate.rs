//! Duplication engine boundary.
//!
//! The engine is an external collaborator: it receives the working set, a
//! capability token, and the duplication options, and owns everything from
//! there (persistence, identifier regeneration, reference rewriting). This
//! module only builds the handoff payload and forwards it.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::config::{Config, DuplicationConfig};
use crate::models::WorkingSet;
use crate::schema::SchemaIndex;
use crate::select::{input_from_flags, select_once};
use crate::store::StoreClient;

/// Options forwarded verbatim to the engine.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicationOptions {
    pub target_dataset: Option<String>,
    pub follow_references: bool,
}

impl DuplicationOptions {
    pub fn from_config(config: &DuplicationConfig) -> Self {
        Self {
            target_dataset: config.target_dataset.clone(),
            follow_references: config.follow_references,
        }
    }
}

/// The handoff payload: `{documents, token, config}` plus bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicationRequest {
    pub request_id: String,
    pub requested_at: DateTime<Utc>,
    pub documents: Vec<crate::models::Document>,
    pub token: String,
    pub config: DuplicationOptions,
}

/// Build a handoff request from a working set.
pub fn build_request(
    working_set: &WorkingSet,
    token: String,
    options: DuplicationOptions,
) -> DuplicationRequest {
    DuplicationRequest {
        request_id: uuid::Uuid::new_v4().to_string(),
        requested_at: Utc::now(),
        documents: working_set.documents().to_vec(),
        token,
        config: options,
    }
}

/// Something that performs duplication, given a handoff request.
#[async_trait]
pub trait DuplicationEngine: Send + Sync {
    async fn duplicate(&self, request: &DuplicationRequest) -> Result<serde_json::Value>;
}

/// Forwards handoffs to a remote engine over HTTP.
pub struct HttpDuplicationEngine {
    engine_url: String,
    timeout_secs: u64,
}

impl HttpDuplicationEngine {
    pub fn from_config(config: &Config) -> Result<Self> {
        let engine_url = config
            .duplication
            .engine_url
            .clone()
            .context("duplication.engine_url is not configured")?;
        Ok(Self {
            engine_url,
            timeout_secs: config.store.timeout_secs,
        })
    }
}

#[async_trait]
impl DuplicationEngine for HttpDuplicationEngine {
    async fn duplicate(&self, request: &DuplicationRequest) -> Result<serde_json::Value> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        // Single attempt: duplication is a write and is not assumed
        // idempotent on the engine side.
        let response = client
            .post(format!("{}/duplicate", self.engine_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Duplication engine error {}: {}", status, body_text);
        }

        Ok(response.json().await?)
    }
}

/// CLI entry point — select documents, then forward them to the engine.
pub async fn run_duplicate(
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

    // Only a populated working set is forwarded.
    let working_set = match state.working_set {
        Some(ref ws) if !ws.is_empty() => ws,
        _ => {
            println!("No documents registered to the schema match this query.");
            println!("Nothing forwarded to the duplication engine.");
            return Ok(());
        }
    };

    let token = std::env::var(&config.store.token_env).with_context(|| {
        format!(
            "Capability token required: set the {} environment variable",
            config.store.token_env
        )
    })?;

    let request = build_request(
        working_set,
        token,
        DuplicationOptions::from_config(&config.duplication),
    );

    let engine = HttpDuplicationEngine::from_config(config)?;
    let receipt = engine.duplicate(&request).await?;

    println!("Forwarded {} document(s) to the duplication engine", working_set.len());
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}
