use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub schema: SchemaConfig,
    #[serde(default)]
    pub duplication: DuplicationConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Base URL of the content store API, without a trailing slash.
    pub base_url: String,
    /// Dataset/project context queries execute against.
    pub dataset: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_token_env() -> String {
    "DDUP_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchemaConfig {
    /// Path to the JSON manifest of document-type definitions.
    pub manifest: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DuplicationConfig {
    /// Base URL of the duplication engine. Required for `ddup duplicate`
    /// and the `/session/duplicate` endpoint.
    pub engine_url: Option<String>,
    /// Dataset the engine duplicates into.
    pub target_dataset: Option<String>,
    #[serde(default)]
    pub follow_references: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionConfig {
    /// Query submitted automatically once when a session starts with no
    /// working set.
    #[serde(default)]
    pub initial_query: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7878".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate store
    if config.store.base_url.is_empty() {
        anyhow::bail!("store.base_url must not be empty");
    }
    while config.store.base_url.ends_with('/') {
        config.store.base_url.pop();
    }
    if config.store.dataset.is_empty() {
        anyhow::bail!("store.dataset must not be empty");
    }
    if config.store.timeout_secs == 0 {
        anyhow::bail!("store.timeout_secs must be > 0");
    }

    // Validate duplication
    if let Some(ref url) = config.duplication.engine_url {
        if url.is_empty() {
            anyhow::bail!("duplication.engine_url must not be empty when set");
        }
    }

    Ok(config)
}
