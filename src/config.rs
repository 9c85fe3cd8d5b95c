//! Runtime configuration from the environment (and an optional `.env`).

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REGISTRY: &str = "registry-1.docker.io";
const DEFAULT_AUTH_URL: &str = "https://auth.docker.io/token";
const DEFAULT_AUTH_SERVICE: &str = "registry.docker.io";
const DEFAULT_MODEL_DIR: &str = "ai";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Registry host, or a full base URL (`http://localhost:5000`).
    pub registry: String,
    /// Bearer-token endpoint; `None` for registries without auth.
    pub auth_url: Option<String>,
    pub auth_service: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Directory holding the model card markdown files.
    pub model_dir: PathBuf,
    pub user_agent: String,
    pub request_timeout: Duration,
    /// First range request size when reading a GGUF header.
    pub header_probe_bytes: u64,
    /// Give up on a GGUF header larger than this.
    pub header_max_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY.to_string(),
            auth_url: Some(DEFAULT_AUTH_URL.to_string()),
            auth_service: DEFAULT_AUTH_SERVICE.to_string(),
            username: None,
            password: None,
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            user_agent: format!("model-cards/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: Duration::from_secs(60),
            header_probe_bytes: 4 * 1024 * 1024,
            header_max_bytes: 128 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load `.env` if present, then read `MODEL_CARDS_*` variables.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("[CONFIG] Loaded {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or blank keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let auth_url = match lookup("MODEL_CARDS_AUTH_URL") {
            // explicitly blank disables token exchange
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().to_string()),
            None => defaults.auth_url,
        };

        Self {
            registry: get("MODEL_CARDS_REGISTRY").unwrap_or(defaults.registry),
            auth_url,
            auth_service: get("MODEL_CARDS_AUTH_SERVICE").unwrap_or(defaults.auth_service),
            username: get("MODEL_CARDS_USERNAME"),
            password: get("MODEL_CARDS_PASSWORD"),
            model_dir: get("MODEL_CARDS_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            user_agent: get("MODEL_CARDS_USER_AGENT").unwrap_or(defaults.user_agent),
            request_timeout: get("MODEL_CARDS_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            header_probe_bytes: defaults.header_probe_bytes,
            header_max_bytes: defaults.header_max_bytes,
        }
    }

    /// Registry base URL with scheme.
    pub fn registry_url(&self) -> String {
        let registry = self.registry.trim_end_matches('/');
        if registry.starts_with("http://") || registry.starts_with("https://") {
            registry.to_string()
        } else {
            format!("https://{}", registry)
        }
    }
}
