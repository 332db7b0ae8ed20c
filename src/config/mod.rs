/// Configuration management for the Stateway engine
///
/// Handles server binding, snapshot persistence and definition binding.
/// Every value can be overridden through `STATEWAY_*` environment variables.

use crate::workflow::registry::DefinitionBinding;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Snapshot persistence configuration
    pub storage: StorageConfig,
    /// Whether instances follow live definitions or a pinned copy
    pub definition_binding: DefinitionBinding,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Snapshot file configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Snapshot file holding all definitions and instances (default: "data.json")
    pub data_file: PathBuf,
    /// When false the store keeps everything in memory only
    pub persist: bool,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self {
            server: ServerConfig {
                host: var("STATEWAY_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_port(var("STATEWAY_PORT").as_deref()),
            },
            storage: StorageConfig {
                data_file: var("STATEWAY_DATA_FILE")
                    .unwrap_or_else(|| "data.json".to_string())
                    .into(),
                persist: parse_persist(var("STATEWAY_PERSIST").as_deref()),
            },
            definition_binding: parse_binding(var("STATEWAY_DEFINITION_BINDING").as_deref()),
        }
    }
}

const DEFAULT_PORT: u16 = 5261;

/// Port from `STATEWAY_PORT`; unparsable values fall back to the default
fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|p| p.trim().parse().ok()).unwrap_or(DEFAULT_PORT)
}

/// Persistence stays on unless explicitly switched off
fn parse_persist(raw: Option<&str>) -> bool {
    match raw {
        Some(v) => !matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "false" | "0" | "no" | "off"
        ),
        None => true,
    }
}

/// Binding from `STATEWAY_DEFINITION_BINDING`; unknown values fall back to `Live`
fn parse_binding(raw: Option<&str>) -> DefinitionBinding {
    match raw.map(str::parse::<DefinitionBinding>) {
        Some(Ok(binding)) => binding,
        Some(Err(e)) => {
            tracing::warn!("Ignoring STATEWAY_DEFINITION_BINDING: {}", e);
            DefinitionBinding::Live
        }
        None => DefinitionBinding::Live,
    }
}

impl Config {
    /// Address the HTTP listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// In-memory configuration used by tests and embedders
    pub fn ephemeral() -> Self {
        Self {
            server: ServerConfig { host: "127.0.0.1".to_string(), port: 0 },
            storage: StorageConfig { data_file: PathBuf::from("data.json"), persist: false },
            definition_binding: DefinitionBinding::Live,
        }
    }
}
