//! # Application Configuration
//!
//! Settings are resolved in layers, highest precedence first:
//!
//! 1. CLI flags
//! 2. TOML file given with `--config`
//! 3. Environment (`MEDGRAPH_SOURCE`, `MEDGRAPH_CORS_ORIGINS`)
//! 4. Built-in defaults
//!
//! ```toml
//! source = "catalog.json"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! cors_origins = "http://localhost:3000"
//!
//! [paths]
//! max_depth = 3
//! max_expansions = 100000
//! timeout_ms = 2000
//! ```

use medgraph_core::{
    MedGraphError, PathLimits,
    primitives::{DEFAULT_MAX_EXPANSIONS, DEFAULT_PATH_DEPTH, MAX_PATH_DEPTH},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the catalog file.
pub const SOURCE_ENV: &str = "MEDGRAPH_SOURCE";

/// Environment variable listing allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "MEDGRAPH_CORS_ORIGINS";

/// Default wall-clock budget for one path search.
pub const DEFAULT_PATH_TIMEOUT_MS: u64 = 2_000;

// =============================================================================
// RESOLVED CONFIGURATION
// =============================================================================

/// Fully resolved application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog file the graph is built from; `None` serves an empty graph.
    pub source: Option<PathBuf>,
    pub server: ServerConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Comma-separated origins, `*` for any; `None` allows localhost only.
    pub cors_origins: Option<String>,
}

/// Path search bounds applied to queries that do not override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub max_depth: usize,
    pub max_expansions: usize,
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_PATH_DEPTH,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            timeout_ms: DEFAULT_PATH_TIMEOUT_MS,
        }
    }
}

impl PathsConfig {
    /// Limits for a search of `depth` edges, with an optional per-query timeout.
    #[must_use]
    pub fn limits(&self, depth: usize, timeout_ms: Option<u64>) -> PathLimits {
        PathLimits::depth(depth)
            .with_max_expansions(self.max_expansions)
            .with_timeout(Duration::from_millis(timeout_ms.unwrap_or(self.timeout_ms)))
    }
}

// =============================================================================
// FILE LAYER
// =============================================================================

/// Partial settings as read from a TOML file. Absent keys leave lower
/// layers untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    source: Option<PathBuf>,
    #[serde(default)]
    server: FileServer,
    #[serde(default)]
    paths: FilePaths,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileServer {
    host: Option<String>,
    port: Option<u16>,
    cors_origins: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilePaths {
    max_depth: Option<usize>,
    max_expansions: Option<usize>,
    timeout_ms: Option<u64>,
}

// =============================================================================
// LOADING
// =============================================================================

impl AppConfig {
    /// Resolve defaults, the process environment and an optional file.
    pub fn load(config_file: Option<&Path>) -> Result<Self, MedGraphError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());

        if let Some(path) = config_file {
            let text = std::fs::read_to_string(path).map_err(|e| {
                MedGraphError::Io(format!("Cannot read config '{}': {}", path.display(), e))
            })?;
            config.apply_toml(&text)?;
            tracing::debug!(path = %path.display(), "loaded configuration file");
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply environment values looked up through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(source) = lookup(SOURCE_ENV).filter(|s| !s.trim().is_empty()) {
            self.source = Some(PathBuf::from(source));
        }
        if let Some(origins) = lookup(CORS_ORIGINS_ENV) {
            self.server.cors_origins = Some(origins);
        }
    }

    /// Overlay the keys present in a TOML document.
    pub fn apply_toml(&mut self, text: &str) -> Result<(), MedGraphError> {
        let file: FileConfig =
            toml::from_str(text).map_err(|e| MedGraphError::Source(format!("Config: {}", e)))?;

        if let Some(source) = file.source {
            self.source = Some(source);
        }
        if let Some(host) = file.server.host {
            self.server.host = host;
        }
        if let Some(port) = file.server.port {
            self.server.port = port;
        }
        if let Some(origins) = file.server.cors_origins {
            self.server.cors_origins = Some(origins);
        }
        if let Some(depth) = file.paths.max_depth {
            self.paths.max_depth = depth;
        }
        if let Some(max) = file.paths.max_expansions {
            self.paths.max_expansions = max;
        }
        if let Some(timeout) = file.paths.timeout_ms {
            self.paths.timeout_ms = timeout;
        }
        Ok(())
    }

    /// Apply CLI overrides.
    #[must_use]
    pub fn with_cli(mut self, source: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(source) = source {
            self.source = Some(source);
        }
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }

    /// Reject settings no query could honor.
    pub fn validate(&self) -> Result<(), MedGraphError> {
        if self.paths.max_depth > MAX_PATH_DEPTH {
            return Err(MedGraphError::InvalidQuery(format!(
                "paths.max_depth {} exceeds maximum {}",
                self.paths.max_depth, MAX_PATH_DEPTH
            )));
        }
        if self.paths.max_expansions == 0 {
            return Err(MedGraphError::InvalidQuery(
                "paths.max_expansions must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================
