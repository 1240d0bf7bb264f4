//! Configuration types.

use std::path::PathBuf;

use crate::error::{ConfigError, TaxonomyError};
use crate::triage::aggregator::DEFAULT_WINDOW_SIZE;
use crate::triage::taxonomy::KeywordTaxonomy;

/// Engine and server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// HTTP bind address.
    pub bind_addr: String,
    /// HTTP port.
    pub port: u16,
    /// Number of recent patient turns aggregated.
    pub window_size: usize,
    /// Optional JSON taxonomy replacing the built-in one.
    pub taxonomy_path: Option<PathBuf>,
    /// Allowed CORS origins. Empty means permissive.
    pub cors_origins: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            window_size: DEFAULT_WINDOW_SIZE,
            taxonomy_path: None,
            cors_origins: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Read configuration from `TRIAGE_*` environment variables.
    pub fn from_env() -> crate::error::Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok())?)
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unset keys fall back to defaults; set but unparseable keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = lookup("TRIAGE_BIND_ADDR")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.bind_addr);

        let port = match lookup("TRIAGE_PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "TRIAGE_PORT".into(),
                message: format!("{raw:?}: {e}"),
            })?,
            None => defaults.port,
        };

        let window_size = match lookup("TRIAGE_WINDOW_SIZE") {
            Some(raw) => {
                let size: usize = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
                    key: "TRIAGE_WINDOW_SIZE".into(),
                    message: format!("{raw:?}: {e}"),
                })?;
                if size == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "TRIAGE_WINDOW_SIZE".into(),
                        message: "must be at least 1".into(),
                    });
                }
                size
            }
            None => defaults.window_size,
        };

        let taxonomy_path = lookup("TRIAGE_TAXONOMY_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let cors_origins: Vec<String> = lookup("TRIAGE_CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            bind_addr,
            port,
            window_size,
            taxonomy_path,
            cors_origins,
        })
    }

    /// `host:port` string for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Build the taxonomy this configuration points at.
    pub fn load_taxonomy(&self) -> Result<KeywordTaxonomy, TaxonomyError> {
        match &self.taxonomy_path {
            Some(path) => KeywordTaxonomy::load(path),
            None => KeywordTaxonomy::builtin(),
        }
    }
}
