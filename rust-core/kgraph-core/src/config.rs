// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Knowledge graph configuration.
//!
//! Defaults: in-memory backend, unlimited search results, pretty logs.
//! A JSON file can replace any subset of the defaults; environment variables
//! are read by [`KnowledgeGraphConfig::from_env`]:
//!
//! | Variable                    | Meaning                                  |
//! |-----------------------------|------------------------------------------|
//! | `KGRAPH_BACKEND`            | `memory`, `jsonl` or `redb`              |
//! | `KGRAPH_PATH`               | file path for `jsonl` / `redb`           |
//! | `KGRAPH_SEARCH_MAX_RESULTS` | result cap for search (`0` = unlimited) |
//! | `KGRAPH_LOG_FORMAT`         | `pretty` or `json`                       |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kgraph_storage::{GraphBackend, InMemoryBackend, JsonlBackend, StorageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_BACKEND: &str = "KGRAPH_BACKEND";
pub const ENV_PATH: &str = "KGRAPH_PATH";
pub const ENV_SEARCH_MAX_RESULTS: &str = "KGRAPH_SEARCH_MAX_RESULTS";
pub const ENV_LOG_FORMAT: &str = "KGRAPH_LOG_FORMAT";

/// Errors raised while loading configuration or building its backend.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} backend requires KGRAPH_PATH to be set")]
    MissingPath(String),

    #[error("backend {0:?} needs the {1} feature")]
    FeatureDisabled(&'static str, &'static str),

    #[error("failed to open backend: {0}")]
    Backend(#[from] StorageError),
}

/// Which durable store the graph lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Process memory; lost on exit.
    #[default]
    Memory,
    /// One JSON record per line.
    Jsonl { path: PathBuf },
    /// Single-file redb database.
    Redb { path: PathBuf },
}

impl BackendConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Memory => "memory",
            BackendConfig::Jsonl { .. } => "jsonl",
            BackendConfig::Redb { .. } => "redb",
        }
    }

    /// Build the configured backend.
    pub fn open_backend(&self) -> Result<Arc<dyn GraphBackend>, ConfigError> {
        match self {
            BackendConfig::Memory => Ok(Arc::new(InMemoryBackend::new())),
            BackendConfig::Jsonl { path } => Ok(Arc::new(JsonlBackend::new(path))),
            #[cfg(feature = "redb-backend")]
            BackendConfig::Redb { path } => {
                Ok(Arc::new(kgraph_storage::RedbBackend::open(path)?))
            }
            #[cfg(not(feature = "redb-backend"))]
            BackendConfig::Redb { .. } => Err(ConfigError::FeatureDisabled("redb", "redb-backend")),
        }
    }
}

/// Search tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum nodes returned by a search; `0` means unlimited.
    pub max_results: usize,
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Top-level configuration for [`KnowledgeGraph::open`](crate::KnowledgeGraph::open).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KnowledgeGraphConfig {
    pub backend: BackendConfig,
    pub search: SearchConfig,
    pub log_format: LogFormat,
}

impl KnowledgeGraphConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults overridden by the `KGRAPH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(ENV_PATH).map(PathBuf::from);

        if let Some(kind) = lookup(ENV_BACKEND) {
            let needs_path = |kind: &str| {
                path.clone()
                    .ok_or_else(|| ConfigError::MissingPath(kind.to_string()))
            };
            self.backend = match kind.trim().to_ascii_lowercase().as_str() {
                "memory" => BackendConfig::Memory,
                "jsonl" => BackendConfig::Jsonl {
                    path: needs_path("jsonl")?,
                },
                "redb" => BackendConfig::Redb {
                    path: needs_path("redb")?,
                },
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_BACKEND,
                        value: kind,
                        reason: "expected memory, jsonl or redb".into(),
                    })
                }
            };
        } else if let Some(path) = path {
            // A bare path retargets an already file-backed config.
            match &mut self.backend {
                BackendConfig::Jsonl { path: p } | BackendConfig::Redb { path: p } => *p = path,
                BackendConfig::Memory => {}
            }
        }

        if let Some(raw) = lookup(ENV_SEARCH_MAX_RESULTS) {
            self.search.max_results =
                raw.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        key: ENV_SEARCH_MAX_RESULTS,
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?;
        }

        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            self.log_format = match raw.trim().to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_LOG_FORMAT,
                        value: raw,
                        reason: "expected pretty or json".into(),
                    })
                }
            };
        }

        Ok(self)
    }
}
