//! Configuration loading for partition index runtimes.
//!
//! Layered config: built-in defaults -> config file -> `PINDEX_*` env vars.

use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::StreamError;

/// Settings shared by every partition hosted in a process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Root directory holding one subdirectory per partition
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Bounded mailbox capacity per partition
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Memory budget for each tantivy writer in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Document mutations between commits. 1 commits after every write.
    #[serde(default = "default_commit_every")]
    pub commit_every: usize,

    /// Index type used when a partition does not name one
    #[serde(default = "default_index_type")]
    pub default_index_type: String,

    /// Log filter directive (e.g. "info", "pindex_stream=debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> String {
    ProjectDirs::from("", "", "pindex")
        .map(|p| p.data_local_dir().join("partitions"))
        .unwrap_or_else(|| PathBuf::from("./data/partitions"))
        .to_string_lossy()
        .to_string()
}

fn default_mailbox_capacity() -> usize {
    1000
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_commit_every() -> usize {
    1
}

fn default_index_type() -> String {
    "tantivy".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            mailbox_capacity: default_mailbox_capacity(),
            writer_memory_mb: default_writer_memory_mb(),
            commit_every: default_commit_every(),
            default_index_type: default_index_type(),
            log_level: default_log_level(),
        }
    }
}

impl StreamSettings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (optional unless a path is given)
    /// 3. Environment variables (PINDEX_*)
    pub fn load(config_path: Option<&str>) -> Result<Self, StreamError> {
        let mut builder = Config::builder()
            .set_default("data_dir", default_data_dir())
            .map_err(|e| StreamError::Config(e.to_string()))?
            .set_default("mailbox_capacity", default_mailbox_capacity() as i64)
            .map_err(|e| StreamError::Config(e.to_string()))?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)
            .map_err(|e| StreamError::Config(e.to_string()))?
            .set_default("commit_every", default_commit_every() as i64)
            .map_err(|e| StreamError::Config(e.to_string()))?
            .set_default("default_index_type", default_index_type())
            .map_err(|e| StreamError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| StreamError::Config(e.to_string()))?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // PINDEX_MAILBOX_CAPACITY, PINDEX_DATA_DIR, ...
        builder = builder.add_source(Environment::with_prefix("PINDEX").try_parsing(true));

        let settings: StreamSettings = builder
            .build()
            .map_err(|e| StreamError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| StreamError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.mailbox_capacity == 0 {
            return Err(StreamError::Config("mailbox_capacity must be > 0".to_string()));
        }
        if self.writer_memory_mb == 0 {
            return Err(StreamError::Config("writer_memory_mb must be > 0".to_string()));
        }
        if self.commit_every == 0 {
            return Err(StreamError::Config("commit_every must be > 0".to_string()));
        }
        Ok(())
    }

    /// Directory for a named partition under `data_dir`.
    pub fn partition_path(&self, partition: &str) -> PathBuf {
        PathBuf::from(&self.data_dir).join(partition)
    }
}
