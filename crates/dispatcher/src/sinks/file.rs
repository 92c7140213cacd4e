//! FileSink - appends payloads to a file, one per line

use std::collections::HashMap;
use std::path::PathBuf;

use bytes::Bytes;
use contracts::{ContractError, EventSink};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone, PartialEq)]
pub struct FileSinkConfig {
    /// Output file, opened in append mode
    pub path: PathBuf,
    /// Larger payloads are skipped as oversized
    pub max_payload_bytes: Option<usize>,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./events.jsonl"),
            max_payload_bytes: None,
        }
    }
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        let mut config = Self::default();
        if let Some(path) = params.get("path") {
            config.path = PathBuf::from(path);
        }
        if let Some(raw) = params.get("max_payload_bytes") {
            let limit = raw.parse().map_err(|e| {
                ContractError::config_validation(
                    "sink.params.max_payload_bytes",
                    format!("invalid limit '{raw}': {e}"),
                )
            })?;
            config.max_payload_bytes = Some(limit);
        }
        Ok(config)
    }
}

/// Sink that appends every payload as a line of `path`
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl FileSink {
    /// Create a new FileSink, creating parent directories as needed
    #[instrument(name = "file_sink_new", skip(name, config), fields(path = %config.path.display()))]
    pub async fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .await?;

        Ok(Self {
            name: name.into(),
            config,
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    /// Create from params map (for factory)
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = FileSinkConfig::from_params(params)?;
        Self::new(name.clone(), config)
            .await
            .map_err(|e| ContractError::sink_connection(name, e.to_string()))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.config.path
    }

    async fn append_line(&self, payload: &[u8]) -> std::io::Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| std::io::Error::other("sink closed"))?;
        writer.write_all(payload).await?;
        writer.write_all(b"\n").await
    }
}

impl EventSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_send",
        skip(self, payload),
        fields(sink = %self.name, bytes = payload.len())
    )]
    async fn send(&self, payload: Bytes) -> Result<(), ContractError> {
        if let Some(limit) = self.config.max_payload_bytes {
            if payload.len() > limit {
                return Err(ContractError::oversized(&self.name, payload.len(), limit));
            }
        }
        self.append_line(&payload).await.map_err(|e| {
            error!(sink = %self.name, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&self) -> Result<(), ContractError> {
        let Some(mut writer) = self.writer.lock().await.take() else {
            return Ok(());
        };
        writer
            .flush()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        debug!(sink = %self.name, path = %self.config.path.display(), "FileSink closed");
        Ok(())
    }
}
