//! JsonLinesSink - appends one JSON object per event to a file

use contracts::{ContractError, OutputSink, ProtocolEvent};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for JsonLinesSink
#[derive(Debug, Clone)]
pub struct JsonLinesSinkConfig {
    /// Output file, created (with parent directories) if missing
    pub path: PathBuf,
    /// Append to an existing file instead of truncating it
    pub append: bool,
}

impl JsonLinesSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./events.jsonl"));
        let append = params.get("append").is_some_and(|v| v == "true");

        Self { path, append }
    }
}

/// Sink writing events as JSON lines
pub struct JsonLinesSink {
    name: String,
    config: JsonLinesSinkConfig,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    pub fn new(name: impl Into<String>, config: JsonLinesSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(config.append)
            .truncate(!config.append)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            writer: BufWriter::new(file),
        })
    }

    /// Create from params map (for the builder)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, JsonLinesSinkConfig::from_params(params))
    }

    pub fn path(&self) -> &PathBuf {
        &self.config.path
    }

    fn write_line(&mut self, event: &ProtocolEvent<'_>) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, event)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")
    }
}

impl OutputSink for JsonLinesSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "jsonl_sink_deliver",
        skip(self, event),
        fields(sink = %self.name, start_sample = event.start_sample)
    )]
    fn deliver(&mut self, event: &ProtocolEvent<'_>) -> Result<(), ContractError> {
        self.write_line(event).map_err(|e| {
            error!(sink = %self.name, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    #[instrument(name = "jsonl_sink_flush", skip(self))]
    fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        debug!(sink = %self.name, path = %self.config.path.display(), "Flushed");
        Ok(())
    }
}
