//! Sink implementations
//!
//! Contains LogSink, FileSink, NetworkSink and MemorySink, plus the
//! `AnySink` wrapper selected from a `SinkConfig`.

mod file;
mod log;
mod memory;
mod network;

use bytes::Bytes;
use contracts::{ContractError, EventSink, SinkConfig, SinkType};
use tracing::info;

use crate::DispatcherError;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::memory::MemorySink;
pub use self::network::{NetworkSink, NetworkSinkConfig, DEFAULT_MAX_PACKET_SIZE};

/// One of the built-in sinks
pub enum AnySink {
    Log(LogSink),
    File(FileSink),
    Network(NetworkSink),
    Memory(MemorySink),
}

impl AnySink {
    pub fn sink_type(&self) -> SinkType {
        match self {
            AnySink::Log(_) => SinkType::Log,
            AnySink::File(_) => SinkType::File,
            AnySink::Network(_) => SinkType::Network,
            AnySink::Memory(_) => SinkType::Memory,
        }
    }
}

impl EventSink for AnySink {
    fn name(&self) -> &str {
        match self {
            AnySink::Log(sink) => sink.name(),
            AnySink::File(sink) => sink.name(),
            AnySink::Network(sink) => sink.name(),
            AnySink::Memory(sink) => sink.name(),
        }
    }

    async fn send(&self, payload: Bytes) -> Result<(), ContractError> {
        match self {
            AnySink::Log(sink) => sink.send(payload).await,
            AnySink::File(sink) => sink.send(payload).await,
            AnySink::Network(sink) => sink.send(payload).await,
            AnySink::Memory(sink) => sink.send(payload).await,
        }
    }

    async fn close(&self) -> Result<(), ContractError> {
        match self {
            AnySink::Log(sink) => sink.close().await,
            AnySink::File(sink) => sink.close().await,
            AnySink::Network(sink) => sink.close().await,
            AnySink::Memory(sink) => sink.close().await,
        }
    }
}

/// Build the sink described by `config`
pub async fn create_sink(config: &SinkConfig) -> Result<AnySink, DispatcherError> {
    let name = config.name.as_str();
    let creation = |e: ContractError| DispatcherError::sink_creation(name, e.to_string());

    let sink = match config.sink_type {
        SinkType::Log => AnySink::Log(LogSink::new(name)),
        SinkType::File => AnySink::File(
            FileSink::from_params(name, &config.params)
                .await
                .map_err(creation)?,
        ),
        SinkType::Network => AnySink::Network(
            NetworkSink::from_params(name, &config.params)
                .await
                .map_err(creation)?,
        ),
        SinkType::Memory => {
            AnySink::Memory(MemorySink::from_params(name, &config.params).map_err(creation)?)
        }
    };

    info!(
        sink = %name,
        sink_type = config.sink_type.as_str(),
        "Sink created"
    );
    Ok(sink)
}
