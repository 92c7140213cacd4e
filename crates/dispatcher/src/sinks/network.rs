//! NetworkSink - UDP fire-and-forget streaming

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use contracts::{ContractError, EventSink};
use tokio::net::UdpSocket;
use tracing::{debug, instrument, warn};

/// Default datagram limit, below the 65507 byte IPv4 UDP maximum
pub const DEFAULT_MAX_PACKET_SIZE: usize = 65000;

/// Configuration for NetworkSink
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSinkConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Max packet size; larger payloads are skipped
    pub max_packet_size: usize,
}

impl NetworkSinkConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }

    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        let addr_str = params.get("addr").ok_or_else(|| {
            ContractError::config_validation("sink.params.addr", "missing 'addr' parameter")
        })?;

        let addr: SocketAddr = addr_str.parse().map_err(|e| {
            ContractError::config_validation(
                "sink.params.addr",
                format!("invalid address '{addr_str}': {e}"),
            )
        })?;

        let max_packet_size = match params.get("max_packet_size") {
            Some(raw) => raw.parse().map_err(|e| {
                ContractError::config_validation(
                    "sink.params.max_packet_size",
                    format!("invalid size '{raw}': {e}"),
                )
            })?,
            None => DEFAULT_MAX_PACKET_SIZE,
        };

        Ok(Self {
            addr,
            max_packet_size,
        })
    }
}

/// Sink that sends each payload as one UDP datagram
pub struct NetworkSink {
    name: String,
    config: NetworkSinkConfig,
    socket: UdpSocket,
    closed: AtomicBool,
}

impl NetworkSink {
    /// Create a new NetworkSink
    #[instrument(name = "network_sink_new", skip(name, config), fields(target = %config.addr))]
    pub async fn new(name: impl Into<String>, config: NetworkSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        // Bind to any available port of the target's address family
        let bind_addr = if config.addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(&config.addr).await?;

        debug!(
            sink = %name,
            target = %config.addr,
            "NetworkSink connected"
        );

        Ok(Self {
            name,
            config,
            socket,
            closed: AtomicBool::new(false),
        })
    }

    /// Create from params (for factory)
    #[instrument(name = "network_sink_from_params", skip(name, params))]
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = NetworkSinkConfig::from_params(params)?;

        Self::new(name.clone(), config)
            .await
            .map_err(|e| ContractError::sink_connection(name, e.to_string()))
    }

    pub fn config(&self) -> &NetworkSinkConfig {
        &self.config
    }

    fn check_size(&self, payload: &[u8]) -> Result<(), ContractError> {
        if payload.len() > self.config.max_packet_size {
            warn!(
                sink = %self.name,
                size = payload.len(),
                max = self.config.max_packet_size,
                "Packet too large, skipping"
            );
            return Err(ContractError::oversized(
                &self.name,
                payload.len(),
                self.config.max_packet_size,
            ));
        }
        Ok(())
    }
}

impl EventSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "network_sink_send",
        skip(self, payload),
        fields(sink = %self.name, bytes = payload.len())
    )]
    async fn send(&self, payload: Bytes) -> Result<(), ContractError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ContractError::sink_write(&self.name, "socket closed"));
        }
        self.check_size(&payload)?;

        let sent = self
            .socket
            .send(&payload)
            .await
            .map_err(|e| ContractError::sink_write(&self.name, format!("udp send failed: {e}")))?;
        debug!(sink = %self.name, bytes = sent, "Sent");
        Ok(())
    }

    #[instrument(name = "network_sink_close", skip(self))]
    async fn close(&self) -> Result<(), ContractError> {
        self.closed.store(true, Ordering::Release);
        debug!(sink = %self.name, "NetworkSink closed");
        Ok(())
    }
}
