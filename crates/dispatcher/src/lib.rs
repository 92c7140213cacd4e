//! # Dispatcher
//!
//! 负载分发模块。
//!
//! 负责：
//! - 按 epoch 查询负载曲线，生成事件批次
//! - 有界并发地将事件发送到 sink
//! - 每个 epoch 等待所有发送完成，再对齐到 epoch 边界

pub mod codec;
pub mod dispatch_loop;
pub mod error;
pub mod metrics;
pub mod pacer;
pub mod report;
pub mod sinks;

pub use contracts::{EventSink, QueryEvent, SendStatus};
pub use dispatch_loop::{DispatchConfig, DispatchLoop, DispatchLoopBuilder};
pub use error::DispatcherError;
pub use metrics::{InFlightGuard, InFlightMetrics};
pub use pacer::{Pacer, TokioPacer};
pub use report::{EpochReport, RunReport, SendTally};
pub use sinks::{
    create_sink, AnySink, FileSink, FileSinkConfig, LogSink, MemorySink, NetworkSink,
    NetworkSinkConfig,
};
pub use tokio_util::sync::CancellationToken;
