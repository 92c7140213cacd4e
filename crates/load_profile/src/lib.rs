//! # Load Profile
//!
//! 负载曲线：把运行模式与已运行时间映射为目标速率。
//!
//! 负责：
//! - 固定模式 (`LoadMode`) 的速率计算
//! - 分段调度 (`Schedule`)，例如 steady 30s → outage 30s → recovery
//! - 每个 epoch 重新求值，纯函数、无内部状态
//!
//! ## 使用示例
//!
//! ```
//! use load_profile::{LoadProfile, Schedule};
//!
//! let schedule: Schedule = "steady:30,outage:30,recovery:30".parse().unwrap();
//! assert_eq!(schedule.rate_for(100, 10), 100);
//! assert_eq!(schedule.rate_for(100, 45), 0);
//! ```

mod profile;
mod schedule;

pub use contracts::{LoadMode, SegmentConfig};
pub use profile::{rate_for, LoadProfile, RunProfile};
pub use schedule::Schedule;
