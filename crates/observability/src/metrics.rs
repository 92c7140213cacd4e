//! 负载生成指标收集模块
//!
//! 记录每个 epoch 的速率、发送结果，并在内存中聚合运行统计。

use contracts::{LoadMode, SendStatus};
use metrics::{counter, gauge, histogram};

/// 记录一个已完成的 epoch
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_epoch;
///
/// record_epoch(LoadMode::Burst, 200, 1_300, 48.0);
/// ```
pub fn record_epoch(mode: LoadMode, rate: u64, dispatched: u64, duration_ms: f64) {
    // epoch 计数器
    counter!("loadgen_epochs_total", "mode" => mode.as_str()).increment(1);

    // 目标速率 (逻辑查询 / epoch)
    gauge!("loadgen_epoch_rate").set(rate as f64);

    // 实际发出的事件数
    counter!("loadgen_events_dispatched_total").increment(dispatched);

    // epoch 处理耗时 (不含 pacing sleep)
    histogram!("loadgen_epoch_duration_ms").record(duration_ms);
}

/// 记录单次发送结果
pub fn record_send(sink_name: &str, status: SendStatus) {
    counter!(
        "loadgen_sends_total",
        "sink" => sink_name.to_string(),
        "status" => status.as_str()
    )
    .increment(1);
}

/// 记录超时 epoch（处理时间超过 epoch 长度，未 sleep）
pub fn record_overrun() {
    counter!("loadgen_epoch_overruns_total").increment(1);
}

/// 运行统计聚合器
///
/// 在内存中聚合指标，便于输出运行摘要。
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// 已执行 epoch 数
    pub epochs: u64,

    /// 发出的事件总数
    pub dispatched: u64,

    /// 成功发送数
    pub sent: u64,

    /// 超大跳过数
    pub skipped: u64,

    /// 失败数
    pub failed: u64,

    /// 超时 epoch 数
    pub overruns: u64,

    /// epoch 处理耗时统计 (毫秒)
    pub epoch_duration_ms: RunningStats,

    /// 目标速率统计
    pub rate: RunningStats,
}

impl RunStats {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新一个 epoch 的统计
    pub fn update_epoch(&mut self, rate: u64, duration_ms: f64, overrun: bool) {
        self.epochs += 1;
        self.rate.push(rate as f64);
        self.epoch_duration_ms.push(duration_ms);
        if overrun {
            self.overruns += 1;
        }
    }

    /// 批量累加发送结果（按 epoch 汇总）
    pub fn add_sends(&mut self, sent: u64, skipped: u64, failed: u64) {
        self.sent += sent;
        self.skipped += skipped;
        self.failed += failed;
        self.dispatched += sent + skipped + failed;
    }

    /// 失败率 (%)
    pub fn failure_rate(&self) -> f64 {
        if self.dispatched > 0 {
            self.failed as f64 / self.dispatched as f64 * 100.0
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Load Run Summary ===")?;
        writeln!(f, "Epochs: {} (overruns: {})", self.epochs, self.overruns)?;
        writeln!(f, "Events dispatched: {}", self.dispatched)?;
        writeln!(f, "Sent: {}", self.sent)?;
        writeln!(f, "Skipped (oversized): {}", self.skipped)?;
        writeln!(
            f,
            "Failed: {} ({:.2}%)",
            self.failed,
            self.failure_rate()
        )?;
        writeln!(f, "Target rate: {}", StatsSummary::from(&self.rate))?;
        writeln!(
            f,
            "Epoch duration (ms): {}",
            StatsSummary::from(&self.epoch_duration_ms)
        )?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
