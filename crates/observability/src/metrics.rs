//! 解码输出分发指标模块
//!
//! 记录 put / 转换 / 上行转发 / sink 投递的 Prometheus 指标，
//! 并在内存中聚合回放统计。

use metrics::{counter, histogram};
use std::collections::HashMap;

/// 记录一次 put (按输出类型)
pub fn record_event_put(kind: &str) {
    counter!("pdstack_events_put_total", "kind" => kind.to_string()).increment(1);
}

/// 记录载荷转换失败
///
/// `reason` 取自 `ConvertError::reason()`。
pub fn record_conversion_failure(kind: &str, reason: &str) {
    counter!(
        "pdstack_conversion_failures_total",
        "kind" => kind.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// 记录一次向上层解码器的转发
pub fn record_forward(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("pdstack_forwards_total", "status" => status.to_string()).increment(1);
}

/// 记录 sink 投递
pub fn record_sink_delivery(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "pdstack_sink_deliveries_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录一条输入事件及其采样跨度
pub fn record_input_event(instance: &str, span_samples: u64) {
    counter!("pdstack_input_events_total", "instance" => instance.to_string()).increment(1);
    histogram!("pdstack_input_span_samples").record(span_samples as f64);
}

/// 回放统计聚合器
///
/// 在内存中聚合输入事件，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct ReplayStats {
    /// 已回放的事件数
    pub total_events: u64,

    /// 解析失败被跳过的行数
    pub skipped_lines: u64,

    /// put 返回错误的次数
    pub rejected: u64,

    /// 采样跨度统计 (end - start)
    pub span_stats: RunningStats,

    /// 各实例事件数
    pub per_instance: HashMap<String, u64>,
}

impl ReplayStats {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条送入 `instance` 的事件
    pub fn record_event(&mut self, instance: &str, start_sample: u64, end_sample: u64) {
        let span = end_sample.saturating_sub(start_sample);
        self.total_events += 1;
        self.span_stats.push(span as f64);
        *self.per_instance.entry(instance.to_string()).or_insert(0) += 1;
        record_input_event(instance, span);
    }

    pub fn record_skipped(&mut self) {
        self.skipped_lines += 1;
    }

    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> ReplaySummary {
        ReplaySummary {
            total_events: self.total_events,
            skipped_lines: self.skipped_lines,
            rejected: self.rejected,
            rejection_rate: if self.total_events > 0 {
                self.rejected as f64 / self.total_events as f64 * 100.0
            } else {
                0.0
            },
            span_samples: StatsSummary::from(&self.span_stats),
            per_instance: self.per_instance.clone(),
        }
    }
}

/// 回放摘要
#[derive(Debug, Clone, Default)]
pub struct ReplaySummary {
    pub total_events: u64,
    pub skipped_lines: u64,
    pub rejected: u64,
    pub rejection_rate: f64,
    pub span_samples: StatsSummary,
    pub per_instance: HashMap<String, u64>,
}

impl std::fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Replay Summary ===")?;
        writeln!(f, "Events: {}", self.total_events)?;
        writeln!(f, "Skipped lines: {}", self.skipped_lines)?;
        writeln!(
            f,
            "Rejected puts: {} ({:.2}%)",
            self.rejected, self.rejection_rate
        )?;
        writeln!(f, "Span (samples): {}", self.span_samples)?;

        if !self.per_instance.is_empty() {
            writeln!(f, "Events per instance:")?;
            let mut instances: Vec<_> = self.per_instance.iter().collect();
            instances.sort();
            for (instance, count) in instances {
                writeln!(f, "  {}: {}", instance, count)?;
            }
        }

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

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
