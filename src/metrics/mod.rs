use prometheus::{
    Encoder, GaugeVec, CounterVec, Opts, Registry, TextEncoder,
    register_gauge_vec_with_registry, register_counter_vec_with_registry,
};
use lazy_static::lazy_static;
use std::path::Path;
use std::sync::Arc;
use sysinfo::System;

/// 渠道投递结果，用作 outcome 标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 2xx
    Delivered,
    /// 非 2xx 但未重试
    Rejected,
    /// 条件不满足
    Skipped,
    /// 渲染或投递出错
    Failed,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Rejected => "rejected",
            DeliveryOutcome::Skipped => "skipped",
            DeliveryOutcome::Failed => "failed",
        }
    }
}

pub struct MetricsRegistry {
    registry: Registry,
    hostname: String,

    // Gauge metrics
    pub service_up: GaugeVec,
    pub last_run_timestamp: GaugeVec,

    // Counter metrics
    pub alerts_total: CounterVec,
    pub channel_deliveries_total: CounterVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let registry = Registry::new();
        let hostname = System::host_name().unwrap_or_else(|| "unknown".to_string());

        let service_up = register_gauge_vec_with_registry!(
            Opts::new("process_alerter_service_up", "Service process found (1) or missing (0)"),
            &["service", "hostname"],
            registry
        ).unwrap();

        let last_run_timestamp = register_gauge_vec_with_registry!(
            Opts::new("process_alerter_last_run_timestamp_seconds", "Unix timestamp of the last completed check run"),
            &["hostname"],
            registry
        ).unwrap();

        let alerts_total = register_counter_vec_with_registry!(
            Opts::new("process_alerter_alerts_total", "Alerts dispatched for missing services"),
            &["service", "hostname"],
            registry
        ).unwrap();

        let channel_deliveries_total = register_counter_vec_with_registry!(
            Opts::new("process_alerter_channel_deliveries_total", "Notification channel outcomes"),
            &["channel", "outcome", "hostname"],
            registry
        ).unwrap();

        Self {
            registry,
            hostname,
            service_up,
            last_run_timestamp,
            alerts_total,
            channel_deliveries_total,
        }
    }

    pub fn set_service_up(&self, service: &str, up: bool) {
        self.service_up
            .with_label_values(&[service, self.hostname.as_str()])
            .set(if up { 1.0 } else { 0.0 });
    }

    pub fn record_alert(&self, service: &str) {
        self.alerts_total
            .with_label_values(&[service, self.hostname.as_str()])
            .inc();
    }

    pub fn record_delivery(&self, channel: &str, outcome: DeliveryOutcome) {
        self.channel_deliveries_total
            .with_label_values(&[channel, outcome.as_str(), self.hostname.as_str()])
            .inc();
    }

    pub fn mark_run_complete(&self, unix_seconds: i64) {
        self.last_run_timestamp
            .with_label_values(&[self.hostname.as_str()])
            .set(unix_seconds as f64);
    }

    pub fn render(&self) -> Result<String, Box<dyn std::error::Error>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// 写入 textfile collector 文件（先写临时文件再重命名）
    pub fn write_textfile(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let text = self.render()?;
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    pub static ref METRICS: Arc<MetricsRegistry> = Arc::new(MetricsRegistry::new());
}
