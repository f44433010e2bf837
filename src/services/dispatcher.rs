use chrono::{DateTime, FixedOffset};
use std::time::Duration;

use crate::error::{ChannelError, DeliveryError};
use crate::metrics::{DeliveryOutcome, METRICS};
use crate::models::{NotificationChannel, ServiceDescriptor};
use crate::services::condition::should_fire;
use crate::services::delivery::{DeliveryResponse, HttpDeliveryClient};
use crate::services::template::render;

/// 单个渠道的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: String,
    pub outcome: DeliveryOutcome,
}

/// 一次告警分发的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub channels: Vec<ChannelReport>,
}

impl DispatchReport {
    pub fn count(&self, outcome: DeliveryOutcome) -> usize {
        self.channels.iter().filter(|r| r.outcome == outcome).count()
    }
}

/// 按注册顺序把告警发到每个渠道，单个渠道的失败不影响其他渠道
pub struct AlertDispatcher {
    client: HttpDeliveryClient,
    channel_timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(client: HttpDeliveryClient, channel_timeout: Duration) -> Self {
        Self {
            client,
            channel_timeout,
        }
    }

    pub async fn dispatch(
        &self,
        service: &ServiceDescriptor,
        channels: &[NotificationChannel],
        now: &DateTime<FixedOffset>,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for channel in channels {
            let label = channel.label();

            let outcome = if !should_fire(channel, now) {
                log::info!("Condition not met for channel '{}' at {}, skipping", label, now);
                DeliveryOutcome::Skipped
            } else {
                match self.send(channel, service).await {
                    Ok(response) if response.is_success() => {
                        log::info!(
                            "Channel '{}' responded {} after {} attempt(s): {}",
                            label, response.status, response.attempts, response.body
                        );
                        DeliveryOutcome::Delivered
                    }
                    Ok(response) => {
                        log::warn!(
                            "Channel '{}' rejected alert with {}: {}",
                            label, response.status, response.body
                        );
                        DeliveryOutcome::Rejected
                    }
                    Err(e) => {
                        log_failure(label, &service.display_name(), &e);
                        DeliveryOutcome::Failed
                    }
                }
            };

            METRICS.record_delivery(label, outcome);
            report.channels.push(ChannelReport {
                channel: label.to_string(),
                outcome,
            });
        }

        report
    }

    async fn send(
        &self,
        channel: &NotificationChannel,
        service: &ServiceDescriptor,
    ) -> Result<DeliveryResponse, ChannelError> {
        let payload = render(&channel.body, service)?;

        let delivery = self.client.deliver(
            channel.method,
            &channel.url,
            &channel.headers,
            &payload,
            channel.body_format,
        );

        let response = tokio::time::timeout(self.channel_timeout, delivery)
            .await
            .map_err(|_| DeliveryError::TimedOut {
                after: self.channel_timeout,
            })??;

        Ok(response)
    }
}

fn log_failure(channel: &str, service: &str, error: &ChannelError) {
    log::error!("❌ Error while sending '{}' notification for {}: {}", channel, service, error);
    let mut source = std::error::Error::source(error);
    while let Some(err) = source {
        log::error!("     - {}", err);
        source = err.source();
    }
}
