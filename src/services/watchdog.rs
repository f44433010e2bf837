use chrono::{FixedOffset, Utc};
use std::time::Duration;

use crate::metrics::METRICS;
use crate::models::{ProcessEntry, ServiceDescriptor};
use crate::services::dispatcher::{AlertDispatcher, DispatchReport};
use crate::services::process_checker::find_match;
use crate::services::process_inspector::ProcessInspector;
use crate::services::registry::ChannelRegistry;

/// 服务缺失时的告警出口
pub trait Alerter {
    async fn alert(&self, service: &ServiceDescriptor) -> DispatchReport;
}

/// 通过注册表中的全部渠道发送告警
pub struct ChannelAlerter {
    dispatcher: AlertDispatcher,
    registry: ChannelRegistry,
    utc_offset: FixedOffset,
}

impl ChannelAlerter {
    pub fn new(dispatcher: AlertDispatcher, registry: ChannelRegistry, utc_offset: FixedOffset) -> Self {
        Self {
            dispatcher,
            registry,
            utc_offset,
        }
    }
}

impl Alerter for ChannelAlerter {
    async fn alert(&self, service: &ServiceDescriptor) -> DispatchReport {
        let now = Utc::now().with_timezone(&self.utc_offset);
        log::info!("Service is not running: {:?}", service);
        log::debug!("Local time for delivery conditions: {}", now);

        METRICS.record_alert(&service.display_name());
        self.dispatcher
            .dispatch(service, self.registry.channels(), &now)
            .await
    }
}

/// 一轮检查的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub checked: usize,
    pub down: Vec<String>,
}

pub struct Watchdog<I, A> {
    services: Vec<ServiceDescriptor>,
    inspector: I,
    alerter: A,
}

impl<I: ProcessInspector, A: Alerter> Watchdog<I, A> {
    pub fn new(services: Vec<ServiceDescriptor>, inspector: I, alerter: A) -> Self {
        Self {
            services,
            inspector,
            alerter,
        }
    }

    /// 采集一次进程快照，逐个检查服务，缺失的发送告警
    pub async fn run_once(&mut self) -> RunSummary {
        let snapshot: Vec<ProcessEntry> = self.inspector.snapshot();
        log::debug!("Captured {} processes", snapshot.len());

        let mut summary = RunSummary::default();
        for service in &self.services {
            let name = service.display_name();
            let found = find_match(service, &snapshot);

            match found {
                Some(m) => log::info!(
                    "Found status for service {} is → true (pid {}, {:?})",
                    name, m.pid, m.rule
                ),
                None => log::info!("Found status for service {} is → false", name),
            }
            METRICS.set_service_up(&name, found.is_some());
            summary.checked += 1;

            if found.is_none() {
                self.alerter.alert(service).await;
                summary.down.push(name);
            }
        }

        METRICS.mark_run_complete(Utc::now().timestamp());
        summary
    }

    /// 按固定间隔循环检查，不会返回
    pub async fn run_forever(&mut self, interval: Duration, mut after_run: impl FnMut(&RunSummary)) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let summary = self.run_once().await;
            after_run(&summary);
        }
    }
}
