use clap::Parser;

mod cli;
mod config;
mod error;
mod metrics;
mod models;
mod services;

use cli::CommandArgs;
use config::AlertConfig;
use metrics::METRICS;
use models::service::load_manifest;
use services::watchdog::RunSummary;
use services::{
    AlertDispatcher, ChannelAlerter, ChannelRegistry, HttpDeliveryClient, RetryPolicy,
    SysinfoInspector, Watchdog,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandArgs::parse();
    let config = AlertConfig::from_args(args)?;

    // 启动前置条件：清单和渠道必须能加载
    let services = load_manifest(&config.services_path)?;
    let registry = ChannelRegistry::from_config(&config)?;

    print_banner(&config, services.len(), &registry);

    if registry.is_empty() {
        log::warn!("No notification channels configured, missing services will only be logged");
    }

    let client = HttpDeliveryClient::new(config.request_timeout, RetryPolicy::default())?;
    let dispatcher = AlertDispatcher::new(client, config.channel_timeout);
    let alerter = ChannelAlerter::new(dispatcher, registry, config.utc_offset);
    let mut watchdog = Watchdog::new(services, SysinfoInspector::new(), alerter);

    let metrics_file = config.metrics_file.clone();
    let after_run = move |summary: &RunSummary| {
        log::info!(
            "Run complete: {} checked, {} down {:?}",
            summary.checked,
            summary.down.len(),
            summary.down
        );
        if let Some(path) = &metrics_file {
            if let Err(e) = METRICS.write_textfile(path) {
                log::warn!("Failed to write metrics to {}: {}", path.display(), e);
            }
        }
    };

    match config.interval {
        Some(interval) => watchdog.run_forever(interval, after_run).await,
        None => {
            let summary = watchdog.run_once().await;
            after_run(&summary);
        }
    }

    Ok(())
}

fn print_banner(config: &AlertConfig, service_count: usize, registry: &ChannelRegistry) {
    println!("╔═══════════════════════════════════════════════════════════╗");
    println!("║      Process Alerter v{:<36}║", env!("CARGO_PKG_VERSION"));
    println!("╚═══════════════════════════════════════════════════════════╝");
    println!();
    println!("📋 Services: {} from {}", service_count, config.services_path.display());
    println!("🔔 Channels:");
    for channel in registry.channels() {
        println!("  {:<12} {:?} {:?}", channel.label(), channel.method, channel.condition);
    }
    println!("🕒 UTC offset: {}", config.utc_offset);
    match config.interval {
        Some(interval) => println!("🔁 Checking every {}s", interval.as_secs()),
        None => println!("▶  Single run"),
    }
    println!("═══════════════════════════════════════════════════════════");
}
