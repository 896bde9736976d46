//! Watch command implementation

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use corral_cgroup::{ControllerRegistry, StatsMonitor};
use corral_core::{EntityPath, MonitorEvent};
use tokio::sync::mpsc;

pub async fn execute(
    registry: ControllerRegistry,
    path: &str,
    interval_secs: u64,
    count: Option<u64>,
) -> Result<()> {
    let entity = EntityPath::new(path).context("Invalid entity path")?;
    let (tx, mut rx) = mpsc::channel(100);

    let monitor = StatsMonitor::new(
        Arc::new(registry),
        entity.clone(),
        Duration::from_secs(interval_secs),
    )
    .with_events(tx);
    let handle = monitor.start().await.context("Failed to start monitor")?;

    println!(
        "{:<10} {:<12} {:<12} {:<16} {:<8}",
        "Sample", "CPU (s)", "Throttled", "Memory", "Tasks"
    );
    println!("{:-<60}", "");

    let mut samples = 0u64;
    while let Some(event) = rx.recv().await {
        match event {
            MonitorEvent::StatsUpdate { stats, .. } => {
                samples += 1;
                #[allow(clippy::cast_precision_loss)]
                let cpu_secs = stats
                    .cpu
                    .as_ref()
                    .map_or(0.0, |cpu| cpu.usage.total as f64 / 1e9);
                println!(
                    "{:<10} {:<12.3} {:<12} {:<16} {:<8}",
                    samples,
                    cpu_secs,
                    stats
                        .cpu
                        .as_ref()
                        .map_or(0, |cpu| cpu.throttling.throttled_periods),
                    stats.memory.as_ref().map_or(0, |memory| memory.usage.usage),
                    stats.pids.as_ref().map_or(0, |pids| pids.current),
                );

                if count.is_some_and(|count| samples >= count) {
                    break;
                }
            }
            MonitorEvent::Error { message, .. } => {
                samples += 1;
                eprintln!("Error reading stats: {message}");
                if count.is_some_and(|count| samples >= count) {
                    break;
                }
            }
            MonitorEvent::CpuThrottled { periods, .. } => {
                println!("  throttled in {periods} period(s)");
            }
            MonitorEvent::Started { .. } | MonitorEvent::Stopped { .. } => {}
        }
    }

    monitor.stop().await;
    drop(rx);
    handle.await.context("Monitor task failed")?;

    Ok(())
}
