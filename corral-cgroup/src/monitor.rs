//! Periodic stats collection with event emission
//!
//! Runs a [`ControllerRegistry`] collection in the background on a fixed
//! interval, using `Arc<Mutex<T>>` for the shared run flag and a channel for
//! event emission.

use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Duration, interval};

use corral_core::{EntityPath, Error, MonitorEvent, Result, StatsSnapshot, ThrottlingStat};

use crate::registry::ControllerRegistry;

/// Stats monitor that runs in the background
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokio::sync::mpsc;
/// use corral_cgroup::{ControllerRegistry, StatsMonitor};
/// use corral_core::EntityPath;
///
/// # async fn example() -> corral_core::Result<()> {
/// let registry = Arc::new(ControllerRegistry::with_defaults("/sys/fs/cgroup"));
/// let entity = EntityPath::new("corral/web")?;
/// let (tx, mut rx) = mpsc::channel(100);
///
/// let monitor = StatsMonitor::new(registry, entity, Duration::from_secs(2)).with_events(tx);
/// let handle = monitor.start().await?;
///
/// while let Some(event) = rx.recv().await {
///     println!("Event: {event}");
/// }
///
/// monitor.stop().await;
/// handle.await?;
/// # Ok(())
/// # }
/// ```
pub struct StatsMonitor {
    registry: Arc<ControllerRegistry>,
    entity: EntityPath,
    interval: Duration,
    running: Arc<Mutex<bool>>,
    event_tx: Option<mpsc::Sender<MonitorEvent>>,
}

impl StatsMonitor {
    /// Create a new monitor for `entity`
    ///
    /// # Arguments
    /// * `registry` - Controllers to collect from
    /// * `entity` - Entity to monitor
    /// * `interval` - How often to collect stats
    #[must_use]
    pub fn new(registry: Arc<ControllerRegistry>, entity: EntityPath, interval: Duration) -> Self {
        Self {
            registry,
            entity,
            interval,
            running: Arc::new(Mutex::new(false)),
            event_tx: None,
        }
    }

    /// Add event channel for emitting events
    #[must_use]
    pub fn with_events(mut self, tx: mpsc::Sender<MonitorEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Start monitoring in the background
    ///
    /// Each collection runs on the blocking pool, since controllers do
    /// synchronous file I/O.
    ///
    /// # Errors
    /// Returns error if monitoring cannot be started
    pub async fn start(&self) -> Result<tokio::task::JoinHandle<()>> {
        if self.interval.is_zero() {
            return Err(Error::InvalidConfig {
                message: "Monitor interval must be non-zero".to_string(),
            });
        }

        *self.running.lock().await = true;

        let registry = Arc::clone(&self.registry);
        let running = Arc::clone(&self.running);
        let period = self.interval;
        let event_tx = self.event_tx.clone();
        let entity = self.entity.clone();

        let handle = tokio::spawn(async move {
            let outcome: Result<()> = async {
                let mut ticker = interval(period);
                let mut last_throttling: Option<ThrottlingStat> = None;

                tracing::debug!(
                    entity = %entity,
                    interval_ms = period.as_millis(),
                    "Stats monitor loop starting"
                );

                emit(
                    event_tx.as_ref(),
                    MonitorEvent::Started {
                        entity: entity.clone(),
                        timestamp: SystemTime::now(),
                    },
                )
                .await?;

                loop {
                    ticker.tick().await;

                    if !*running.lock().await {
                        tracing::debug!("Monitor stopping");
                        break;
                    }

                    let event = match collect(Arc::clone(&registry), entity.clone()).await {
                        Ok(stats) => {
                            if let Some(event) =
                                throttling_event(&entity, last_throttling.as_ref(), &stats)
                            {
                                emit(event_tx.as_ref(), event).await?;
                            }
                            last_throttling = stats.cpu.as_ref().map(|cpu| cpu.throttling);

                            MonitorEvent::StatsUpdate {
                                entity: entity.clone(),
                                stats,
                                timestamp: SystemTime::now(),
                            }
                        }
                        Err(e) => MonitorEvent::Error {
                            entity: entity.clone(),
                            message: e.to_string(),
                            timestamp: SystemTime::now(),
                        },
                    };
                    emit(event_tx.as_ref(), event).await?;
                }

                emit(
                    event_tx.as_ref(),
                    MonitorEvent::Stopped {
                        entity: entity.clone(),
                        timestamp: SystemTime::now(),
                    },
                )
                .await
            }
            .await;

            // a dropped receiver ends the loop like stop() does
            if let Err(e) = outcome {
                tracing::debug!(entity = %entity, error = %e, "Event receiver closed, monitor stopping");
                *running.lock().await = false;
            }
        });

        Ok(handle)
    }

    /// Stop monitoring
    ///
    /// The background task exits at its next tick. It also exits on its own
    /// once the event receiver is dropped.
    pub async fn stop(&self) {
        *self.running.lock().await = false;
        tracing::debug!("Stopping monitor");
    }
}

async fn collect(registry: Arc<ControllerRegistry>, entity: EntityPath) -> Result<StatsSnapshot> {
    tokio::task::spawn_blocking(move || {
        registry
            .stat_concurrent(&entity)
            .map(|stats| stats.snapshot())
    })
    .await?
}

// Throttled periods only ever grow, a drop means the group was recreated.
fn throttling_event(
    entity: &EntityPath,
    previous: Option<&ThrottlingStat>,
    stats: &StatsSnapshot,
) -> Option<MonitorEvent> {
    let previous = previous?;
    let current = &stats.cpu.as_ref()?.throttling;

    let periods = current
        .throttled_periods
        .checked_sub(previous.throttled_periods)?;
    if periods == 0 {
        return None;
    }

    Some(MonitorEvent::CpuThrottled {
        entity: entity.clone(),
        periods,
        throttled_time: current
            .throttled_time
            .saturating_sub(previous.throttled_time),
        timestamp: SystemTime::now(),
    })
}

async fn emit(tx: Option<&mpsc::Sender<MonitorEvent>>, event: MonitorEvent) -> Result<()> {
    event.emit_trace();
    if let Some(tx) = tx {
        tx.send(event).await?;
    }
    Ok(())
}

impl std::fmt::Debug for StatsMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsMonitor")
            .field("entity", &self.entity)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::CpuStat;
    use std::fs;

    fn entity() -> EntityPath {
        EntityPath::new("test").unwrap()
    }

    fn snapshot(throttled_periods: u64, throttled_time: u64) -> StatsSnapshot {
        StatsSnapshot {
            cpu: Some(CpuStat {
                throttling: ThrottlingStat {
                    periods: 100,
                    throttled_periods,
                    throttled_time,
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn cpu_registry(root: &std::path::Path) -> Arc<ControllerRegistry> {
        let dir = root.join("cpu/test");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("cpu.stat"),
            "nr_periods 1\nnr_throttled 0\nthrottled_time 0\n",
        )
        .unwrap();
        Arc::new(ControllerRegistry::with_selected(
            root,
            &[corral_core::ControllerName::Cpu],
        ))
    }

    #[test]
    fn test_throttling_event() {
        let previous = snapshot(2, 1_000).cpu.unwrap().throttling;

        let event = throttling_event(&entity(), Some(&previous), &snapshot(5, 4_000)).unwrap();
        assert!(matches!(
            event,
            MonitorEvent::CpuThrottled {
                periods: 3,
                throttled_time: 3_000,
                ..
            }
        ));

        assert!(throttling_event(&entity(), Some(&previous), &snapshot(2, 1_000)).is_none());
        assert!(throttling_event(&entity(), Some(&previous), &snapshot(0, 0)).is_none());
        assert!(throttling_event(&entity(), None, &snapshot(5, 4_000)).is_none());
    }

    #[tokio::test]
    async fn test_monitor_lifecycle() {
        let tmp = tempfile::tempdir().unwrap();
        let monitor = StatsMonitor::new(
            cpu_registry(tmp.path()),
            entity(),
            Duration::from_millis(50),
        );

        let handle = monitor.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        monitor.stop().await;

        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_monitor_with_events() {
        let tmp = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(100);
        let monitor = StatsMonitor::new(
            cpu_registry(tmp.path()),
            entity(),
            Duration::from_millis(50),
        )
        .with_events(tx);

        let handle = monitor.start().await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timeout")
            .expect("event");
        assert!(matches!(event, MonitorEvent::Started { .. }));

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timeout")
            .expect("event");
        match event {
            MonitorEvent::StatsUpdate { stats, .. } => {
                assert_eq!(stats.cpu.unwrap().throttling.periods, 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        monitor.stop().await;
        let _ = handle.await;
    }

    #[tokio::test]
    async fn test_monitor_reports_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = Arc::new(ControllerRegistry::with_defaults(tmp.path()));
        let (tx, mut rx) = mpsc::channel(100);
        let monitor =
            StatsMonitor::new(registry, entity(), Duration::from_millis(50)).with_events(tx);

        let handle = monitor.start().await.unwrap();

        let _started = rx.recv().await.expect("event");
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timeout")
            .expect("event");
        assert!(event.is_critical());

        monitor.stop().await;
        let _ = handle.await;
    }

    #[tokio::test]
    async fn test_monitor_ends_when_receiver_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(100);
        let monitor = StatsMonitor::new(
            cpu_registry(tmp.path()),
            entity(),
            Duration::from_millis(10),
        )
        .with_events(tx);

        let handle = monitor.start().await.unwrap();
        let _started = rx.recv().await.expect("event");
        drop(rx);

        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(result.is_ok(), "monitor kept running without a receiver");
        assert!(!*monitor.running.lock().await);
    }

    #[tokio::test]
    async fn test_monitor_rejects_zero_interval() {
        let tmp = tempfile::tempdir().unwrap();
        let monitor = StatsMonitor::new(cpu_registry(tmp.path()), entity(), Duration::ZERO);
        assert!(monitor.start().await.is_err());
    }

    #[tokio::test]
    async fn test_monitor_stop_before_start() {
        let tmp = tempfile::tempdir().unwrap();
        let monitor = StatsMonitor::new(
            cpu_registry(tmp.path()),
            entity(),
            Duration::from_secs(1),
        );

        monitor.stop().await;
    }
}
