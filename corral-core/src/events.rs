//! Stats monitor events with structured tracing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

use crate::{EntityPath, StatsSnapshot};

/// Events emitted while an entity is being monitored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Monitoring started
    Started {
        /// Monitored entity
        entity: EntityPath,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },

    /// Fresh statistics were collected
    StatsUpdate {
        /// Monitored entity
        entity: EntityPath,
        /// Collected statistics
        stats: StatsSnapshot,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },

    /// The entity was throttled since the previous sample
    CpuThrottled {
        /// Monitored entity
        entity: EntityPath,
        /// Newly throttled periods
        periods: u64,
        /// Newly accumulated throttled time, in nanoseconds
        throttled_time: u64,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },

    /// A refresh failed
    Error {
        /// Monitored entity
        entity: EntityPath,
        /// Error message
        message: String,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },

    /// Monitoring stopped
    Stopped {
        /// Monitored entity
        entity: EntityPath,
        /// Timestamp
        #[serde(with = "systemtime_serde")]
        timestamp: SystemTime,
    },
}

impl MonitorEvent {
    /// Get the entity from any event
    #[must_use]
    pub const fn entity(&self) -> &EntityPath {
        match self {
            Self::Started { entity, .. }
            | Self::StatsUpdate { entity, .. }
            | Self::CpuThrottled { entity, .. }
            | Self::Error { entity, .. }
            | Self::Stopped { entity, .. } => entity,
        }
    }

    /// Get the timestamp from any event
    #[must_use]
    pub const fn timestamp(&self) -> SystemTime {
        match self {
            Self::Started { timestamp, .. }
            | Self::StatsUpdate { timestamp, .. }
            | Self::CpuThrottled { timestamp, .. }
            | Self::Error { timestamp, .. }
            | Self::Stopped { timestamp, .. } => *timestamp,
        }
    }

    /// Check if this is a critical event
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Emit structured tracing event
    pub fn emit_trace(&self) {
        match self {
            Self::Started { entity, .. } => {
                tracing::info!(entity = %entity, event = "started", "Monitoring started");
            }
            Self::StatsUpdate { entity, .. } => {
                tracing::trace!(entity = %entity, event = "stats_update", "Stats update");
            }
            Self::CpuThrottled {
                entity,
                periods,
                throttled_time,
                ..
            } => {
                tracing::warn!(
                    entity = %entity,
                    periods,
                    throttled_ms = throttled_time / 1_000_000,
                    event = "cpu_throttled",
                    "CPU throttled"
                );
            }
            Self::Error {
                entity, message, ..
            } => {
                tracing::error!(
                    entity = %entity,
                    message = %message,
                    event = "error",
                    "Stats refresh failed"
                );
            }
            Self::Stopped { entity, .. } => {
                tracing::info!(entity = %entity, event = "stopped", "Monitoring stopped");
            }
        }
    }
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { entity, .. } => write!(f, "{entity}: monitoring started"),
            Self::StatsUpdate { entity, .. } => write!(f, "{entity}: stats update"),
            Self::CpuThrottled {
                entity, periods, ..
            } => write!(f, "{entity}: CPU throttled in {periods} period(s)"),
            Self::Error {
                entity, message, ..
            } => write!(f, "{entity}: error: {message}"),
            Self::Stopped { entity, .. } => write!(f, "{entity}: monitoring stopped"),
        }
    }
}

// Custom SystemTime serialization
mod systemtime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let since_epoch = time
            .duration_since(UNIX_EPOCH)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_u64(since_epoch.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + std::time::Duration::from_secs(secs))
    }
}
