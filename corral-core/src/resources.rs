//! Resource specification consumed by the controllers
//!
//! Every tunable is an `Option<u64>`: `None` means "leave the kernel value
//! unchanged", which is distinct from writing zero.

use serde::{Deserialize, Serialize};

/// Desired limits for one entity, grouped by controller domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Resources {
    /// CPU scheduling limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuResources>,

    /// Memory limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryResources>,

    /// Process number limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pids: Option<PidsResources>,
}

impl Resources {
    /// Whether no domain carries any value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cpu.as_ref().is_none_or(CpuResources::is_empty)
            && self.memory.as_ref().is_none_or(MemoryResources::is_empty)
            && self.pids.as_ref().is_none_or(PidsResources::is_empty)
    }
}

/// CPU scheduling limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CpuResources {
    /// Relative share of CPU time (`cpu.shares`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<u64>,

    /// CFS bandwidth quota in microseconds per period (`cpu.cfs_quota_us`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<u64>,

    /// CFS bandwidth period in microseconds (`cpu.cfs_period_us`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<u64>,

    /// Realtime runtime in microseconds (`cpu.rt_runtime_us`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realtime_runtime: Option<u64>,

    /// Realtime period in microseconds (`cpu.rt_period_us`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realtime_period: Option<u64>,
}

impl CpuResources {
    /// Whether every field is absent
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.shares.is_none()
            && self.quota.is_none()
            && self.period.is_none()
            && self.realtime_runtime.is_none()
            && self.realtime_period.is_none()
    }
}

/// Memory limits, all in bytes except `swappiness`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MemoryResources {
    /// Hard limit (`memory.limit_in_bytes`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Soft limit (`memory.soft_limit_in_bytes`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation: Option<u64>,

    /// Memory plus swap limit (`memory.memsw.limit_in_bytes`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap: Option<u64>,

    /// Kernel memory limit (`memory.kmem.limit_in_bytes`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<u64>,

    /// Kernel TCP buffer limit (`memory.kmem.tcp.limit_in_bytes`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_tcp: Option<u64>,

    /// Swap tendency, 0 to 100 (`memory.swappiness`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swappiness: Option<u64>,
}

impl MemoryResources {
    /// Whether every field is absent
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.limit.is_none()
            && self.reservation.is_none()
            && self.swap.is_none()
            && self.kernel.is_none()
            && self.kernel_tcp.is_none()
            && self.swappiness.is_none()
    }
}

/// Process number limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PidsResources {
    /// Maximum number of tasks (`pids.max`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl PidsResources {
    /// Whether every field is absent
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.limit.is_none()
    }
}
