//! CPU accounting controller
//!
//! Has no tunables; `create` only makes the directory. Reads:
//! - `cpuacct.usage` - total CPU time in nanoseconds
//! - `cpuacct.usage_percpu` - the same, per CPU
//! - `cpuacct.stat` - `user` and `system` time in clock ticks
//!
//! Results go into the usage part of the shared CPU slot, next to the
//! throttling counters the cpu controller writes.

use std::path::{Path, PathBuf};

use corral_core::{ControllerName, EntityPath, Error, Resources, Result, Stats};
use nix::errno::Errno;
use nix::unistd::{SysconfVar, sysconf};
use tracing::debug;

use crate::controller::ResourceController;
use crate::{fsutil, kv};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// `cpuacct` controller
#[derive(Debug, Clone)]
pub struct CpuacctController {
    root: PathBuf,
    clock_ticks: Option<u64>,
}

impl CpuacctController {
    /// Create a controller rooted at `<hierarchy_root>/cpuacct`
    #[must_use]
    pub fn new(hierarchy_root: impl AsRef<Path>) -> Self {
        Self {
            root: hierarchy_root.as_ref().join(ControllerName::Cpuacct.as_str()),
            clock_ticks: None,
        }
    }

    /// Use a fixed ticks-per-second rate instead of querying the system
    #[must_use]
    pub const fn with_clock_ticks(mut self, ticks_per_sec: u64) -> Self {
        self.clock_ticks = Some(ticks_per_sec);
        self
    }

    fn clock_ticks(&self) -> Result<u64> {
        if let Some(ticks) = self.clock_ticks {
            return Some(ticks)
                .filter(|&ticks| ticks > 0)
                .ok_or(Error::System(Errno::EINVAL));
        }

        sysconf(SysconfVar::CLK_TCK)?
            .and_then(|ticks| u64::try_from(ticks).ok())
            .filter(|&ticks| ticks > 0)
            .ok_or(Error::System(Errno::EINVAL))
    }
}

impl ResourceController for CpuacctController {
    fn name(&self) -> ControllerName {
        ControllerName::Cpuacct
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn create(&self, entity: &EntityPath, _resources: &Resources) -> Result<()> {
        fsutil::ensure_dir(&self.path(entity))
    }

    fn stat(&self, entity: &EntityPath, stats: &Stats) -> Result<()> {
        let dir = self.path(entity);

        let total = fsutil::read_uint(&dir.join("cpuacct.usage"))?;
        // the cpu controller may be filling the same slot right now
        stats.cpu.update(|cpu| cpu.usage.total = total);

        let percpu_path = dir.join("cpuacct.usage_percpu");
        let percpu = fsutil::read_single(&percpu_path)?;
        let per_cpu = kv::parse_uint_list(&percpu).map_err(|source| Error::Parse {
            path: percpu_path,
            source,
        })?;
        stats.cpu.update(|cpu| cpu.usage.per_cpu = per_cpu);

        let ticks = self.clock_ticks()?;
        let to_nanos = |value: u64| ticks_to_nanos(value, ticks);

        let stat_path = dir.join("cpuacct.stat");
        let reader = fsutil::open_stat(&stat_path)?;
        fsutil::scan_kv(&stat_path, reader, |key, value| match key {
            "user" => stats.cpu.update(|cpu| cpu.usage.user = to_nanos(value)),
            "system" => stats.cpu.update(|cpu| cpu.usage.kernel = to_nanos(value)),
            _ => {}
        })?;

        debug!(controller = %self.name(), entity = %entity, total, "Read CPU usage");
        Ok(())
    }
}

// Whole seconds and the sub-second remainder are scaled separately, so only
// a result beyond u64::MAX saturates.
fn ticks_to_nanos(value: u64, ticks_per_sec: u64) -> u64 {
    let secs = value / ticks_per_sec;
    let rest = u128::from(value % ticks_per_sec);
    let frac = rest * u128::from(NANOS_PER_SEC) / u128::from(ticks_per_sec);
    secs.saturating_mul(NANOS_PER_SEC)
        .saturating_add(u64::try_from(frac).unwrap_or(NANOS_PER_SEC))
}
