//! CPU scheduling controller
//!
//! Tunables (`cpu.*`):
//! - `rt_period_us` / `rt_runtime_us` - realtime bandwidth
//! - `shares` - proportional weight under contention
//! - `cfs_period_us` / `cfs_quota_us` - CFS bandwidth
//!
//! Counters come from `cpu.stat` and land in the throttling part of the
//! shared CPU slot, which the cpuacct controller fills too.

use std::path::{Path, PathBuf};

use corral_core::{ControllerName, EntityPath, Resources, Result, Stats};
use tracing::debug;

use crate::controller::ResourceController;
use crate::fsutil;

const CPU_STAT: &str = "cpu.stat";

/// `cpu` controller
#[derive(Debug, Clone)]
pub struct CpuController {
    root: PathBuf,
}

impl CpuController {
    /// Create a controller rooted at `<hierarchy_root>/cpu`
    #[must_use]
    pub fn new(hierarchy_root: impl AsRef<Path>) -> Self {
        Self {
            root: hierarchy_root.as_ref().join(ControllerName::Cpu.as_str()),
        }
    }
}

impl ResourceController for CpuController {
    fn name(&self) -> ControllerName {
        ControllerName::Cpu
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn create(&self, entity: &EntityPath, resources: &Resources) -> Result<()> {
        let dir = self.path(entity);
        fsutil::ensure_dir(&dir)?;

        let Some(cpu) = resources.cpu else {
            return Ok(());
        };

        for (file, value) in [
            ("cpu.rt_period_us", cpu.realtime_period),
            ("cpu.rt_runtime_us", cpu.realtime_runtime),
            ("cpu.shares", cpu.shares),
            ("cpu.cfs_period_us", cpu.period),
            ("cpu.cfs_quota_us", cpu.quota),
        ] {
            if let Some(value) = value {
                fsutil::write_tunable(&dir, file, value)?;
            }
        }

        debug!(controller = %self.name(), entity = %entity, "Applied CPU limits");
        Ok(())
    }

    fn stat(&self, entity: &EntityPath, stats: &Stats) -> Result<()> {
        let path = self.path(entity).join(CPU_STAT);
        let reader = fsutil::open_stat(&path)?;

        // cpuacct may be filling the same slot right now
        stats.cpu.init();

        fsutil::scan_kv(&path, reader, |key, value| match key {
            "nr_periods" => stats.cpu.update(|cpu| cpu.throttling.periods = value),
            "nr_throttled" => stats
                .cpu
                .update(|cpu| cpu.throttling.throttled_periods = value),
            "throttled_time" => stats
                .cpu
                .update(|cpu| cpu.throttling.throttled_time = value),
            _ => {}
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::{CpuResources, Error, ThrottlingStat};
    use std::fs;

    fn entity() -> EntityPath {
        EntityPath::new("corral/web").unwrap()
    }

    #[test]
    fn test_path() {
        let controller = CpuController::new("/sys/fs/cgroup");
        assert_eq!(
            controller.path(&entity()),
            PathBuf::from("/sys/fs/cgroup/cpu/corral/web")
        );
    }

    #[test]
    fn test_create_writes_present_fields_only() {
        let tmp = tempfile::tempdir().unwrap();
        let controller = CpuController::new(tmp.path());
        let resources = Resources {
            cpu: Some(CpuResources {
                shares: Some(512),
                quota: Some(50_000),
                ..Default::default()
            }),
            ..Default::default()
        };

        controller.create(&entity(), &resources).unwrap();

        let dir = controller.path(&entity());
        assert_eq!(fs::read_to_string(dir.join("cpu.shares")).unwrap(), "512");
        assert_eq!(
            fs::read_to_string(dir.join("cpu.cfs_quota_us")).unwrap(),
            "50000"
        );
        assert!(!dir.join("cpu.cfs_period_us").exists());
        assert!(!dir.join("cpu.rt_period_us").exists());
        assert!(!dir.join("cpu.rt_runtime_us").exists());
    }

    #[test]
    fn test_stat_throttling() {
        let tmp = tempfile::tempdir().unwrap();
        let controller = CpuController::new(tmp.path());
        let dir = controller.path(&entity());
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(CPU_STAT),
            "nr_periods 10\nnr_throttled 2\nthrottled_time 500\n",
        )
        .unwrap();

        let stats = Stats::new();
        controller.stat(&entity(), &stats).unwrap();

        assert_eq!(
            stats.cpu.get().unwrap().throttling,
            ThrottlingStat {
                periods: 10,
                throttled_periods: 2,
                throttled_time: 500,
            }
        );
    }

    #[test]
    fn test_stat_missing_file_leaves_slot_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let controller = CpuController::new(tmp.path());

        let stats = Stats::new();
        let err = controller.stat(&entity(), &stats).unwrap_err();

        assert!(matches!(err, Error::FileOpen { .. }));
        assert!(err.is_not_found());
        assert!(!stats.cpu.is_populated());
    }

    #[test]
    fn test_stat_parse_error_keeps_partial_values() {
        let tmp = tempfile::tempdir().unwrap();
        let controller = CpuController::new(tmp.path());
        let dir = controller.path(&entity());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CPU_STAT), "nr_periods 7\nnr_throttled -1\n").unwrap();

        let stats = Stats::new();
        let err = controller.stat(&entity(), &stats).unwrap_err();

        assert!(matches!(err, Error::Parse { .. }));
        let cpu = stats.cpu.get().unwrap();
        assert_eq!(cpu.throttling.periods, 7);
        assert_eq!(cpu.throttling.throttled_periods, 0);
    }

    #[test]
    fn test_stat_ignores_unknown_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let controller = CpuController::new(tmp.path());
        let dir = controller.path(&entity());
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(CPU_STAT),
            "nr_periods 1\nnr_bursts 4\nburst_time 9\nthrottled_time 3\n",
        )
        .unwrap();

        let stats = Stats::new();
        controller.stat(&entity(), &stats).unwrap();

        let throttling = stats.cpu.get().unwrap().throttling;
        assert_eq!(throttling.periods, 1);
        assert_eq!(throttling.throttled_time, 3);
    }
}
