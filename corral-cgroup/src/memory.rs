//! Memory controller
//!
//! Tunables are written in the order the kernel accepts them on a fresh
//! group: the plain limit before the memory+swap limit.
//!
//! Counters come from `memory.stat` plus the four accounting families
//! (`memory.*`, `memory.memsw.*`, `memory.kmem.*`, `memory.kmem.tcp.*`).
//! Only the plain family is mandatory; the others depend on kernel config
//! (swap accounting, kmem accounting) and are skipped when absent.

use std::path::{Path, PathBuf};

use corral_core::{
    ControllerName, EntityPath, MemoryEntry, MemoryStat, Resources, Result, Stats,
};
use tracing::debug;

use crate::controller::ResourceController;
use crate::fsutil;

const MEMORY_STAT: &str = "memory.stat";

/// Accounting families, keyed by the infix in their file names
#[derive(Debug, Clone, Copy)]
enum Family {
    Usage,
    Swap,
    Kernel,
    KernelTcp,
}

impl Family {
    const ALL: [Self; 4] = [Self::Usage, Self::Swap, Self::Kernel, Self::KernelTcp];

    const fn prefix(self) -> &'static str {
        match self {
            Self::Usage => "memory",
            Self::Swap => "memory.memsw",
            Self::Kernel => "memory.kmem",
            Self::KernelTcp => "memory.kmem.tcp",
        }
    }

    const fn is_optional(self) -> bool {
        !matches!(self, Self::Usage)
    }

    fn entry(self, stat: &mut MemoryStat) -> &mut MemoryEntry {
        match self {
            Self::Usage => &mut stat.usage,
            Self::Swap => &mut stat.swap,
            Self::Kernel => &mut stat.kernel,
            Self::KernelTcp => &mut stat.kernel_tcp,
        }
    }
}

/// `memory` controller
#[derive(Debug, Clone)]
pub struct MemoryController {
    root: PathBuf,
}

impl MemoryController {
    /// Create a controller rooted at `<hierarchy_root>/memory`
    #[must_use]
    pub fn new(hierarchy_root: impl AsRef<Path>) -> Self {
        Self {
            root: hierarchy_root.as_ref().join(ControllerName::Memory.as_str()),
        }
    }

    fn read_entry(dir: &Path, family: Family) -> Result<MemoryEntry> {
        let prefix = family.prefix();
        let read = |name: &str| fsutil::read_uint(&dir.join(format!("{prefix}.{name}")));

        Ok(MemoryEntry {
            usage: read("usage_in_bytes")?,
            max: read("max_usage_in_bytes")?,
            failcnt: read("failcnt")?,
            limit: read("limit_in_bytes")?,
        })
    }
}

impl ResourceController for MemoryController {
    fn name(&self) -> ControllerName {
        ControllerName::Memory
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn create(&self, entity: &EntityPath, resources: &Resources) -> Result<()> {
        let dir = self.path(entity);
        fsutil::ensure_dir(&dir)?;

        let Some(memory) = resources.memory else {
            return Ok(());
        };

        for (file, value) in [
            ("memory.limit_in_bytes", memory.limit),
            ("memory.soft_limit_in_bytes", memory.reservation),
            ("memory.memsw.limit_in_bytes", memory.swap),
            ("memory.kmem.limit_in_bytes", memory.kernel),
            ("memory.kmem.tcp.limit_in_bytes", memory.kernel_tcp),
            ("memory.swappiness", memory.swappiness),
        ] {
            if let Some(value) = value {
                fsutil::write_tunable(&dir, file, value)?;
            }
        }

        debug!(controller = %self.name(), entity = %entity, "Applied memory limits");
        Ok(())
    }

    fn stat(&self, entity: &EntityPath, stats: &Stats) -> Result<()> {
        let dir = self.path(entity);
        let path = dir.join(MEMORY_STAT);
        let reader = fsutil::open_stat(&path)?;

        stats.memory.init();

        fsutil::scan_kv(&path, reader, |key, value| {
            stats.memory.update(|m| {
                let field = match key {
                    "cache" => &mut m.cache,
                    "rss" => &mut m.rss,
                    "rss_huge" => &mut m.rss_huge,
                    "mapped_file" => &mut m.mapped_file,
                    "dirty" => &mut m.dirty,
                    "writeback" => &mut m.writeback,
                    "pgpgin" => &mut m.pgpgin,
                    "pgpgout" => &mut m.pgpgout,
                    "pgfault" => &mut m.pgfault,
                    "pgmajfault" => &mut m.pgmajfault,
                    "inactive_anon" => &mut m.inactive_anon,
                    "active_anon" => &mut m.active_anon,
                    "inactive_file" => &mut m.inactive_file,
                    "active_file" => &mut m.active_file,
                    "unevictable" => &mut m.unevictable,
                    "hierarchical_memory_limit" => &mut m.hierarchical_memory_limit,
                    "hierarchical_memsw_limit" => &mut m.hierarchical_swap_limit,
                    _ => return,
                };
                *field = value;
            });
        })?;

        for family in Family::ALL {
            match Self::read_entry(&dir, family) {
                Ok(entry) => stats.memory.update(|m| *family.entry(m) = entry),
                Err(err) if family.is_optional() && err.is_not_found() => {
                    debug!(
                        controller = %self.name(),
                        family = family.prefix(),
                        "Accounting family not available"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}
