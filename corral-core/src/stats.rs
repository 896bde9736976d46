//! Shared statistics aggregate
//!
//! A [`Stats`] value is created per collection, handed by reference to every
//! controller (possibly on different threads), and read once all of them
//! have returned. Each sub-stat kind lives in its own [`Slot`] with its own
//! lock, so controllers filling unrelated slots never contend, while the
//! `cpu` and `cpuacct` controllers can both fill the CPU slot safely.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One independently locked, lazily allocated sub-stat
#[derive(Debug, Default)]
pub struct Slot<T> {
    inner: Mutex<Option<T>>,
}

impl<T: Default> Slot<T> {
    /// Create an empty slot
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    // Slot contents are plain counters, a panicking writer cannot leave
    // them in a state worse than partially updated.
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate the backing value if no writer has done so yet
    ///
    /// Never replaces an existing value.
    pub fn init(&self) {
        self.lock().get_or_insert_with(T::default);
    }

    /// Mutate the backing value under the slot lock, allocating it first if
    /// needed
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock();
        f(guard.get_or_insert_with(T::default))
    }

    /// Whether a writer has allocated this slot
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.lock().is_some()
    }
}

impl<T: Clone> Slot<T> {
    /// Copy of the current value, `None` if never allocated
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Statistics aggregate shared by all controllers during one collection
#[derive(Debug, Default)]
pub struct Stats {
    /// CPU timing, written by `cpu` (throttling) and `cpuacct` (usage)
    pub cpu: Slot<CpuStat>,
    /// Memory counters, written by `memory`
    pub memory: Slot<MemoryStat>,
    /// Task counters, written by `pids`
    pub pids: Slot<PidsStat>,
}

impl Stats {
    /// Create an empty aggregate
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cpu: Slot::new(),
            memory: Slot::new(),
            pids: Slot::new(),
        }
    }

    /// Copy the current contents into a plain value
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cpu: self.cpu.get(),
            memory: self.memory.get(),
            pids: self.pids.get(),
        }
    }
}

/// Point-in-time copy of a [`Stats`] aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// CPU timing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuStat>,
    /// Memory counters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryStat>,
    /// Task counters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pids: Option<PidsStat>,
}

/// CPU statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuStat {
    /// Consumed CPU time
    pub usage: CpuUsage,
    /// CFS bandwidth throttling
    pub throttling: ThrottlingStat,
}

/// Consumed CPU time, all values in nanoseconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuUsage {
    /// Total CPU time
    pub total: u64,
    /// Time spent in kernel mode
    pub kernel: u64,
    /// Time spent in user mode
    pub user: u64,
    /// Total CPU time per CPU
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub per_cpu: Vec<u64>,
}

/// CFS bandwidth throttling counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottlingStat {
    /// Enforcement periods elapsed
    pub periods: u64,
    /// Periods in which the group was throttled
    pub throttled_periods: u64,
    /// Cumulative time throttled, in nanoseconds
    pub throttled_time: u64,
}

/// Usage counters of one memory accounting family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Current usage in bytes
    pub usage: u64,
    /// Peak usage in bytes
    pub max: u64,
    /// Number of times the limit was hit
    pub failcnt: u64,
    /// Configured limit in bytes
    pub limit: u64,
}

/// Memory statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStat {
    /// Page cache
    pub cache: u64,
    /// Anonymous and swap cache
    pub rss: u64,
    /// Anonymous transparent hugepages
    pub rss_huge: u64,
    /// Memory mapped files
    pub mapped_file: u64,
    /// Dirty page cache
    pub dirty: u64,
    /// Page cache queued for writeback
    pub writeback: u64,
    /// Pages charged
    pub pgpgin: u64,
    /// Pages uncharged
    pub pgpgout: u64,
    /// Page faults
    pub pgfault: u64,
    /// Major page faults
    pub pgmajfault: u64,
    /// Inactive anonymous memory
    pub inactive_anon: u64,
    /// Active anonymous memory
    pub active_anon: u64,
    /// Inactive file-backed memory
    pub inactive_file: u64,
    /// Active file-backed memory
    pub active_file: u64,
    /// Unevictable memory
    pub unevictable: u64,
    /// Limit inherited from the hierarchy
    pub hierarchical_memory_limit: u64,
    /// Memory plus swap limit inherited from the hierarchy
    pub hierarchical_swap_limit: u64,

    /// `memory.*` accounting
    pub usage: MemoryEntry,
    /// `memory.memsw.*` accounting
    pub swap: MemoryEntry,
    /// `memory.kmem.*` accounting
    pub kernel: MemoryEntry,
    /// `memory.kmem.tcp.*` accounting
    pub kernel_tcp: MemoryEntry,
}

/// Task counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidsStat {
    /// Number of tasks currently in the group
    pub current: u64,
    /// Task limit, 0 when unlimited
    pub limit: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn slot_starts_empty() {
        let stats = Stats::new();
        assert!(!stats.cpu.is_populated());
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn init_does_not_replace() {
        let slot: Slot<ThrottlingStat> = Slot::new();
        slot.update(|t| t.periods = 7);
        slot.init();
        assert_eq!(slot.get().unwrap().periods, 7);
    }

    #[test]
    fn concurrent_writers_converge() {
        for _ in 0..100 {
            let stats = Arc::new(Stats::new());

            let throttling = {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    stats.cpu.init();
                    stats.cpu.update(|c| c.throttling.periods = 10);
                    stats.cpu.update(|c| c.throttling.throttled_periods = 2);
                })
            };
            let usage = {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    stats.cpu.init();
                    stats.cpu.update(|c| c.usage.total = 500);
                    stats.cpu.update(|c| c.usage.per_cpu = vec![200, 300]);
                })
            };
            throttling.join().unwrap();
            usage.join().unwrap();

            let cpu = stats.cpu.get().unwrap();
            assert_eq!(cpu.throttling.periods, 10);
            assert_eq!(cpu.throttling.throttled_periods, 2);
            assert_eq!(cpu.usage.total, 500);
            assert_eq!(cpu.usage.per_cpu, vec![200, 300]);
        }
    }

    #[test]
    fn snapshot_serde_skips_empty_slots() {
        let stats = Stats::new();
        stats.pids.update(|p| {
            p.current = 3;
            p.limit = 64;
        });

        let json = serde_json::to_string(&stats.snapshot()).unwrap();
        assert_eq!(json, r#"{"pids":{"current":3,"limit":64}}"#);

        let back: StatsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats.snapshot());
    }
}
