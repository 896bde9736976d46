//! cgroup resource controllers with concurrent stats aggregation
//!
//! Each kernel controller (cpu, cpuacct, memory, pids) is modeled as a
//! [`ResourceController`] owning `<hierarchy-root>/<name>`. Controllers turn
//! a [`Resources`](corral_core::Resources) spec into tunable file writes and
//! read their counters into a shared [`Stats`](corral_core::Stats)
//! aggregate, possibly from several threads at once.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod controller;
pub mod cpu;
pub mod cpuacct;
pub mod fsutil;
pub mod kv;
pub mod memory;
pub mod monitor;
pub mod pids;
pub mod registry;

pub use controller::ResourceController;
pub use cpu::CpuController;
pub use cpuacct::CpuacctController;
pub use memory::MemoryController;
pub use monitor::StatsMonitor;
pub use pids::PidsController;
pub use registry::ControllerRegistry;

// Re-export commonly used types
pub use corral_core::{ControllerName, EntityPath, Resources, Stats, StatsSnapshot};

/// Default mount point of the cgroup hierarchy
pub const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Mode of directories created under a controller root
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Mode of tunable files that did not exist yet
pub const DEFAULT_FILE_MODE: u32 = 0o644;
