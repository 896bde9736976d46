//! corral core - resource specs, controller identity, and the shared stats
//! aggregate
//!
//! This crate provides the types exchanged between the cgroup controllers
//! and whatever orchestrates them.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod events;
pub mod resources;
pub mod stats;
pub mod types;

pub use error::{Error, ParseError, Result};
pub use events::MonitorEvent;
pub use resources::{CpuResources, MemoryResources, PidsResources, Resources};
pub use stats::{
    CpuStat, CpuUsage, MemoryEntry, MemoryStat, PidsStat, Slot, Stats, StatsSnapshot,
    ThrottlingStat,
};
pub use types::{ControllerName, EntityPath};
