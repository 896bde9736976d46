//! The contract every resource controller satisfies

use std::path::{Path, PathBuf};

use corral_core::{ControllerName, EntityPath, Resources, Result, Stats};

/// One kernel resource controller (cpu, cpuacct, memory, pids, ...)
///
/// A controller owns a single root, `<hierarchy-root>/<name>`, fixed at
/// construction. It materializes its slice of a [`Resources`] spec as file
/// writes under that root and reads its own counters back into a shared
/// [`Stats`] aggregate.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`: the registry may run several
/// controllers' `stat` concurrently against the same aggregate.
pub trait ResourceController: Send + Sync {
    /// Stable identity of this controller
    fn name(&self) -> ControllerName;

    /// Root directory of this controller
    fn root(&self) -> &Path;

    /// Directory of `entity` under this controller's root
    ///
    /// Pure path arithmetic, no I/O.
    fn path(&self, entity: &EntityPath) -> PathBuf {
        self.root().join(entity)
    }

    /// Create the entity directory if needed, then write every present field
    /// of this controller's slice of `resources`
    ///
    /// Absent fields are left untouched. Writes are not rolled back when a
    /// later one fails.
    ///
    /// # Errors
    /// Returns `DirectoryCreate` or `FileWrite` on the first failing step
    fn create(&self, entity: &EntityPath, resources: &Resources) -> Result<()>;

    /// Re-apply `resources`; identical to [`create`](Self::create)
    ///
    /// # Errors
    /// Same as [`create`](Self::create)
    fn update(&self, entity: &EntityPath, resources: &Resources) -> Result<()> {
        self.create(entity, resources)
    }

    /// Read this controller's counters for `entity` into `stats`
    ///
    /// Unknown keys are ignored. On failure, values already stored in
    /// `stats` stay there.
    ///
    /// # Errors
    /// Returns `FileOpen` if a stat file is missing (the slot is left
    /// untouched), `FileRead` or `Parse` if its contents cannot be read
    fn stat(&self, entity: &EntityPath, stats: &Stats) -> Result<()>;
}

impl std::fmt::Debug for dyn ResourceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceController")
            .field("name", &self.name())
            .field("root", &self.root())
            .finish()
    }
}
