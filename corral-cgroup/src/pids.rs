//! Process number controller

use std::path::{Path, PathBuf};

use corral_core::{ControllerName, EntityPath, Error, Resources, Result, Stats};
use tracing::debug;

use crate::controller::ResourceController;
use crate::{fsutil, kv};

const PIDS_MAX: &str = "pids.max";
const PIDS_CURRENT: &str = "pids.current";

/// `pids` controller
#[derive(Debug, Clone)]
pub struct PidsController {
    root: PathBuf,
}

impl PidsController {
    /// Create a controller rooted at `<hierarchy_root>/pids`
    #[must_use]
    pub fn new(hierarchy_root: impl AsRef<Path>) -> Self {
        Self {
            root: hierarchy_root.as_ref().join(ControllerName::Pids.as_str()),
        }
    }
}

impl ResourceController for PidsController {
    fn name(&self) -> ControllerName {
        ControllerName::Pids
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn create(&self, entity: &EntityPath, resources: &Resources) -> Result<()> {
        let dir = self.path(entity);
        fsutil::ensure_dir(&dir)?;

        if let Some(limit) = resources.pids.and_then(|pids| pids.limit) {
            fsutil::write_tunable(&dir, PIDS_MAX, limit)?;
            debug!(controller = %self.name(), entity = %entity, limit, "Applied pids limit");
        }
        Ok(())
    }

    fn stat(&self, entity: &EntityPath, stats: &Stats) -> Result<()> {
        let dir = self.path(entity);

        let current = fsutil::read_uint(&dir.join(PIDS_CURRENT))?;
        stats.pids.update(|pids| pids.current = current);

        let max_path = dir.join(PIDS_MAX);
        let content = fsutil::read_single(&max_path)?;
        let limit = kv::parse_limit(&content).map_err(|source| Error::Parse {
            path: max_path,
            source,
        })?;
        stats.pids.update(|pids| pids.limit = limit.unwrap_or(0));

        Ok(())
    }
}
