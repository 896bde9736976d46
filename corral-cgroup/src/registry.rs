//! Ordered collection of resource controllers

use std::collections::BTreeMap;
use std::path::Path;
use std::thread;

use corral_core::{ControllerName, EntityPath, Error, Resources, Result, Stats};
use tracing::{debug, info};

use crate::controller::ResourceController;
use crate::{CpuController, CpuacctController, MemoryController, PidsController};

/// Controllers keyed by name, iterated in [`ControllerName`] order
///
/// # Example
/// ```no_run
/// use corral_cgroup::ControllerRegistry;
/// use corral_core::{EntityPath, Resources};
///
/// # fn example() -> corral_core::Result<()> {
/// let registry = ControllerRegistry::with_defaults("/sys/fs/cgroup");
/// let entity = EntityPath::new("corral/web")?;
///
/// registry.create(&entity, &Resources::default())?;
/// let stats = registry.stat_concurrent(&entity)?;
/// println!("{:?}", stats.snapshot());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ControllerRegistry {
    controllers: BTreeMap<ControllerName, Box<dyn ResourceController>>,
}

impl ControllerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in controller under `hierarchy_root`
    #[must_use]
    pub fn with_defaults(hierarchy_root: impl AsRef<Path>) -> Self {
        Self::with_selected(hierarchy_root, &ControllerName::ALL)
    }

    /// Registry holding the built-in controllers named in `names`
    ///
    /// Repeated names are registered once.
    #[must_use]
    pub fn with_selected(hierarchy_root: impl AsRef<Path>, names: &[ControllerName]) -> Self {
        let root = hierarchy_root.as_ref();
        let mut registry = Self::new();

        for &name in names {
            let controller: Box<dyn ResourceController> = match name {
                ControllerName::Cpu => Box::new(CpuController::new(root)),
                ControllerName::Cpuacct => Box::new(CpuacctController::new(root)),
                ControllerName::Memory => Box::new(MemoryController::new(root)),
                ControllerName::Pids => Box::new(PidsController::new(root)),
            };
            registry.controllers.entry(name).or_insert(controller);
        }

        debug!(
            root = %root.display(),
            controllers = registry.len(),
            "Controller registry composed"
        );
        registry
    }

    /// Add a controller
    ///
    /// # Errors
    /// Returns `DuplicateController` if one with the same name is present
    pub fn register(&mut self, controller: Box<dyn ResourceController>) -> Result<()> {
        let name = controller.name();
        if self.controllers.contains_key(&name) {
            return Err(Error::DuplicateController {
                name: name.to_string(),
            });
        }
        self.controllers.insert(name, controller);
        Ok(())
    }

    /// Look up a controller by name
    #[must_use]
    pub fn get(&self, name: ControllerName) -> Option<&dyn ResourceController> {
        self.controllers.get(&name).map(AsRef::as_ref)
    }

    /// Registered names, in application order
    pub fn names(&self) -> impl Iterator<Item = ControllerName> + '_ {
        self.controllers.keys().copied()
    }

    /// Registered controllers, in application order
    pub fn iter(&self) -> impl Iterator<Item = &dyn ResourceController> + '_ {
        self.controllers.values().map(AsRef::as_ref)
    }

    /// Number of registered controllers
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Whether no controller is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Run [`ResourceController::create`] on every controller in order
    ///
    /// # Errors
    /// Stops at the first failing controller; earlier ones stay applied
    pub fn create(&self, entity: &EntityPath, resources: &Resources) -> Result<()> {
        for controller in self.iter() {
            controller.create(entity, resources)?;
        }
        info!(entity = %entity, controllers = self.len(), "Resources applied");
        Ok(())
    }

    /// Run [`ResourceController::update`] on every controller in order
    ///
    /// # Errors
    /// Stops at the first failing controller; earlier ones stay applied
    pub fn update(&self, entity: &EntityPath, resources: &Resources) -> Result<()> {
        for controller in self.iter() {
            controller.update(entity, resources)?;
        }
        info!(entity = %entity, controllers = self.len(), "Resources updated");
        Ok(())
    }

    /// Collect stats from every controller, one after the other
    ///
    /// # Errors
    /// Returns the first failure; later controllers are not consulted
    pub fn stat(&self, entity: &EntityPath) -> Result<Stats> {
        let stats = Stats::new();
        for controller in self.iter() {
            controller.stat(entity, &stats)?;
        }
        Ok(stats)
    }

    /// Collect stats with one thread per controller, all writing into the
    /// same aggregate
    ///
    /// Every controller runs to completion.
    ///
    /// # Errors
    /// Returns the failure of the first failing controller in registry order
    pub fn stat_concurrent(&self, entity: &EntityPath) -> Result<Stats> {
        let stats = Stats::new();

        let results: Vec<Result<()>> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .iter()
                .map(|controller| {
                    let stats = &stats;
                    scope.spawn(move || controller.stat(entity, stats))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        results.into_iter().collect::<Result<()>>()?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_in_order() {
        let registry = ControllerRegistry::with_defaults("/sys/fs/cgroup");
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ControllerName::ALL.to_vec());
    }

    #[test]
    fn test_selected_order_is_canonical() {
        let registry = ControllerRegistry::with_selected(
            "/sys/fs/cgroup",
            &[ControllerName::Pids, ControllerName::Cpu, ControllerName::Pids],
        );
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec![ControllerName::Cpu, ControllerName::Pids]);
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = ControllerRegistry::new();
        assert!(registry.is_empty());

        registry
            .register(Box::new(CpuController::new("/sys/fs/cgroup")))
            .unwrap();
        let err = registry
            .register(Box::new(CpuController::new("/tmp")))
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateController { .. }));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(ControllerName::Cpu).unwrap().root(),
            Path::new("/sys/fs/cgroup/cpu")
        );
    }

    #[test]
    fn test_get_missing() {
        let registry = ControllerRegistry::with_selected("/", &[ControllerName::Memory]);
        assert!(registry.get(ControllerName::Cpu).is_none());
        assert!(registry.get(ControllerName::Memory).is_some());
    }
}
