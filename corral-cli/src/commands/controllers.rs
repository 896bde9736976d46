//! Controllers command implementation

use anyhow::Result;
use corral_cgroup::ControllerRegistry;

pub fn execute(registry: &ControllerRegistry) -> Result<()> {
    println!("{:<10} ROOT", "NAME");
    for controller in registry.iter() {
        println!("{:<10} {}", controller.name(), controller.root().display());
    }
    Ok(())
}
