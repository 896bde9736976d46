//! Apply and update command implementation

use anyhow::{Context, Result};
use corral_cgroup::ControllerRegistry;
use corral_core::EntityPath;
use tracing::info;

use crate::cli::LimitArgs;

#[derive(Debug, Clone, Copy)]
pub enum Mode {
    Create,
    Update,
}

pub fn execute(registry: &ControllerRegistry, args: &LimitArgs, mode: Mode) -> Result<()> {
    let entity = EntityPath::new(&args.path).context("Invalid entity path")?;
    let resources = args.resources()?;

    info!(entity = %entity, ?mode, "Applying resources");

    match mode {
        Mode::Create => registry
            .create(&entity, &resources)
            .context("Failed to apply resources")?,
        Mode::Update => registry
            .update(&entity, &resources)
            .context("Failed to update resources")?,
    }

    println!("Applied resources to '{entity}':");
    for controller in registry.iter() {
        println!("  {:<8} {}", controller.name(), controller.path(&entity).display());
    }

    Ok(())
}
