use crate::cli::{Cli, Commands};
use anyhow::Result;
use corral_cgroup::ControllerRegistry;

pub mod apply;
pub mod controllers;
pub mod stats;
pub mod watch;

/// Dispatch command to appropriate handler
pub async fn dispatch(cli: Cli) -> Result<()> {
    let registry = ControllerRegistry::with_selected(&cli.root, &cli.selected_controllers());

    match cli.command {
        Commands::Apply(args) => apply::execute(&registry, &args, apply::Mode::Create),

        Commands::Update(args) => apply::execute(&registry, &args, apply::Mode::Update),

        Commands::Stats {
            path,
            json,
            sequential,
        } => stats::execute(&registry, &path, json, sequential),

        Commands::Watch {
            path,
            interval,
            count,
        } => watch::execute(registry, &path, interval, count).await,

        Commands::Controllers => controllers::execute(&registry),
    }
}
