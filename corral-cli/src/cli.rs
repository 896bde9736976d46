//! CLI argument definitions

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use corral_cgroup::DEFAULT_CGROUP_ROOT;
use corral_core::{ControllerName, CpuResources, MemoryResources, PidsResources, Resources};

#[derive(Parser)]
#[command(name = "corral")]
#[command(about = "Apply cgroup resource limits and read usage statistics", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Mount point of the cgroup hierarchy
    #[arg(long, global = true, env = "CORRAL_CGROUP_ROOT", default_value = DEFAULT_CGROUP_ROOT)]
    pub root: PathBuf,

    /// Only use these controllers (comma separated, default: all)
    #[arg(long, global = true, value_delimiter = ',')]
    pub controllers: Vec<ControllerName>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Controllers selected on the command line, all of them if none
    pub fn selected_controllers(&self) -> Vec<ControllerName> {
        if self.controllers.is_empty() {
            ControllerName::ALL.to_vec()
        } else {
            self.controllers.clone()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create entity directories and write resource limits
    Apply(LimitArgs),

    /// Re-apply resource limits to an existing entity
    Update(LimitArgs),

    /// Print usage statistics of an entity
    Stats {
        /// Entity path below each controller root
        #[arg(short, long)]
        path: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Read controllers one after the other instead of in parallel
        #[arg(long)]
        sequential: bool,
    },

    /// Periodically print usage statistics of an entity
    Watch {
        /// Entity path below each controller root
        #[arg(short, long)]
        path: String,

        /// Seconds between two samples
        #[arg(long, default_value = "1")]
        interval: u64,

        /// Stop after this many samples
        #[arg(long)]
        count: Option<u64>,
    },

    /// List the selected controllers and their roots
    Controllers,
}

#[derive(Args)]
pub struct LimitArgs {
    /// Entity path below each controller root
    #[arg(short, long)]
    pub path: String,

    /// JSON resource spec; flags below override its fields
    #[arg(long)]
    pub spec: Option<PathBuf>,

    /// CPU shares
    #[arg(long)]
    pub cpu_shares: Option<u64>,

    /// CFS quota in microseconds
    #[arg(long)]
    pub cpu_quota: Option<u64>,

    /// CFS period in microseconds
    #[arg(long)]
    pub cpu_period: Option<u64>,

    /// Realtime runtime in microseconds
    #[arg(long)]
    pub cpu_rt_runtime: Option<u64>,

    /// Realtime period in microseconds
    #[arg(long)]
    pub cpu_rt_period: Option<u64>,

    /// Memory limit in bytes
    #[arg(long)]
    pub memory_limit: Option<u64>,

    /// Memory soft limit in bytes
    #[arg(long)]
    pub memory_reservation: Option<u64>,

    /// Memory plus swap limit in bytes
    #[arg(long)]
    pub memory_swap: Option<u64>,

    /// Maximum number of tasks
    #[arg(long)]
    pub pids_limit: Option<u64>,
}

impl LimitArgs {
    /// Build the resource spec from `--spec` and the individual flags
    pub fn resources(&self) -> Result<Resources> {
        let mut resources = match &self.spec {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read spec {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Invalid resource spec {}", path.display()))?
            }
            None => Resources::default(),
        };

        let cpu = resources.cpu.get_or_insert_with(CpuResources::default);
        overlay(&mut cpu.shares, self.cpu_shares);
        overlay(&mut cpu.quota, self.cpu_quota);
        overlay(&mut cpu.period, self.cpu_period);
        overlay(&mut cpu.realtime_runtime, self.cpu_rt_runtime);
        overlay(&mut cpu.realtime_period, self.cpu_rt_period);

        let memory = resources.memory.get_or_insert_with(MemoryResources::default);
        overlay(&mut memory.limit, self.memory_limit);
        overlay(&mut memory.reservation, self.memory_reservation);
        overlay(&mut memory.swap, self.memory_swap);

        let pids = resources.pids.get_or_insert_with(PidsResources::default);
        overlay(&mut pids.limit, self.pids_limit);

        Ok(resources)
    }
}

fn overlay(field: &mut Option<u64>, flag: Option<u64>) {
    if flag.is_some() {
        *field = flag;
    }
}
