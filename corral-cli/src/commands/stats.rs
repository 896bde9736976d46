//! Stats command implementation

use anyhow::{Context, Result};
use corral_cgroup::ControllerRegistry;
use corral_core::{EntityPath, StatsSnapshot};

pub fn execute(registry: &ControllerRegistry, path: &str, json: bool, sequential: bool) -> Result<()> {
    tracing::info!(entity = path, sequential, "Getting stats");

    let entity = EntityPath::new(path).context("Invalid entity path")?;

    let stats = if sequential {
        registry.stat(&entity)
    } else {
        registry.stat_concurrent(&entity)
    }
    .context("Failed to read stats")?;
    let snapshot = stats.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_table(&entity, &snapshot);
    }

    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn print_table(entity: &EntityPath, snapshot: &StatsSnapshot) {
    println!("\nStats for '{entity}'");
    println!("{:-<60}", "");

    if let Some(cpu) = &snapshot.cpu {
        println!("CPU Usage:        {:.3}s", cpu.usage.total as f64 / 1e9);
        println!("CPU User:         {:.3}s", cpu.usage.user as f64 / 1e9);
        println!("CPU Kernel:       {:.3}s", cpu.usage.kernel as f64 / 1e9);
        println!("CPU Periods:      {}", cpu.throttling.periods);
        println!("CPU Throttled:    {}", cpu.throttling.throttled_periods);
        println!(
            "Throttled Time:   {:.3}s",
            cpu.throttling.throttled_time as f64 / 1e9
        );
    }

    if let Some(memory) = &snapshot.memory {
        println!("Memory Usage:     {} bytes", memory.usage.usage);
        println!("Memory Peak:      {} bytes", memory.usage.max);
        println!("Memory Limit:     {} bytes", memory.usage.limit);
        println!("Memory Failcnt:   {}", memory.usage.failcnt);
        println!("Cache:            {} bytes", memory.cache);
        println!("RSS:              {} bytes", memory.rss);
    }

    if let Some(pids) = &snapshot.pids {
        println!("Tasks:            {}", pids.current);
        if pids.limit == 0 {
            println!("Task Limit:       max");
        } else {
            println!("Task Limit:       {}", pids.limit);
        }
    }

    println!("{:-<60}", "");
}
