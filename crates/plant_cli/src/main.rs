use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plant_core::{Catalog, MemorySink, Plant, PlantState, Status};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "plant_cli", about = "Power plant simulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation headless for a fixed number of ticks.
    Run {
        #[arg(long)]
        ticks: u64,
        #[arg(long)]
        seed: Option<u64>,
        /// Plant catalog JSON. The built-in plant is used when omitted.
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        print_every: u64,
        /// Operator command as TICK:IDENTIFIER:ACTION, e.g. 5:reactor_1:stop.
        /// Applied before that tick runs. Repeatable.
        #[arg(long = "action")]
        actions: Vec<ScheduledAction>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduledAction {
    at_tick: u64,
    identifier: String,
    action: String,
}

impl FromStr for ScheduledAction {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.splitn(3, ':');
        let (Some(tick), Some(identifier), Some(action)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("expected TICK:IDENTIFIER:ACTION, got '{raw}'"));
        };
        let at_tick = tick
            .parse()
            .map_err(|err| format!("bad tick '{tick}' in '{raw}': {err}"))?;
        Ok(Self {
            at_tick,
            identifier: identifier.to_string(),
            action: action.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::from_file(path)
            .with_context(|| format!("loading catalog: {}", path.display())),
        None => Ok(Catalog::default_plant()),
    }
}

fn run(
    ticks: u64,
    seed: Option<u64>,
    catalog: Option<&Path>,
    print_every: u64,
    actions: &[ScheduledAction],
) -> Result<()> {
    let catalog = load_catalog(catalog)?;
    let seed = seed.unwrap_or_else(rand::random);
    let plant = Plant::from_catalog(catalog, seed, MemorySink::new())
        .context("invalid plant catalog")?;

    println!(
        "Starting simulation: ticks={ticks} seed={seed} modules={} eligible={}",
        plant.snapshot().registry.len(),
        plant.snapshot().registry.eligible_count(),
    );
    println!("{}", "-".repeat(80));

    for tick in 0..ticks {
        for scheduled in actions.iter().filter(|a| a.at_tick == tick) {
            let outcome = plant.apply_action(&scheduled.identifier, &scheduled.action);
            println!("[tick={tick:04}] {outcome}");
        }

        plant.tick().context("recording tick reports")?;

        if print_every > 0 && (tick + 1) % print_every == 0 {
            print_status(&plant.snapshot());
        }
    }

    println!("{}", "-".repeat(80));
    println!(
        "Done. {} report records emitted over {} ticks.",
        plant.sink().len(),
        plant.tick_count()
    );
    print_status(&plant.snapshot());
    Ok(())
}

fn print_status(state: &PlantState) {
    println!("[tick={:04}]", state.meta.tick);
    for group in state.registry.categories() {
        println!("  {}", group.category);
        for module in &group.modules {
            let mut line = format!("    {:<26} {:<14}", module.name, module.status.label());
            if let Some(power) = module.telemetry.power_output_mw() {
                line.push_str(&format!(" power={power:7.1}MW"));
            }
            if let Some(temp) = module.telemetry.temp_c() {
                line.push_str(&format!(" temp={temp:6.1}C"));
            }
            if let Some(rpm) = module.telemetry.rpm() {
                line.push_str(&format!(" rpm={rpm}"));
            }
            if module.status.is_transient() || module.status == Status::Offline {
                line.push_str(" *");
            }
            println!("{line}");
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            ticks,
            seed,
            catalog,
            print_every,
            actions,
        } => run(ticks, seed, catalog.as_deref(), print_every, &actions)?,
    }
    Ok(())
}
