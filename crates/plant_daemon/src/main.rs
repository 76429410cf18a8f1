use anyhow::{Context, Result};
use axum::http::HeaderValue;
use clap::Parser;
use plant_core::{Catalog, Plant};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod reports;
mod routes;
mod state;
mod tick_loop;

use reports::{ReportFileWriter, ReportHub, DEFAULT_HISTORY};
use state::AppState;

#[derive(Parser)]
#[command(name = "plant_daemon", about = "Power plant simulation daemon")]
struct Cli {
    #[arg(long, default_value_t = 3001)]
    port: u16,
    /// Timer tick rate. 0 disables the timer; ticks then only happen through
    /// POST /api/v1/tick.
    #[arg(long, default_value_t = 1.0)]
    ticks_per_sec: f64,
    /// Stop the timer after this many ticks.
    #[arg(long)]
    max_ticks: Option<u64>,
    /// RNG seed. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Plant catalog JSON. The built-in plant is used when omitted.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Append every report record to this JSON-lines file.
    #[arg(long)]
    reports_file: Option<PathBuf>,
    /// Report records kept in memory for /api/v1/reports.
    #[arg(long, default_value_t = DEFAULT_HISTORY)]
    report_history: usize,
    #[arg(long, default_value = "http://localhost:5173")]
    cors_origin: String,
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::from_file(path)
            .with_context(|| format!("loading catalog: {}", path.display())),
        None => Ok(Catalog::default_plant()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let period = tick_loop::tick_period(cli.ticks_per_sec)?;

    let catalog = load_catalog(cli.catalog.as_deref())?;
    let file = cli
        .reports_file
        .as_deref()
        .map(|path| {
            ReportFileWriter::open(path)
                .with_context(|| format!("opening reports file: {}", path.display()))
        })
        .transpose()?;
    let hub = ReportHub::new(file, cli.report_history);

    let seed = cli.seed.unwrap_or_else(rand::random);
    let plant = Arc::new(Plant::from_catalog(catalog, seed, hub).context("invalid plant catalog")?);
    let paused = Arc::new(AtomicBool::new(false));

    tracing::info!(
        seed,
        modules = plant.snapshot().registry.len(),
        ticks_per_sec = cli.ticks_per_sec,
        "plant initialised"
    );

    if let Some(period) = period {
        tokio::spawn(tick_loop::run_tick_loop(
            plant.clone(),
            paused.clone(),
            period,
            cli.max_ticks,
        ));
    }

    let cors_origin: HeaderValue = cli
        .cors_origin
        .parse()
        .with_context(|| format!("invalid --cors-origin: {}", cli.cors_origin))?;
    let app = routes::make_router_with_cors(
        AppState {
            plant,
            paused,
            ticks_per_sec: cli.ticks_per_sec,
        },
        cors_origin,
    );

    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("listening on http://{addr}");
    axum::serve(listener, app).await.context("serving http")?;
    Ok(())
}
