mod render;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use parkvision_core::AppConfig;
use parkvision_engine::{Dashboard, DashboardSettings, OccupancyEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "parkvision-cli")]
#[command(about = "Parking availability dashboard in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the locations in the catalog
    Locations,
    /// Select a location and print its spot grid and analytics
    Snapshot {
        /// Location id; defaults to `PARKVISION_DEFAULT_LOCATION`
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run the live simulation and print every toggle
    Simulate {
        #[arg(long)]
        location: Option<String>,
        /// Milliseconds between toggles
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: Option<u64>,
        /// Stop after this many toggles; runs until ctrl-c when omitted
        #[arg(long)]
        ticks: Option<u64>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = parkvision_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Locations) => {
            let catalog = parkvision_core::resolve_catalog(&config)?;
            print!("{}", render::render_locations(catalog.list()));
        }
        Some(Commands::Snapshot { location, seed }) => {
            let settings = settings_for(&config, location, None, seed);
            let dashboard = build_dashboard(&config, &settings)?;
            print!("{}", render::render_overview(&dashboard.overview()));
        }
        Some(Commands::Simulate {
            location,
            interval_ms,
            ticks,
            seed,
        }) => {
            let settings = settings_for(&config, location, interval_ms, seed);
            let mut dashboard = build_dashboard(&config, &settings)?;
            run_simulation(&mut dashboard, ticks).await;
        }
        None => println!("parkvision-cli: try `locations`, `snapshot` or `simulate`"),
    }

    Ok(())
}

fn settings_for(
    config: &AppConfig,
    location: Option<String>,
    interval_ms: Option<u64>,
    seed: Option<u64>,
) -> DashboardSettings {
    let mut settings = DashboardSettings::from_app_config(config);
    if let Some(location) = location {
        settings.default_location = location;
    }
    if let Some(interval_ms) = interval_ms {
        settings.sim_interval = Duration::from_millis(interval_ms);
    }
    settings.rng_seed = seed.or(settings.rng_seed);
    settings
}

fn build_dashboard(config: &AppConfig, settings: &DashboardSettings) -> anyhow::Result<Dashboard> {
    let catalog = Arc::new(parkvision_core::resolve_catalog(config)?);
    let dashboard = Dashboard::new(catalog, settings)?;
    Ok(dashboard)
}

async fn run_simulation(dashboard: &mut Dashboard, ticks: Option<u64>) {
    let mut events = dashboard.subscribe();
    print!("{}", render::render_overview(&dashboard.overview()));
    dashboard.start_simulation();
    tracing::info!(
        interval_ms = u64::try_from(dashboard.simulation_interval().as_millis()).unwrap_or(u64::MAX),
        "simulation running, press ctrl-c to stop"
    );

    let mut seen = 0_u64;
    while ticks.is_none_or(|limit| seen < limit) {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => break,
        };
        match event {
            Ok(OccupancyEvent::SpotToggled { spot_id, status }) => {
                seen += 1;
                let overview = dashboard.overview();
                println!(
                    "#{seen} {spot_id} -> {status} | {}",
                    render::render_analytics(&overview.analytics)
                );
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event stream lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }

    dashboard.stop_simulation();
    print!("{}", render::render_overview(&dashboard.overview()));
}
