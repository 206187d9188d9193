//! Sentinel - Main Entry Point
//!
//! Reads a perception feed, validates and deduplicates detections, persists
//! first-sighting telemetry and logs the live rain x traffic risk level.

mod constants;
mod logic;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use logic::config::PipelineConfig;
use logic::perception::FeedReader;
use logic::pipeline::Pipeline;
use logic::telemetry::{RunMode, SqliteStore, TelemetryStore};
use logic::weather::{OpenMeteoClient, SimulatedWeather, WeatherProvider};

#[derive(Parser, Debug)]
#[command(author, version, about = "Road traffic and flood-risk sentinel", long_about = None)]
struct Args {
    /// Perception feed (JSON Lines, one frame per line)
    #[arg(short, long)]
    input: PathBuf,

    /// JSON config file (falls back to SENTINEL_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Telemetry database path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Use fixed storm weather instead of the live provider
    #[arg(long, default_value_t = false)]
    simulate: bool,

    /// Process every Nth frame
    #[arg(long)]
    frame_skip: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting {} v{}", constants::APP_NAME, constants::APP_VERSION);

    let config = load_config(&args)?;
    let db_path = config.database_path();
    log::info!(
        "Site {} ({:.4}, {:.4}), frame skip {}, thresholds {:.1} mm / {} vehicles",
        config.city,
        config.latitude,
        config.longitude,
        config.frame_skip_interval,
        config.rain_mm_threshold,
        config.vehicle_count_threshold
    );

    let provider: Box<dyn WeatherProvider> = match config.run_mode {
        RunMode::Simulated => Box::new(SimulatedWeather::storm()),
        RunMode::Live => Box::new(OpenMeteoClient::new(
            config.latitude,
            config.longitude,
            config.weather_timeout(),
        )),
    };

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("opening telemetry store {:?}", db_path))?;
    log::info!(
        "Telemetry store {:?}: {} event(s) from earlier runs",
        store.path().unwrap_or(db_path.as_path()),
        store.count()?
    );
    let feed = FeedReader::open(&args.input)?;

    let stop = Arc::new(AtomicBool::new(false));
    install_stop_handler(stop.clone());

    let summary = Pipeline::new(config, store, provider)
        .run(feed, &stop)
        .context("pipeline run failed")?;

    let store = SqliteStore::open(&db_path)?;
    let persisted = store.count_for_run(&summary.run_id)?;
    store.close()?;
    if persisted != summary.events_emitted {
        log::warn!(
            "Run {} reported {} event(s) but {} are stored",
            summary.run_id,
            summary.events_emitted,
            persisted
        );
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Defaults, config file, environment, then CLI flags. Validated before use.
fn load_config(args: &Args) -> anyhow::Result<PipelineConfig> {
    let path = args.config.clone().or_else(constants::get_config_path);
    let mut config = PipelineConfig::load(path.as_deref())?;

    if let Some(db) = &args.db {
        config.database_path = Some(db.clone());
    }
    if let Some(n) = args.frame_skip {
        config.frame_skip_interval = n;
    }
    if args.simulate {
        config.run_mode = RunMode::Simulated;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Ctrl-C sets the stop flag; the run loop finishes the current cycle and
/// closes the store.
fn install_stop_handler(stop: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                log::warn!("Signal handler unavailable: {}", e);
                return;
            }
        };
        rt.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Ctrl-C received, stopping after current cycle");
                stop.store(true, Ordering::SeqCst);
            }
        });
    });
}
