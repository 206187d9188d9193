//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults and the
//! environment variables that override them.

use std::path::PathBuf;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Sentinel";

// ============================================
// Pipeline defaults
// ============================================

/// Minimum model confidence for a detection to be considered at all
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.40;

/// Run every Nth frame through the pipeline
pub const DEFAULT_FRAME_SKIP: u32 = 2;

/// Output resolution the class profiles are calibrated for
pub const DEFAULT_OUTPUT_WIDTH: u32 = 1280;
pub const DEFAULT_OUTPUT_HEIGHT: u32 = 720;

/// Monitored site (Uberlandia, MG)
pub const DEFAULT_LATITUDE: f64 = -18.9186;
pub const DEFAULT_LONGITUDE: f64 = -48.2772;
pub const DEFAULT_CITY: &str = "Uberlandia";

/// Weather request timeout (seconds)
pub const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 5;

/// Tries per telemetry append before the run is halted
pub const DEFAULT_APPEND_ATTEMPTS: u32 = 2;

/// Directory under the user data dir holding the telemetry database
pub const DATA_DIR_NAME: &str = "rondon-sentinel";

pub const DB_FILE_NAME: &str = "sentinel.db";

// ============================================
// Environment variables
// ============================================

pub const ENV_CONFIG_PATH: &str = "SENTINEL_CONFIG";
pub const ENV_CONFIDENCE_THRESHOLD: &str = "SENTINEL_CONFIDENCE_THRESHOLD";
pub const ENV_FRAME_SKIP: &str = "SENTINEL_FRAME_SKIP";
pub const ENV_RAIN_MM_THRESHOLD: &str = "SENTINEL_RAIN_MM_THRESHOLD";
pub const ENV_VEHICLE_THRESHOLD: &str = "SENTINEL_VEHICLE_THRESHOLD";
pub const ENV_RUN_MODE: &str = "SENTINEL_RUN_MODE";
pub const ENV_DB_PATH: &str = "SENTINEL_DB_PATH";

/// Read a non-empty environment variable
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Config file path from environment, if set
pub fn get_config_path() -> Option<PathBuf> {
    env_value(ENV_CONFIG_PATH).map(PathBuf::from)
}

/// Default telemetry database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
        .join(DB_FILE_NAME)
}
