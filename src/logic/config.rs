//! Pipeline Configuration
//!
//! Defaults, optional JSON config file, then environment overrides.
//! Everything is validated once at startup; an invalid config never
//! reaches the first cycle.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{self, env_value};
use crate::logic::detection::ProfileTable;
use crate::logic::risk::{RiskThresholds, DEFAULT_RAIN_MM_THRESHOLD, DEFAULT_VEHICLE_COUNT_THRESHOLD};
use crate::logic::telemetry::RunMode;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Detections below this confidence never reach morphology
    pub confidence_threshold: f32,
    /// Process every Nth frame, drop the rest
    pub frame_skip_interval: u32,
    pub rain_mm_threshold: f64,
    pub vehicle_count_threshold: usize,
    pub output_width: u32,
    pub output_height: u32,
    pub run_mode: RunMode,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub weather_timeout_secs: u64,
    /// Re-query weather this often (None = run-start snapshot only)
    pub weather_refresh_secs: Option<u64>,
    /// Tries per telemetry append
    pub append_attempts: u32,
    /// None = default location under the user data dir
    pub database_path: Option<PathBuf>,
    pub profiles: ProfileTable,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: constants::DEFAULT_CONFIDENCE_THRESHOLD,
            frame_skip_interval: constants::DEFAULT_FRAME_SKIP,
            rain_mm_threshold: DEFAULT_RAIN_MM_THRESHOLD,
            vehicle_count_threshold: DEFAULT_VEHICLE_COUNT_THRESHOLD,
            output_width: constants::DEFAULT_OUTPUT_WIDTH,
            output_height: constants::DEFAULT_OUTPUT_HEIGHT,
            run_mode: RunMode::Live,
            latitude: constants::DEFAULT_LATITUDE,
            longitude: constants::DEFAULT_LONGITUDE,
            city: constants::DEFAULT_CITY.to_string(),
            weather_timeout_secs: constants::DEFAULT_WEATHER_TIMEOUT_SECS,
            weather_refresh_secs: None,
            append_attempts: constants::DEFAULT_APPEND_ATTEMPTS,
            database_path: None,
            profiles: ProfileTable::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults or file, then environment overrides. Not yet validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                log::info!("Loading config from {:?}", p);
                Self::from_file(p)?
            }
            None => Self::default(),
        };
        config.apply(&EnvOverrides::from_env()?);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &EnvOverrides) {
        if let Some(v) = overrides.confidence_threshold {
            self.confidence_threshold = v;
        }
        if let Some(v) = overrides.frame_skip_interval {
            self.frame_skip_interval = v;
        }
        if let Some(v) = overrides.rain_mm_threshold {
            self.rain_mm_threshold = v;
        }
        if let Some(v) = overrides.vehicle_count_threshold {
            self.vehicle_count_threshold = v;
        }
        if let Some(v) = overrides.run_mode {
            self.run_mode = v;
        }
        if let Some(v) = &overrides.database_path {
            self.database_path = Some(v.clone());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::invalid(
                "confidence_threshold",
                format!("{} is outside [0, 1]", self.confidence_threshold),
            ));
        }
        if self.frame_skip_interval == 0 {
            return Err(ConfigError::invalid("frame_skip_interval", "must be at least 1"));
        }
        if !self.rain_mm_threshold.is_finite() || self.rain_mm_threshold < 0.0 {
            return Err(ConfigError::invalid(
                "rain_mm_threshold",
                format!("{} must be a non-negative number", self.rain_mm_threshold),
            ));
        }
        if self.vehicle_count_threshold == 0 {
            return Err(ConfigError::invalid("vehicle_count_threshold", "must be at least 1"));
        }
        if self.output_width == 0 || self.output_height == 0 {
            return Err(ConfigError::invalid(
                "output_width/output_height",
                format!("{}x{} has a zero dimension", self.output_width, self.output_height),
            ));
        }
        if self.append_attempts == 0 {
            return Err(ConfigError::invalid("append_attempts", "must be at least 1"));
        }
        if self.weather_refresh_secs == Some(0) {
            return Err(ConfigError::invalid("weather_refresh_secs", "must be at least 1 when set"));
        }
        if self.profiles.is_empty() {
            return Err(ConfigError::invalid("profiles", "at least one class profile is required"));
        }
        for (label, profile) in self.profiles.iter() {
            profile
                .check()
                .map_err(|reason| ConfigError::invalid(&format!("profiles.{}", label), reason))?;
        }
        Ok(())
    }

    pub fn thresholds(&self) -> RiskThresholds {
        RiskThresholds::new(self.rain_mm_threshold, self.vehicle_count_threshold)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(constants::default_database_path)
    }

    pub fn weather_timeout(&self) -> Duration {
        Duration::from_secs(self.weather_timeout_secs)
    }

    pub fn weather_refresh(&self) -> Option<Duration> {
        self.weather_refresh_secs.map(Duration::from_secs)
    }
}

// ============================================================================
// ENVIRONMENT OVERRIDES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub confidence_threshold: Option<f32>,
    pub frame_skip_interval: Option<u32>,
    pub rain_mm_threshold: Option<f64>,
    pub vehicle_count_threshold: Option<usize>,
    pub run_mode: Option<RunMode>,
    pub database_path: Option<PathBuf>,
}

impl EnvOverrides {
    /// Read overrides from `SENTINEL_*` variables. A set but unparsable
    /// value is a configuration error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_value)
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            confidence_threshold: parse_var(&lookup, constants::ENV_CONFIDENCE_THRESHOLD)?,
            frame_skip_interval: parse_var(&lookup, constants::ENV_FRAME_SKIP)?,
            rain_mm_threshold: parse_var(&lookup, constants::ENV_RAIN_MM_THRESHOLD)?,
            vehicle_count_threshold: parse_var(&lookup, constants::ENV_VEHICLE_THRESHOLD)?,
            run_mode: match lookup(constants::ENV_RUN_MODE) {
                Some(raw) => Some(
                    raw.parse()
                        .map_err(|reason: String| ConfigError::invalid(constants::ENV_RUN_MODE, reason))?,
                ),
                None => None,
            },
            database_path: lookup(constants::ENV_DB_PATH).map(PathBuf::from),
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::invalid(name, format!("'{}': {}", raw, e))),
        None => Ok(None),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::detection::ClassProfile;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.confidence_threshold, 0.40);
        assert_eq!(config.frame_skip_interval, 2);
        assert_eq!(config.thresholds(), RiskThresholds::new(10.0, 15));
        assert_eq!(config.run_mode, RunMode::Live);
        assert_eq!(config.profiles.len(), 4);
    }

    #[test]
    fn test_rejects_zero_frame_skip() {
        let config = PipelineConfig {
            frame_skip_interval: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "frame_skip_interval"));
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        let bad = [
            PipelineConfig { confidence_threshold: 1.5, ..Default::default() },
            PipelineConfig { rain_mm_threshold: -1.0, ..Default::default() },
            PipelineConfig { rain_mm_threshold: f64::NAN, ..Default::default() },
            PipelineConfig { vehicle_count_threshold: 0, ..Default::default() },
            PipelineConfig { output_height: 0, ..Default::default() },
            PipelineConfig { append_attempts: 0, ..Default::default() },
            PipelineConfig { weather_refresh_secs: Some(0), ..Default::default() },
            PipelineConfig { profiles: ProfileTable::empty(), ..Default::default() },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "accepted {:?}", config);
        }
    }

    #[test]
    fn test_rejects_inverted_profile() {
        let mut config = PipelineConfig::default();
        config.profiles.insert("light", ClassProfile::new(18_000, 800, 1.0, 3.5));
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "profiles.light"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sentinel.json");
        std::fs::write(
            &path,
            r#"{"frame_skip_interval": 5, "run_mode": "simulated",
                "profiles": {"Car": {"area_min": 500, "area_max": 9000, "ratio_min": 1.0, "ratio_max": 3.0}}}"#,
        )
        .unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.frame_skip_interval, 5);
        assert_eq!(config.run_mode, RunMode::Simulated);
        assert_eq!(config.vehicle_count_threshold, 15);
        assert_eq!(config.profiles.len(), 1);
        assert!(config.profiles.get("car").is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unparsable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ frame_skip_interval: ").unwrap();
        assert!(matches!(PipelineConfig::from_file(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            PipelineConfig::from_file(&dir.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let overrides = EnvOverrides::from_lookup(lookup(&[
            (constants::ENV_FRAME_SKIP, "4"),
            (constants::ENV_RAIN_MM_THRESHOLD, "7.5"),
            (constants::ENV_RUN_MODE, "simulated"),
            (constants::ENV_DB_PATH, "/tmp/s.db"),
        ]))
        .unwrap();

        let mut config = PipelineConfig::default();
        config.apply(&overrides);
        assert_eq!(config.frame_skip_interval, 4);
        assert_eq!(config.rain_mm_threshold, 7.5);
        assert_eq!(config.run_mode, RunMode::Simulated);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/s.db"));
        // Untouched
        assert_eq!(config.vehicle_count_threshold, 15);
    }

    #[test]
    fn test_bad_env_value_is_error() {
        let err = EnvOverrides::from_lookup(lookup(&[(constants::ENV_FRAME_SKIP, "two")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field, .. } if field == constants::ENV_FRAME_SKIP));

        assert!(EnvOverrides::from_lookup(lookup(&[(constants::ENV_RUN_MODE, "replay")])).is_err());
    }
}
