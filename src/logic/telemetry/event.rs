//! Telemetry Event Types
//!
//! One immutable record per tracked object per run: the first validated
//! sighting. Events are append-only and never modified after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::detection::{TrackId, ValidatedDetection};
use crate::logic::weather::{WeatherSnapshot, WeatherStatus};

/// Persisted timestamp layout
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// RUN MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Live weather provider
    #[default]
    Live,
    /// Fixed synthetic weather snapshot
    Simulated,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Live => "live",
            RunMode::Simulated => "simulated",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(RunMode::Live),
            "simulated" | "simulation" => Ok(RunMode::Simulated),
            other => Err(format!("unknown run mode '{}' (expected live or simulated)", other)),
        }
    }
}

// ============================================================================
// EMIT CONTEXT
// ============================================================================

/// Ambient values stamped onto every event emitted in a cycle
#[derive(Debug, Clone)]
pub struct EmitContext {
    pub run_id: String,
    pub run_mode: RunMode,
    pub weather: WeatherSnapshot,
    pub now: DateTime<Utc>,
}

/// Fresh identifier for one pipeline run
pub fn new_run_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// TELEMETRY EVENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub run_mode: RunMode,
    pub track_id: TrackId,
    pub class_label: String,
    /// Confidence as a percentage, one decimal place
    pub confidence_pct: f64,
    pub weather_status: WeatherStatus,
    pub rain_mm: f64,
}

impl TelemetryEvent {
    /// Build the event for a detection's first sighting
    pub fn first_sighting(
        detection: &ValidatedDetection,
        track_id: TrackId,
        ctx: &EmitContext,
    ) -> Self {
        Self {
            run_id: ctx.run_id.clone(),
            timestamp: ctx.now,
            run_mode: ctx.run_mode,
            track_id,
            class_label: detection.class_label().to_lowercase(),
            confidence_pct: confidence_pct(detection.confidence()),
            weather_status: ctx.weather.status,
            rain_mm: ctx.weather.rain_mm,
        }
    }

    pub fn timestamp_str(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// 0.0-1.0 confidence to a 0-100 percentage rounded to one decimal
pub fn confidence_pct(confidence: f32) -> f64 {
    let pct = (confidence as f64 * 1000.0).round() / 10.0;
    pct.clamp(0.0, 100.0)
}

// ============================================================================
// TESTS
// ============================================================================
