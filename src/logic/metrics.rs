//! Cycle Metrics
//!
//! Per-cycle vehicle count and mean confidence, plus an exponentially
//! smoothed processing rate.

use std::time::Instant;

use serde::Serialize;

use super::detection::ValidatedDetection;

/// Weight kept from the previous rate on each update
pub const RATE_SMOOTHING: f64 = 0.85;

/// Floor on the measured interval between cycles (seconds)
pub const MIN_ELAPSED_SECS: f64 = 1e-5;

/// Smoothed rate before the first measurement (cycles/s)
pub const INITIAL_RATE: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleMetrics {
    /// Validated detections in the cycle (tracked or not)
    pub vehicle_count: usize,
    /// Mean confidence as a percentage, 0.0 when the cycle is empty
    pub mean_confidence_pct: f64,
    /// Smoothed cycles per second
    pub throughput_rate: f64,
}

/// One EMA step: `0.85 * prior + 0.15 * (1 / max(elapsed, eps))`
pub fn smooth_rate(prior_rate: f64, elapsed_secs: f64) -> f64 {
    let instant_rate = 1.0 / elapsed_secs.max(MIN_ELAPSED_SECS);
    RATE_SMOOTHING * prior_rate + (1.0 - RATE_SMOOTHING) * instant_rate
}

pub fn aggregate(
    validated: &[ValidatedDetection],
    prior_rate: f64,
    elapsed_secs: f64,
) -> CycleMetrics {
    let vehicle_count = validated.len();
    let mean_confidence_pct = if vehicle_count == 0 {
        0.0
    } else {
        let sum: f64 = validated.iter().map(|v| v.confidence() as f64).sum();
        sum / vehicle_count as f64 * 100.0
    };

    CycleMetrics {
        vehicle_count,
        mean_confidence_pct,
        throughput_rate: smooth_rate(prior_rate, elapsed_secs),
    }
}

// ============================================================================
// THROUGHPUT METER
// ============================================================================

/// Carries the smoothed rate and last cycle time between cycles
#[derive(Debug, Clone)]
pub struct ThroughputMeter {
    rate: f64,
    last_tick: Instant,
}

impl ThroughputMeter {
    pub fn new(start: Instant) -> Self {
        Self {
            rate: INITIAL_RATE,
            last_tick: start,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Aggregate one cycle observed at `now` and advance the meter
    pub fn cycle(&mut self, validated: &[ValidatedDetection], now: Instant) -> CycleMetrics {
        let elapsed = now.saturating_duration_since(self.last_tick).as_secs_f64();
        let metrics = aggregate(validated, self.rate, elapsed);
        self.rate = metrics.throughput_rate;
        self.last_tick = now;
        metrics
    }
}
