//! Risk Classification Thresholds
//!
//! Constants and config only - classification logic lives in `classifier.rs`.

use serde::{Deserialize, Serialize};

// ============================================================================
// DEFAULTS
// ============================================================================

/// Rain (mm in the last hour) at or above which the road counts as wet
pub const DEFAULT_RAIN_MM_THRESHOLD: f64 = 10.0;

/// Validated vehicles per cycle at or above which traffic counts as dense
pub const DEFAULT_VEHICLE_COUNT_THRESHOLD: usize = 15;

// ============================================================================
// CONFIGURABLE THRESHOLDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub rain_mm_threshold: f64,
    pub vehicle_count_threshold: usize,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            rain_mm_threshold: DEFAULT_RAIN_MM_THRESHOLD,
            vehicle_count_threshold: DEFAULT_VEHICLE_COUNT_THRESHOLD,
        }
    }
}

impl RiskThresholds {
    pub fn new(rain_mm_threshold: f64, vehicle_count_threshold: usize) -> Self {
        Self {
            rain_mm_threshold,
            vehicle_count_threshold,
        }
    }
}
