//! Morphological Validator
//!
//! Second-stage plausibility filter: a detection is kept only if its box
//! fits the area and aspect-ratio envelope of its class. Pure functions,
//! no side effects.

use super::profile::ProfileTable;
use super::types::{RawDetection, ValidatedDetection};

// ============================================================================
// REJECTION REASONS
// ============================================================================

/// Why a detection was filtered out. Not an error - upstream noise is expected.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Label has no profile in the table
    UnknownClass { label: String },
    /// Zero (or negative) width or height on the pixel grid
    Degenerate { width: i64, height: i64 },
    /// Corners not finite or too far apart to measure
    Unmeasurable,
    RatioOutOfRange { ratio: f32, min: f32, max: f32 },
    AreaOutOfRange { area: i64, min: u32, max: u32 },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::UnknownClass { label } => write!(f, "unknown class '{}'", label),
            Rejection::Degenerate { width, height } => {
                write!(f, "degenerate box {}x{}", width, height)
            }
            Rejection::Unmeasurable => write!(f, "box extent not measurable"),
            Rejection::RatioOutOfRange { ratio, min, max } => {
                write!(f, "aspect ratio {:.2} outside [{}, {}]", ratio, min, max)
            }
            Rejection::AreaOutOfRange { area, min, max } => {
                write!(f, "area {} outside [{}, {}]", area, min, max)
            }
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Validate one detection against the profile table, with the reason on failure
pub fn check(
    detection: &RawDetection,
    profiles: &ProfileTable,
) -> Result<ValidatedDetection, Rejection> {
    let profile = profiles
        .get(&detection.class_label)
        .ok_or_else(|| Rejection::UnknownClass {
            label: detection.class_label.clone(),
        })?;

    let (w, h) = detection.bbox.pixel_size().ok_or(Rejection::Unmeasurable)?;
    let short = w.min(h);
    let long = w.max(h);

    // Division-by-zero guard
    if short <= 0 {
        return Err(Rejection::Degenerate { width: w, height: h });
    }

    // None when w * h overflows, which is out of any profile's range
    let area = w.checked_mul(h);
    let aspect_ratio = long as f32 / short as f32;

    if !profile.accepts_ratio(aspect_ratio) {
        return Err(Rejection::RatioOutOfRange {
            ratio: aspect_ratio,
            min: profile.ratio_min,
            max: profile.ratio_max,
        });
    }

    let area = match area {
        Some(area) if profile.accepts_area(area) => area,
        other => {
            return Err(Rejection::AreaOutOfRange {
                area: other.unwrap_or(i64::MAX),
                min: profile.area_min,
                max: profile.area_max,
            })
        }
    };

    Ok(ValidatedDetection {
        detection: detection.clone(),
        area,
        aspect_ratio,
    })
}

/// Accept/reject decision only
pub fn validate(detection: &RawDetection, profiles: &ProfileTable) -> bool {
    check(detection, profiles).is_ok()
}

/// Upstream confidence gate, applied before morphology
pub fn passes_confidence(detection: &RawDetection, threshold: f32) -> bool {
    detection.confidence >= threshold
}

/// Run the confidence gate and morphology over a frame's detections
pub fn filter_detections(
    detections: &[RawDetection],
    profiles: &ProfileTable,
    confidence_threshold: f32,
) -> Vec<ValidatedDetection> {
    detections
        .iter()
        .filter(|d| passes_confidence(d, confidence_threshold))
        .filter_map(|d| match check(d, profiles) {
            Ok(v) => Some(v),
            Err(reason) => {
                log::debug!(
                    "Rejected {} (track {:?}): {}",
                    d.class_label,
                    d.track_id,
                    reason
                );
                None
            }
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
