//! Detection Types
//!
//! Data structures handed over by the perception subsystem.
//! No validation logic here - see `validator.rs`.

use serde::{Deserialize, Deserializer, Serialize};

/// Tracker-assigned identifier, stable per physical object for a session
pub type TrackId = u32;

// ============================================================================
// BOUNDING BOX
// ============================================================================

/// Axis-aligned box in pixel coordinates (x1, y1) top-left, (x2, y2) bottom-right.
///
/// Serialized as a `[x1, y1, x2, y2]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Width and height on the integer pixel grid.
    ///
    /// Corners are truncated to whole pixels first, so a sub-pixel box
    /// collapses to zero width or height. `None` when a corner is not
    /// finite or the extent does not fit in an `i64`.
    pub fn pixel_size(&self) -> Option<(i64, i64)> {
        if [self.x1, self.y1, self.x2, self.y2].iter().any(|c| !c.is_finite()) {
            return None;
        }
        let w = (self.x2 as i64).checked_sub(self.x1 as i64)?;
        let h = (self.y2 as i64).checked_sub(self.y1 as i64)?;
        Some((w, h))
    }

    /// Scale both axes (used when the source resolution differs from output)
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            x1: self.x1 * sx,
            y1: self.y1 * sy,
            x2: self.x2 * sx,
            y2: self.y2 * sy,
        }
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

// ============================================================================
// RAW DETECTION
// ============================================================================

/// One object in one processed frame, as produced by the detector/tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// None when the tracker could not assign an identity
    #[serde(default, deserialize_with = "lenient_track_id")]
    pub track_id: Option<TrackId>,
    pub class_label: String,
    /// Model confidence (0.0 - 1.0)
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl RawDetection {
    pub fn new(class_label: &str, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            track_id: None,
            class_label: class_label.to_string(),
            confidence,
            bbox,
        }
    }

    pub fn with_track(mut self, track_id: TrackId) -> Self {
        self.track_id = Some(track_id);
        self
    }
}

// ============================================================================
// VALIDATED DETECTION
// ============================================================================

/// A detection that passed the morphological check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedDetection {
    pub detection: RawDetection,
    /// Pixel area (w * h)
    pub area: i64,
    /// long side / short side, always >= 1.0
    pub aspect_ratio: f32,
}

impl ValidatedDetection {
    pub fn track_id(&self) -> Option<TrackId> {
        self.detection.track_id
    }

    pub fn class_label(&self) -> &str {
        &self.detection.class_label
    }

    pub fn confidence(&self) -> f32 {
        self.detection.confidence
    }
}

// ============================================================================
// FRAME
// ============================================================================

/// All detections the perception subsystem reported for one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    /// Source frame number (informational)
    #[serde(default)]
    pub frame: u64,
    /// Source resolution, when the detector ran on a different size than output
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

impl Frame {
    pub fn new(frame: u64, detections: Vec<RawDetection>) -> Self {
        Self {
            frame,
            width: None,
            height: None,
            detections,
        }
    }

    /// Detections mapped into the output coordinate space.
    ///
    /// Returns the boxes untouched when the frame carries no source
    /// resolution or already matches the output size.
    pub fn detections_in_output_space(&self, out_w: u32, out_h: u32) -> Vec<RawDetection> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 && (w != out_w || h != out_h) => {
                let sx = out_w as f32 / w as f32;
                let sy = out_h as f32 / h as f32;
                self.detections
                    .iter()
                    .map(|d| RawDetection {
                        bbox: d.bbox.scaled(sx, sy),
                        ..d.clone()
                    })
                    .collect()
            }
            _ => self.detections.clone(),
        }
    }
}

/// A negative, fractional or oversized id makes the detection untracked
/// rather than failing the whole frame line.
fn lenient_track_id<'de, D>(deserializer: D) -> Result<Option<TrackId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_u64)
        .and_then(|id| TrackId::try_from(id).ok()))
}

// ============================================================================
// TESTS
// ============================================================================
