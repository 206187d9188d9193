//! Detection Module
//!
//! Perception output types and the morphological validator that decides
//! which detections are plausible vehicles.
//!
//! ## Structure
//! - `types`: RawDetection, BoundingBox, ValidatedDetection, Frame
//! - `profile`: ClassProfile envelopes and the label -> profile table
//! - `validator`: accept/reject logic
//!
//! ## Usage
//! ```ignore
//! use crate::logic::detection::{validate, ProfileTable, RawDetection, BoundingBox};
//!
//! let table = ProfileTable::default();
//! let det = RawDetection::new("light", 0.8, BoundingBox::new(100.0, 100.0, 140.0, 150.0));
//! assert!(validate(&det, &table));
//! ```

pub mod types;
pub mod profile;
pub mod validator;

pub use types::{BoundingBox, Frame, RawDetection, TrackId, ValidatedDetection};

pub use profile::{ClassProfile, ProfileTable};

pub use validator::{check, filter_detections, passes_confidence, validate, Rejection};
