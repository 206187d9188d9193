//! Risk Module
//!
//! Fuses traffic density with precipitation into an alert level.
//!
//! ## Structure
//! - `types`: RiskLevel, RiskAssessment
//! - `rules`: thresholds and defaults
//! - `classifier`: classification logic
//!
//! ## Usage
//! ```ignore
//! use crate::logic::risk::{classify, RiskLevel, RiskThresholds};
//!
//! match classify(&metrics, &weather, &RiskThresholds::default()) {
//!     RiskLevel::Safe => {}
//!     RiskLevel::WetAlert => log::warn!("wet road"),
//!     RiskLevel::Critical => log::warn!("flood risk"),
//! }
//! ```

pub mod types;
pub mod rules;
pub mod classifier;

pub use types::{RiskAssessment, RiskLevel};

pub use rules::{RiskThresholds, DEFAULT_RAIN_MM_THRESHOLD, DEFAULT_VEHICLE_COUNT_THRESHOLD};

pub use classifier::{assess, classify};
