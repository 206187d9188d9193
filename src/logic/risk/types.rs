//! Risk Types
//!
//! Core types for risk classification.
//! No logic here - data structures only.

use serde::{Deserialize, Serialize};

// ============================================================================
// RISK LEVEL
// ============================================================================

/// Alert level combining precipitation and traffic density
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Dry road or rain below threshold
    Safe,
    /// Heavy rain, traffic still flowing
    WetAlert,
    /// Heavy rain and dense traffic - flood risk
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::WetAlert => "wet_alert",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn severity_level(&self) -> u8 {
        match self {
            RiskLevel::Safe => 0,
            RiskLevel::WetAlert => 1,
            RiskLevel::Critical => 2,
        }
    }

    /// Status banner text for the operator display
    pub fn headline(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "MONITORING - ROAD SAFE",
            RiskLevel::WetAlert => "WARNING - WET ROAD (FREE FLOW)",
            RiskLevel::Critical => "CRITICAL ALERT - FLOOD RISK",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RISK ASSESSMENT
// ============================================================================

/// Level plus the two comparisons it was derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub rain_risk: bool,
    pub traffic_risk: bool,
    pub reasons: Vec<String>,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self {
            level: RiskLevel::Safe,
            rain_risk: false,
            traffic_risk: false,
            reasons: vec![],
        }
    }
}
