//! Risk Classifier
//!
//! Stateless: the level is recomputed from the current cycle and weather
//! every time, with no memory of earlier cycles (no hysteresis).
//! Input: CycleMetrics, WeatherSnapshot, RiskThresholds
//! Output: RiskLevel / RiskAssessment

use super::rules::RiskThresholds;
use super::types::{RiskAssessment, RiskLevel};
use crate::logic::metrics::CycleMetrics;
use crate::logic::weather::WeatherSnapshot;

/// Classify the current cycle. First matching rule wins:
/// rain + traffic -> Critical, rain only -> WetAlert, otherwise Safe.
pub fn classify(
    metrics: &CycleMetrics,
    weather: &WeatherSnapshot,
    thresholds: &RiskThresholds,
) -> RiskLevel {
    level_for(
        is_rain_risk(weather, thresholds),
        is_traffic_risk(metrics, thresholds),
    )
}

/// Same decision as [`classify`], with the contributing flags and reasons
pub fn assess(
    metrics: &CycleMetrics,
    weather: &WeatherSnapshot,
    thresholds: &RiskThresholds,
) -> RiskAssessment {
    let rain_risk = is_rain_risk(weather, thresholds);
    let traffic_risk = is_traffic_risk(metrics, thresholds);
    let mut reasons = Vec::new();

    if rain_risk {
        reasons.push(format!(
            "Rain {:.1} mm >= {:.1} mm",
            weather.rain_mm, thresholds.rain_mm_threshold
        ));
    }
    if traffic_risk {
        reasons.push(format!(
            "{} vehicles >= {}",
            metrics.vehicle_count, thresholds.vehicle_count_threshold
        ));
    }

    RiskAssessment {
        level: level_for(rain_risk, traffic_risk),
        rain_risk,
        traffic_risk,
        reasons,
    }
}

fn is_rain_risk(weather: &WeatherSnapshot, thresholds: &RiskThresholds) -> bool {
    weather.rain_mm >= thresholds.rain_mm_threshold
}

fn is_traffic_risk(metrics: &CycleMetrics, thresholds: &RiskThresholds) -> bool {
    metrics.vehicle_count >= thresholds.vehicle_count_threshold
}

fn level_for(rain_risk: bool, traffic_risk: bool) -> RiskLevel {
    match (rain_risk, traffic_risk) {
        (true, true) => RiskLevel::Critical,
        (true, false) => RiskLevel::WetAlert,
        (false, _) => RiskLevel::Safe,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::weather::WeatherStatus;

    fn metrics(vehicle_count: usize) -> CycleMetrics {
        CycleMetrics {
            vehicle_count,
            mean_confidence_pct: 80.0,
            throughput_rate: 30.0,
        }
    }

    fn weather(rain_mm: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            rain_mm,
            temp_c: 20.0,
            status: WeatherStatus::Rain,
        }
    }

    fn thresholds() -> RiskThresholds {
        RiskThresholds::new(10.0, 15)
    }

    #[test]
    fn test_rain_and_traffic_is_critical() {
        assert_eq!(classify(&metrics(20), &weather(12.0), &thresholds()), RiskLevel::Critical);
    }

    #[test]
    fn test_rain_only_is_wet_alert() {
        assert_eq!(classify(&metrics(5), &weather(12.0), &thresholds()), RiskLevel::WetAlert);
    }

    #[test]
    fn test_dry_is_safe_regardless_of_traffic() {
        assert_eq!(classify(&metrics(0), &weather(0.0), &thresholds()), RiskLevel::Safe);
        assert_eq!(classify(&metrics(500), &weather(9.9), &thresholds()), RiskLevel::Safe);
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        assert_eq!(classify(&metrics(15), &weather(10.0), &thresholds()), RiskLevel::Critical);
    }

    #[test]
    fn test_no_memory_between_calls() {
        let t = thresholds();
        assert_eq!(classify(&metrics(20), &weather(12.0), &t), RiskLevel::Critical);
        // A single drop in traffic clears the alert immediately
        assert_eq!(classify(&metrics(14), &weather(12.0), &t), RiskLevel::WetAlert);
        assert_eq!(classify(&metrics(20), &weather(12.0), &t), RiskLevel::Critical);
        assert_eq!(classify(&metrics(20), &weather(0.0), &t), RiskLevel::Safe);
    }

    #[test]
    fn test_assess_matches_classify() {
        let t = thresholds();
        for (count, rain) in [(0, 0.0), (20, 0.0), (5, 12.0), (20, 12.0)] {
            let a = assess(&metrics(count), &weather(rain), &t);
            assert_eq!(a.level, classify(&metrics(count), &weather(rain), &t));
        }
    }

    #[test]
    fn test_assess_reasons() {
        let a = assess(&metrics(20), &weather(12.0), &thresholds());
        assert!(a.rain_risk && a.traffic_risk);
        assert_eq!(a.reasons.len(), 2);

        let a = assess(&metrics(3), &weather(0.0), &thresholds());
        assert!(a.reasons.is_empty());
    }

    #[test]
    fn test_level_presentation() {
        assert_eq!(RiskLevel::Critical.to_string(), "critical");
        assert!(RiskLevel::Critical > RiskLevel::WetAlert);
        assert_eq!(RiskLevel::WetAlert.severity_level(), 1);
        assert!(RiskLevel::Critical.headline().contains("FLOOD"));
    }
}
