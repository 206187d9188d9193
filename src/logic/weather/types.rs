//! Weather Types

use serde::{Deserialize, Serialize};

/// Coarse sky condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherStatus {
    Clear,
    Cloudy,
    Rain,
    Storm,
    /// Provider failed - snapshot holds fallback values
    Unavailable,
}

impl WeatherStatus {
    /// Map a WMO weather interpretation code
    pub fn from_wmo_code(code: i64) -> Self {
        if code == 0 {
            WeatherStatus::Clear
        } else if code < 50 {
            WeatherStatus::Cloudy
        } else if code < 80 {
            WeatherStatus::Rain
        } else {
            WeatherStatus::Storm
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherStatus::Clear => "clear",
            WeatherStatus::Cloudy => "cloudy",
            WeatherStatus::Rain => "rain",
            WeatherStatus::Storm => "storm",
            WeatherStatus::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for WeatherStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WeatherStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clear" => Ok(WeatherStatus::Clear),
            "cloudy" => Ok(WeatherStatus::Cloudy),
            "rain" => Ok(WeatherStatus::Rain),
            "storm" => Ok(WeatherStatus::Storm),
            "unavailable" => Ok(WeatherStatus::Unavailable),
            other => Err(format!("unknown weather status '{}'", other)),
        }
    }
}

/// Current conditions at the monitored site
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Precipitation over the last hour (mm)
    pub rain_mm: f64,
    pub temp_c: f64,
    pub status: WeatherStatus,
}

impl WeatherSnapshot {
    /// Returned whenever the live provider cannot answer
    pub fn fallback() -> Self {
        Self {
            rain_mm: 0.0,
            temp_c: 22.0,
            status: WeatherStatus::Unavailable,
        }
    }

    /// Fixed storm conditions used in simulated runs
    pub fn simulated_storm() -> Self {
        Self {
            rain_mm: 20.0,
            temp_c: 18.0,
            status: WeatherStatus::Storm,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status != WeatherStatus::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wmo_mapping() {
        assert_eq!(WeatherStatus::from_wmo_code(0), WeatherStatus::Clear);
        assert_eq!(WeatherStatus::from_wmo_code(3), WeatherStatus::Cloudy);
        assert_eq!(WeatherStatus::from_wmo_code(45), WeatherStatus::Cloudy);
        assert_eq!(WeatherStatus::from_wmo_code(61), WeatherStatus::Rain);
        assert_eq!(WeatherStatus::from_wmo_code(80), WeatherStatus::Storm);
        assert_eq!(WeatherStatus::from_wmo_code(95), WeatherStatus::Storm);
    }

    #[test]
    fn test_status_round_trip_str() {
        for status in [
            WeatherStatus::Clear,
            WeatherStatus::Cloudy,
            WeatherStatus::Rain,
            WeatherStatus::Storm,
            WeatherStatus::Unavailable,
        ] {
            assert_eq!(status.as_str().parse::<WeatherStatus>(), Ok(status));
        }
        assert!("sunny".parse::<WeatherStatus>().is_err());
    }

    #[test]
    fn test_fallback_snapshot() {
        let s = WeatherSnapshot::fallback();
        assert_eq!(s.rain_mm, 0.0);
        assert_eq!(s.temp_c, 22.0);
        assert!(!s.is_available());
    }
}
