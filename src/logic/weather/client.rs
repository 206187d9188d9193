//! Weather Providers
//!
//! Every provider always answers: failures are folded into the fallback
//! snapshot (status `unavailable`) and logged, never raised to the caller.

use std::time::{Duration, Instant};

use serde::Deserialize;

use super::types::{WeatherSnapshot, WeatherStatus};

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

pub trait WeatherProvider {
    /// Current conditions. Must not fail and must not block past its timeout.
    fn current(&self) -> WeatherSnapshot;

    fn name(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to read response: {0}")]
    Read(#[from] std::io::Error),
    #[error("unexpected response body: {0}")]
    Parse(#[from] serde_json::Error),
}

// ============================================================================
// OPEN-METEO
// ============================================================================

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    precipitation: f64,
    weather_code: i64,
}

/// Live conditions from the Open-Meteo forecast API
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    base_url: String,
    latitude: f64,
    longitude: f64,
    timeout: Duration,
}

impl OpenMeteoClient {
    pub fn new(latitude: f64, longitude: f64, timeout: Duration) -> Self {
        Self {
            base_url: OPEN_METEO_URL.to_string(),
            latitude,
            longitude,
            timeout,
        }
    }

    /// Point the client at another forecast endpoint (mirror or proxy)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Conditions at an arbitrary location, fallback on any failure
    pub fn get_weather(&self, latitude: f64, longitude: f64) -> WeatherSnapshot {
        match self.fetch(latitude, longitude) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!(
                    "Weather lookup for ({}, {}) failed: {} - using fallback",
                    latitude,
                    longitude,
                    e
                );
                WeatherSnapshot::fallback()
            }
        }
    }

    fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!(
            "{}?latitude={}&longitude={}&current=temperature_2m,precipitation,weather_code",
            self.base_url, latitude, longitude
        );

        let response = ureq::get(&url)
            .timeout(self.timeout)
            .call()
            .map_err(|e| WeatherError::Request(e.to_string()))?;

        let body = response.into_string()?;
        parse_forecast(&body)
    }
}

impl WeatherProvider for OpenMeteoClient {
    fn current(&self) -> WeatherSnapshot {
        self.get_weather(self.latitude, self.longitude)
    }

    fn name(&self) -> &'static str {
        "open-meteo"
    }
}

/// Parse an Open-Meteo `current` block into a snapshot
pub fn parse_forecast(body: &str) -> Result<WeatherSnapshot, WeatherError> {
    let response: ForecastResponse = serde_json::from_str(body)?;
    let current = response.current;

    Ok(WeatherSnapshot {
        rain_mm: current.precipitation,
        temp_c: current.temperature_2m,
        status: WeatherStatus::from_wmo_code(current.weather_code),
    })
}

// ============================================================================
// SIMULATED
// ============================================================================

/// Fixed snapshot, used for simulated runs
#[derive(Debug, Clone)]
pub struct SimulatedWeather {
    snapshot: WeatherSnapshot,
}

impl SimulatedWeather {
    pub fn new(snapshot: WeatherSnapshot) -> Self {
        Self { snapshot }
    }

    /// Storm conditions: 20 mm rain, 18 C
    pub fn storm() -> Self {
        Self::new(WeatherSnapshot::simulated_storm())
    }
}

impl WeatherProvider for SimulatedWeather {
    fn current(&self) -> WeatherSnapshot {
        self.snapshot
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

// ============================================================================
// CACHE
// ============================================================================

/// Holds the last snapshot and re-queries the provider when the refresh
/// interval has passed. Without an interval the run-start snapshot is kept.
pub struct WeatherCache {
    provider: Box<dyn WeatherProvider>,
    snapshot: WeatherSnapshot,
    fetched_at: Instant,
    refresh_every: Option<Duration>,
}

impl WeatherCache {
    pub fn new(provider: Box<dyn WeatherProvider>, refresh_every: Option<Duration>, now: Instant) -> Self {
        let snapshot = provider.current();
        if !snapshot.is_available() {
            log::warn!("Weather provider '{}' unavailable at start", provider.name());
        }
        Self {
            provider,
            snapshot,
            fetched_at: now,
            refresh_every,
        }
    }

    pub fn snapshot(&self) -> WeatherSnapshot {
        self.snapshot
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Refresh if due. Returns true when the provider was queried.
    pub fn refresh_if_due(&mut self, now: Instant) -> bool {
        let due = match self.refresh_every {
            Some(every) => now.saturating_duration_since(self.fetched_at) >= every,
            None => false,
        };
        if !due {
            return false;
        }

        let snapshot = self.provider.current();
        if snapshot != self.snapshot {
            log::info!(
                "Weather updated: {} ({:.1} mm, {:.1} C)",
                snapshot.status,
                snapshot.rain_mm,
                snapshot.temp_c
            );
        }
        self.snapshot = snapshot;
        self.fetched_at = now;
        true
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingProvider {
        calls: Rc<Cell<u32>>,
    }

    impl WeatherProvider for CountingProvider {
        fn current(&self) -> WeatherSnapshot {
            self.calls.set(self.calls.get() + 1);
            WeatherSnapshot {
                rain_mm: self.calls.get() as f64,
                temp_c: 20.0,
                status: WeatherStatus::Rain,
            }
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[test]
    fn test_parse_forecast() {
        let body = r#"{
            "latitude": -18.92,
            "longitude": -48.28,
            "current": {"time": "2026-01-10T14:00", "interval": 900,
                        "temperature_2m": 24.3, "precipitation": 12.5, "weather_code": 63}
        }"#;
        let snapshot = parse_forecast(body).unwrap();
        assert_eq!(snapshot.rain_mm, 12.5);
        assert_eq!(snapshot.temp_c, 24.3);
        assert_eq!(snapshot.status, WeatherStatus::Rain);
    }

    #[test]
    fn test_parse_forecast_rejects_missing_block() {
        assert!(matches!(
            parse_forecast(r#"{"error": true, "reason": "bad latitude"}"#),
            Err(WeatherError::Parse(_))
        ));
        assert!(parse_forecast("not json").is_err());
    }

    #[test]
    fn test_unreachable_provider_falls_back() {
        // Closed local port: connection refused
        let client = OpenMeteoClient::new(0.0, 0.0, Duration::from_millis(500))
            .with_base_url("http://127.0.0.1:9/v1/forecast");
        assert_eq!(client.current(), WeatherSnapshot::fallback());
    }

    #[test]
    fn test_simulated_storm() {
        let sim = SimulatedWeather::storm();
        let s = sim.current();
        assert_eq!(s.rain_mm, 20.0);
        assert_eq!(s.status, WeatherStatus::Storm);
    }

    #[test]
    fn test_cache_without_refresh_keeps_start_snapshot() {
        let calls = Rc::new(Cell::new(0));
        let start = Instant::now();
        let mut cache = WeatherCache::new(
            Box::new(CountingProvider { calls: calls.clone() }),
            None,
            start,
        );
        assert!(!cache.refresh_if_due(start + Duration::from_secs(3600)));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.snapshot().rain_mm, 1.0);
    }

    #[test]
    fn test_cache_refreshes_when_due() {
        let calls = Rc::new(Cell::new(0));
        let start = Instant::now();
        let mut cache = WeatherCache::new(
            Box::new(CountingProvider { calls: calls.clone() }),
            Some(Duration::from_secs(60)),
            start,
        );

        assert!(!cache.refresh_if_due(start + Duration::from_secs(30)));
        assert!(cache.refresh_if_due(start + Duration::from_secs(60)));
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.snapshot().rain_mm, 2.0);

        // Interval restarts from the last fetch
        assert!(!cache.refresh_if_due(start + Duration::from_secs(90)));
    }
}
