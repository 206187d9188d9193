//! Weather Module
//!
//! Read-only weather input for the risk classifier. Providers never fail:
//! a broken lookup becomes the `unavailable` fallback snapshot.

pub mod types;
pub mod client;

pub use types::{WeatherSnapshot, WeatherStatus};

pub use client::{
    parse_forecast,
    OpenMeteoClient,
    SimulatedWeather,
    WeatherCache,
    WeatherError,
    WeatherProvider,
};
