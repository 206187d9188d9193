//! Logic Module - Detection Validation & Risk-Alerting Pipeline
//!
//! ## Structure
//! - `detection/` - Detection types, class profiles, morphological validator
//! - `ledger.rs` - Per-run track id ledger (at-most-once telemetry)
//! - `metrics.rs` - Per-cycle aggregation and smoothed throughput
//! - `risk/` - Memoryless rain x traffic classifier
//! - `weather/` - Weather providers with fallback snapshot
//! - `telemetry/` - Event records, SQLite store, ledger-gated emitter
//! - `perception.rs` - JSON Lines feed reader
//! - `config.rs` - Pipeline configuration and validation
//! - `pipeline/` - Cycle loop tying it all together

pub mod config;
pub mod detection;
pub mod ledger;
pub mod metrics;
pub mod perception;
pub mod pipeline;
pub mod risk;
pub mod telemetry;
pub mod weather;
