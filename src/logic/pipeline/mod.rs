//! Pipeline Driver
//!
//! Single-threaded cycle loop: confidence gate, morphology, aggregation,
//! risk classification and telemetry emission run end-to-end for one frame
//! before the next frame is pulled from the feed.
//!
//! ## Structure
//! - `Pipeline` - owns the ledger, store, weather cache and throughput meter
//! - `CycleReport` - what one processed frame produced
//! - `RunSummary` - totals returned after the store is closed
//!
//! ## Usage
//! ```ignore
//! let pipeline = Pipeline::new(config, store, Box::new(SimulatedWeather::storm()));
//! let summary = pipeline.run(FeedReader::open(&path)?, &stop)?;
//! ```
//!
//! Backpressure is handled by downsampling: only every Nth frame (by
//! arrival order) is processed, the rest are dropped unbuffered.


use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::logic::config::PipelineConfig;
use crate::logic::detection::{filter_detections, Frame, ValidatedDetection};
use crate::logic::ledger::TrackLedger;
use crate::logic::metrics::{CycleMetrics, ThroughputMeter};
use crate::logic::perception::PerceptionError;
use crate::logic::risk::{assess, RiskAssessment, RiskLevel, RiskThresholds};
use crate::logic::telemetry::{
    emit, new_run_id, EmitContext, EmitError, StoreError, TelemetryEvent, TelemetryStore,
};
use crate::logic::weather::{WeatherCache, WeatherProvider, WeatherSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("telemetry store: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Perception(#[from] PerceptionError),
}

// ============================================================================
// REPORTS
// ============================================================================

/// Output of one processed frame
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub frame_index: u64,
    pub metrics: CycleMetrics,
    pub assessment: RiskAssessment,
    pub validated: Vec<ValidatedDetection>,
    /// Events persisted this cycle (first sightings only)
    pub new_events: Vec<TelemetryEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub frames_seen: u64,
    pub cycles_processed: u64,
    pub events_emitted: u64,
    pub peak_risk: RiskLevel,
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline<S: TelemetryStore> {
    config: PipelineConfig,
    thresholds: RiskThresholds,
    run_id: String,
    ledger: TrackLedger,
    store: S,
    weather: WeatherCache,
    meter: ThroughputMeter,
    frames_seen: u64,
    cycles_processed: u64,
    events_emitted: u64,
    last_risk: Option<RiskLevel>,
    peak_risk: RiskLevel,
}

impl<S: TelemetryStore> Pipeline<S> {
    /// Start a run. The config must already be validated.
    pub fn new(config: PipelineConfig, store: S, provider: Box<dyn WeatherProvider>) -> Self {
        let now = Instant::now();
        let weather = WeatherCache::new(provider, config.weather_refresh(), now);
        let run_id = new_run_id();
        let snapshot = weather.snapshot();

        log::info!(
            "Run {} started ({} mode, weather via {}: {} {:.1} mm)",
            run_id,
            config.run_mode,
            weather.provider_name(),
            snapshot.status,
            snapshot.rain_mm
        );

        Self {
            thresholds: config.thresholds(),
            config,
            run_id,
            ledger: TrackLedger::new(),
            store,
            weather,
            meter: ThroughputMeter::new(now),
            frames_seen: 0,
            cycles_processed: 0,
            events_emitted: 0,
            last_risk: None,
            peak_risk: RiskLevel::Safe,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn ledger(&self) -> &TrackLedger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn weather(&self) -> WeatherSnapshot {
        self.weather.snapshot()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id.clone(),
            frames_seen: self.frames_seen,
            cycles_processed: self.cycles_processed,
            events_emitted: self.events_emitted,
            peak_risk: self.peak_risk,
        }
    }

    pub fn process_frame(&mut self, frame: &Frame) -> Result<Option<CycleReport>, PipelineError> {
        self.process_frame_at(frame, Instant::now(), Utc::now())
    }

    /// Process one frame observed at `now` (monotonic) / `wall` (event time).
    ///
    /// Returns `Ok(None)` when the frame is dropped by downsampling. On an
    /// emit failure the events persisted earlier in the cycle stay counted.
    pub fn process_frame_at(
        &mut self,
        frame: &Frame,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> Result<Option<CycleReport>, PipelineError> {
        let index = self.frames_seen;
        self.frames_seen += 1;
        if index % u64::from(self.config.frame_skip_interval) != 0 {
            return Ok(None);
        }

        self.weather.refresh_if_due(now);
        let snapshot = self.weather.snapshot();

        let detections =
            frame.detections_in_output_space(self.config.output_width, self.config.output_height);
        let validated = filter_detections(
            &detections,
            &self.config.profiles,
            self.config.confidence_threshold,
        );

        let metrics = self.meter.cycle(&validated, now);
        let assessment = assess(&metrics, &snapshot, &self.thresholds);
        self.cycles_processed += 1;
        self.track_risk(&assessment, frame.frame);

        let ctx = EmitContext {
            run_id: self.run_id.clone(),
            run_mode: self.config.run_mode,
            weather: snapshot,
            now: wall,
        };
        let claimed_before = self.ledger.len();
        let result = emit(
            &validated,
            &mut self.ledger,
            &mut self.store,
            &ctx,
            self.config.append_attempts,
        );
        self.events_emitted += (self.ledger.len() - claimed_before) as u64;
        let new_events = result?;

        Ok(Some(CycleReport {
            frame_index: frame.frame,
            metrics,
            assessment,
            validated,
            new_events,
        }))
    }

    fn track_risk(&mut self, assessment: &RiskAssessment, frame_index: u64) {
        let level = assessment.level;
        if self.last_risk != Some(level) {
            if level.severity_level() == 0 {
                log::info!("Frame {}: {}", frame_index, level.headline());
            } else {
                log::warn!(
                    "Frame {}: {} ({})",
                    frame_index,
                    level.headline(),
                    assessment.reasons.join(", ")
                );
            }
            self.last_risk = Some(level);
        }
        self.peak_risk = self.peak_risk.max(level);
    }

    /// Drive frames until the feed ends or `stop` is set, then close the
    /// store. Any error also closes the store before it is returned.
    pub fn run<I>(mut self, frames: I, stop: &AtomicBool) -> Result<RunSummary, PipelineError>
    where
        I: IntoIterator<Item = Result<Frame, PerceptionError>>,
    {
        for item in frames {
            if stop.load(Ordering::SeqCst) {
                log::info!("Stop requested after {} frame(s)", self.frames_seen);
                break;
            }

            let outcome = item
                .map_err(PipelineError::from)
                .and_then(|frame| self.process_frame(&frame));
            if let Err(e) = outcome {
                log::error!("Run {} halted: {}", self.run_id, e);
                let summary = self.summary();
                if let Err(close_err) = self.store.close() {
                    log::error!("Failed to close telemetry store: {}", close_err);
                }
                log::info!(
                    "Partial run: {} event(s) persisted before halt",
                    summary.events_emitted
                );
                return Err(e);
            }
        }

        self.finish()
    }

    /// Close the store and report totals
    pub fn finish(self) -> Result<RunSummary, PipelineError> {
        let summary = self.summary();
        self.store.close()?;
        log::info!(
            "Run {} finished: {} frame(s), {} cycle(s), {} event(s), peak risk {}",
            summary.run_id,
            summary.frames_seen,
            summary.cycles_processed,
            summary.events_emitted,
            summary.peak_risk
        );
        Ok(summary)
    }
}
