//! Telemetry Emitter
//!
//! Turns validated detections into persisted events, at most one per track
//! id per run. The ledger claim is recorded only after the store confirms
//! the append, so a failed write leaves the id claimable instead of leaving
//! a permanent gap.

use super::event::{EmitContext, TelemetryEvent};
use super::store::{StoreError, TelemetryStore};
use crate::logic::detection::{TrackId, ValidatedDetection};
use crate::logic::ledger::TrackLedger;

#[derive(Debug, thiserror::Error)]
#[error("failed to persist telemetry for track {track_id} after {attempts} attempt(s): {source}")]
pub struct EmitError {
    pub track_id: TrackId,
    pub attempts: u32,
    #[source]
    pub source: StoreError,
}

/// Emit events for the first sighting of each newly seen track id.
///
/// Untracked detections and ids already in the ledger are skipped. Each
/// append is tried up to `attempts` times; if all fail the error is returned
/// and events appended earlier in this call stay committed.
pub fn emit<S>(
    validated: &[ValidatedDetection],
    ledger: &mut TrackLedger,
    store: &mut S,
    ctx: &EmitContext,
    attempts: u32,
) -> Result<Vec<TelemetryEvent>, EmitError>
where
    S: TelemetryStore + ?Sized,
{
    let attempts = attempts.max(1);
    let mut emitted = Vec::new();

    for detection in validated {
        let track_id = match detection.track_id() {
            Some(id) => id,
            None => continue,
        };
        if ledger.is_claimed(track_id) {
            continue;
        }

        let event = TelemetryEvent::first_sighting(detection, track_id, ctx);
        let event_id = append_with_retry(store, &event, attempts)?;

        ledger.try_claim(Some(track_id));
        log::debug!(
            "Telemetry #{}: track {} ({}, {:.1}%)",
            event_id,
            track_id,
            event.class_label,
            event.confidence_pct
        );
        emitted.push(event);
    }

    Ok(emitted)
}

fn append_with_retry<S>(
    store: &mut S,
    event: &TelemetryEvent,
    attempts: u32,
) -> Result<i64, EmitError>
where
    S: TelemetryStore + ?Sized,
{
    let mut attempt = 1;
    loop {
        match store.append(event) {
            Ok(id) => return Ok(id),
            Err(e) if attempt < attempts => {
                log::warn!(
                    "Append for track {} failed (attempt {}/{}): {}",
                    event.track_id,
                    attempt,
                    attempts,
                    e
                );
                attempt += 1;
            }
            Err(e) => {
                log::error!("Giving up on track {}: {}", event.track_id, e);
                return Err(EmitError {
                    track_id: event.track_id,
                    attempts,
                    source: e,
                });
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::detection::{BoundingBox, RawDetection};
    use crate::logic::telemetry::event::RunMode;
    use crate::logic::telemetry::store::SqliteStore;
    use crate::logic::telemetry::testing::FlakyStore;
    use crate::logic::weather::WeatherSnapshot;
    use chrono::Utc;

    fn ctx() -> EmitContext {
        EmitContext {
            run_id: "run".to_string(),
            run_mode: RunMode::Live,
            weather: WeatherSnapshot::fallback(),
            now: Utc::now(),
        }
    }

    fn seen(track_id: Option<TrackId>) -> ValidatedDetection {
        let mut detection = RawDetection::new("light", 0.75, BoundingBox::new(0.0, 0.0, 40.0, 50.0));
        detection.track_id = track_id;
        ValidatedDetection {
            detection,
            area: 2000,
            aspect_ratio: 1.25,
        }
    }

    #[test]
    fn test_track_emitted_once_across_cycles() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut ledger = TrackLedger::new();

        let first = emit(&[seen(Some(7))], &mut ledger, &mut store, &ctx(), 1).unwrap();
        assert_eq!(first.len(), 1);

        let second = emit(&[seen(Some(7))], &mut ledger, &mut store, &ctx(), 1).unwrap();
        assert!(second.is_empty());

        assert_eq!(store.events_for_track("run", 7).unwrap().len(), 1);
    }

    #[test]
    fn test_untracked_detections_never_emitted() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut ledger = TrackLedger::new();

        let events = emit(&[seen(None), seen(None)], &mut ledger, &mut store, &ctx(), 1).unwrap();
        assert!(events.is_empty());
        assert_eq!(store.count().unwrap(), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_duplicate_id_within_cycle() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut ledger = TrackLedger::new();

        let events = emit(
            &[seen(Some(1)), seen(Some(1)), seen(Some(2))],
            &mut ledger,
            &mut store,
            &ctx(),
            1,
        )
        .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_failed_append_leaves_id_unclaimed() {
        let mut store = FlakyStore::failing(1);
        let mut ledger = TrackLedger::new();

        let err = emit(&[seen(Some(9))], &mut ledger, &mut store, &ctx(), 1).unwrap_err();
        assert_eq!(err.track_id, 9);
        assert!(!ledger.is_claimed(9));

        // Store recovered: the same id can still be recorded, exactly once
        let events = emit(&[seen(Some(9))], &mut ledger, &mut store, &ctx(), 1).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(store.inner().count().unwrap(), 1);
    }

    #[test]
    fn test_retry_within_cycle() {
        let mut store = FlakyStore::failing(2);
        let mut ledger = TrackLedger::new();

        let events = emit(&[seen(Some(3))], &mut ledger, &mut store, &ctx(), 3).unwrap();
        assert_eq!(events.len(), 1);
        assert!(ledger.is_claimed(3));
        assert_eq!(store.inner().count().unwrap(), 1);
    }

    #[test]
    fn test_earlier_events_kept_on_failure() {
        let mut store = FlakyStore::failing_after(1, 5);
        let mut ledger = TrackLedger::new();

        let err = emit(
            &[seen(Some(1)), seen(Some(2))],
            &mut ledger,
            &mut store,
            &ctx(),
            2,
        )
        .unwrap_err();
        assert_eq!(err.track_id, 2);
        assert_eq!(err.attempts, 2);
        assert!(ledger.is_claimed(1));
        assert!(!ledger.is_claimed(2));
        assert_eq!(store.inner().count().unwrap(), 1);
    }
}
