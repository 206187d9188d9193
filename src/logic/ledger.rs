//! Track Deduplication Ledger
//!
//! Remembers which track ids already produced a telemetry event in the
//! current run. Insert-only: an id is never released once claimed.
//! One ledger per run, owned by the pipeline - never a global.

use std::collections::HashSet;

use super::detection::TrackId;

#[derive(Debug, Default)]
pub struct TrackLedger {
    claimed: HashSet<TrackId>,
}

impl TrackLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a track id.
    ///
    /// Returns `true` exactly once per id; every later call returns `false`
    /// without touching the ledger. Untracked detections (`None`) are never
    /// claimed.
    pub fn try_claim(&mut self, track_id: Option<TrackId>) -> bool {
        match track_id {
            Some(id) => self.claimed.insert(id),
            None => false,
        }
    }

    pub fn is_claimed(&self, track_id: TrackId) -> bool {
        self.claimed.contains(&track_id)
    }

    /// Number of ids claimed so far
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_once() {
        let mut ledger = TrackLedger::new();
        assert!(ledger.try_claim(Some(7)));
        assert!(!ledger.try_claim(Some(7)));
        assert!(!ledger.try_claim(Some(7)));
        assert!(ledger.is_claimed(7));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_untracked_never_claimed() {
        let mut ledger = TrackLedger::new();
        assert!(!ledger.try_claim(None));
        assert!(!ledger.try_claim(None));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_ledgers_are_independent() {
        let mut run_a = TrackLedger::new();
        let mut run_b = TrackLedger::new();
        assert!(run_a.try_claim(Some(1)));
        assert!(run_b.try_claim(Some(1)));
        assert!(!run_a.is_claimed(2));
    }

    #[test]
    fn test_many_ids() {
        let mut ledger = TrackLedger::new();
        for id in 0..100 {
            assert!(ledger.try_claim(Some(id)));
        }
        for id in 0..100 {
            assert!(!ledger.try_claim(Some(id)));
        }
        assert_eq!(ledger.len(), 100);
    }
}
