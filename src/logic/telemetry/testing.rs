//! Test doubles for the telemetry store

use super::event::TelemetryEvent;
use super::store::{SqliteStore, StoreError, TelemetryStore};

/// In-memory SQLite store that fails a scripted number of appends
pub struct FlakyStore {
    inner: SqliteStore,
    ok_before_failing: u32,
    failures_left: u32,
}

impl FlakyStore {
    /// Fail the next `failures` appends, then succeed
    pub fn failing(failures: u32) -> Self {
        Self::failing_after(0, failures)
    }

    /// Succeed `ok` times, fail `failures` times, then succeed
    pub fn failing_after(ok: u32, failures: u32) -> Self {
        Self {
            inner: SqliteStore::open_in_memory().expect("in-memory sqlite"),
            ok_before_failing: ok,
            failures_left: failures,
        }
    }

    pub fn inner(&self) -> &SqliteStore {
        &self.inner
    }
}

impl TelemetryStore for FlakyStore {
    fn append(&mut self, event: &TelemetryEvent) -> Result<i64, StoreError> {
        if self.ok_before_failing > 0 {
            self.ok_before_failing -= 1;
            return self.inner.append(event);
        }
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.append(event)
    }

    fn close(self) -> Result<(), StoreError> {
        self.inner.close()
    }
}
