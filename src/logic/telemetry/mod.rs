//! Telemetry Module
//!
//! Deduplicated traffic telemetry: one persisted row per tracked object per
//! run, written at its first validated sighting.
//!
//! ## Structure
//! - `event.rs` - TelemetryEvent, RunMode, EmitContext (immutable, timestamped)
//! - `store.rs` - Append-only store contract + SQLite implementation
//! - `emitter.rs` - Ledger-gated emission with append retry
//!
//! ## Usage
//! ```ignore
//! use crate::logic::telemetry::{emit, SqliteStore, EmitContext};
//!
//! let mut store = SqliteStore::open(&path)?;
//! let events = emit(&validated, &mut ledger, &mut store, &ctx, 2)?;
//! store.close()?;
//! ```

pub mod event;
pub mod store;
pub mod emitter;

#[cfg(test)]
pub mod testing;

pub use event::{confidence_pct, new_run_id, EmitContext, RunMode, TelemetryEvent};

pub use store::{SqliteStore, StoreError, StoredEvent, TelemetryStore};

pub use emitter::{emit, EmitError};
