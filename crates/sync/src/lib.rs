//! Cell synchronization engine.
//!
//! Keeps the in-memory sparse worksheet state authoritative for the
//! grid while translating rapid local edits into a minimal, safe
//! stream of remote writes: per-cell debounce, at most one in-flight
//! write per cell, optimistic application with rollback on failure,
//! and per-tab pending state that survives worksheet switching.

pub mod client;
pub mod coalescer;
pub mod convert;
pub mod events;
pub mod session;

pub use client::{SyncClient, SyncError};
pub use coalescer::{Completion, EditCoalescer, PendingWrite, GRID_DEBOUNCE, WORKBOOK_DEBOUNCE};
pub use events::{EventCallback, EventCollector, SessionEvent};
pub use session::{SessionError, SyncSession};
