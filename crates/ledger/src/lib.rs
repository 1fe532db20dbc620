//! Activity & sync ledger.
//!
//! - [`ActivityLog`]: append-only audit trail of state-changing actions.
//! - [`SyncIndicator`]: debounced "saving → saved → idle" status signal.
//!
//! Neither talks to a backend; the sync indicator is a local affordance.

pub mod action;
pub mod entry;
pub mod log;
pub mod sync;

pub use action::ActivityAction;
pub use entry::ActivityLogEntry;
pub use log::{ActivityLog, DEFAULT_APP_TAG};
pub use sync::{SyncIndicator, SyncStatus, SyncTimings};
