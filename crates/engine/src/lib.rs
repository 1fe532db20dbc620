//! `veritas-engine`
//!
//! **Responsibility:** orchestration of the vault.
//!
//! [`Vault`] owns the entity store, the activity log and the sync indicator.
//! Every operation validates against the current snapshot, awaits external
//! collaborators without holding the store lock, then applies its changes as
//! vault events and records at most one activity entry.

pub mod claims;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod ingestion;
pub mod proofs;
pub mod review;
pub mod vault;

pub use config::{EngineConfig, FRAME_SAMPLING_RATE};
pub use error::{EngineError, EngineResult};
pub use ingestion::{ANALYSIS_CANCELLED, IngestReport};
pub use review::BulkOutcome;
pub use vault::{Vault, VaultSnapshot};

pub use tokio_util::sync::CancellationToken;
