//! `veritas-core`: shared building blocks for the vault domain.
//!
//! This crate contains **pure domain** primitives (no IO, no async runtime):
//! strongly-typed identifiers, the domain error model, and the entity /
//! aggregate traits the entity store is built on.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::{Entity, find_by_id, find_by_id_mut};
pub use error::{DomainError, DomainResult};
pub use id::{AccountHolderId, ClaimId, ItemId, LogEntryId, PolicyId, ProofId};
