//! Entity store for the vault (reducer-style).
//!
//! This crate contains the canonical item / proof / claim state and the rules
//! that evolve it, implemented purely as deterministic domain logic (no IO, no
//! async, no storage). Every change is a [`VaultEvent`] applied by
//! [`VaultState`]'s `Aggregate` implementation.

pub mod item;
pub mod proof;
pub mod state;

pub use item::{
    DOCUMENTS_CATEGORY, Enrichment, Item, ItemAnalysis, ItemOrigin, ItemPatch, ItemStatus,
    PLACEHOLDER_DESCRIPTION, WebFact,
};
pub use proof::{Proof, ProofKind, ProofSuggestion};
pub use state::{CommandKind, UndoableAction, VaultChange, VaultCommand, VaultEvent, VaultState};
