//! `veritas-ai`
//!
//! **Responsibility:** boundary to the external analysis services.
//!
//! - Each collaborator is an async trait; the engine only sees these traits.
//! - Collaborators return payloads, never mutate vault state.
//! - [`ScriptedCollaborators`] is an in-memory implementation for tests/dev.

pub mod collaborator;
pub mod error;
pub mod payload;
pub mod scripted;

pub use collaborator::{
    ApparelIdentifier, ClaimAssembler, Collaborators, DepreciationCalculator, FileContentReader,
    FrameExtractor, ImageAnalyzer, MarketPricer, PolicyParser, ProofMatcher, ProofStrengthScorer,
    SerialNumberExtractor, WebEnricher,
};
pub use error::AiError;
pub use payload::{
    ApparelMatch, Depreciation, HighestRcv, ImageAnalysis, InputFile, MarketPrice, PolicyExtraction,
    PriceKind, PriceSource, ProofStrength, SerialNumberReading, WebIntelligence,
};
pub use scripted::{CollaboratorCall, ScriptedCollaborators};
