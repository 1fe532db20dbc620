use std::sync::Arc;

use async_trait::async_trait;

use veritas_claims::{AccountHolder, DraftClaim, ParsedPolicy};
use veritas_inventory::{Item, Proof, ProofSuggestion};

use crate::error::AiError;
use crate::payload::{
    ApparelMatch, Depreciation, HighestRcv, ImageAnalysis, InputFile, MarketPrice, PolicyExtraction,
    ProofStrength, SerialNumberReading, WebIntelligence,
};

/// Recognises an item from a photo.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze_image(&self, proof: &Proof) -> Result<ImageAnalysis, AiError>;
}

#[async_trait]
pub trait MarketPricer: Send + Sync {
    async fn market_price(&self, item: &Item) -> Result<MarketPrice, AiError>;

    /// The highest current replacement price found for the item.
    async fn highest_rcv(&self, item: &Item) -> Result<HighestRcv, AiError>;
}

#[async_trait]
pub trait WebEnricher: Send + Sync {
    async fn enrich(&self, item: &Item) -> Result<WebIntelligence, AiError>;
}

#[async_trait]
pub trait ApparelIdentifier: Send + Sync {
    async fn identify_apparel(&self, proof: &Proof) -> Result<ApparelMatch, AiError>;
}

#[async_trait]
pub trait SerialNumberExtractor: Send + Sync {
    async fn extract_serial(&self, proof: &Proof) -> Result<SerialNumberReading, AiError>;
}

#[async_trait]
pub trait ProofStrengthScorer: Send + Sync {
    async fn score_proofs(&self, item: &Item) -> Result<ProofStrength, AiError>;
}

#[async_trait]
pub trait DepreciationCalculator: Send + Sync {
    async fn calculate_acv(&self, item: &Item) -> Result<Depreciation, AiError>;
}

/// Proposes which unlinked proofs belong to an item.
///
/// Implementations may return suggestions for proofs outside `candidates`;
/// callers drop those.
#[async_trait]
pub trait ProofMatcher: Send + Sync {
    async fn match_proofs(&self, item: &Item, candidates: &[Proof]) -> Result<Vec<ProofSuggestion>, AiError>;
}

#[async_trait]
pub trait PolicyParser: Send + Sync {
    async fn parse_policy(&self, file: &InputFile) -> Result<PolicyExtraction, AiError>;
}

#[async_trait]
pub trait ClaimAssembler: Send + Sync {
    async fn assemble_claim(
        &self,
        item: &Item,
        policy: &ParsedPolicy,
        claimant: &AccountHolder,
    ) -> Result<DraftClaim, AiError>;
}

/// Turns raw file bytes into embeddable content (e.g. a data URL).
#[async_trait]
pub trait FileContentReader: Send + Sync {
    async fn read_content(&self, file: &InputFile) -> Result<String, AiError>;
}

/// Samples still frames from a video.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract_frames(&self, video: &InputFile, frames_per_second: u32) -> Result<Vec<InputFile>, AiError>;
}

/// Every collaborator the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub image_analyzer: Arc<dyn ImageAnalyzer>,
    pub market_pricer: Arc<dyn MarketPricer>,
    pub web_enricher: Arc<dyn WebEnricher>,
    pub apparel_identifier: Arc<dyn ApparelIdentifier>,
    pub serial_extractor: Arc<dyn SerialNumberExtractor>,
    pub proof_strength: Arc<dyn ProofStrengthScorer>,
    pub depreciation: Arc<dyn DepreciationCalculator>,
    pub proof_matcher: Arc<dyn ProofMatcher>,
    pub policy_parser: Arc<dyn PolicyParser>,
    pub claim_assembler: Arc<dyn ClaimAssembler>,
    pub file_reader: Arc<dyn FileContentReader>,
    pub frame_extractor: Arc<dyn FrameExtractor>,
}

impl Collaborators {
    /// Use one provider for every role.
    pub fn uniform<T>(provider: Arc<T>) -> Self
    where
        T: ImageAnalyzer
            + MarketPricer
            + WebEnricher
            + ApparelIdentifier
            + SerialNumberExtractor
            + ProofStrengthScorer
            + DepreciationCalculator
            + ProofMatcher
            + PolicyParser
            + ClaimAssembler
            + FileContentReader
            + FrameExtractor
            + 'static,
    {
        Self {
            image_analyzer: provider.clone(),
            market_pricer: provider.clone(),
            web_enricher: provider.clone(),
            apparel_identifier: provider.clone(),
            serial_extractor: provider.clone(),
            proof_strength: provider.clone(),
            depreciation: provider.clone(),
            proof_matcher: provider.clone(),
            policy_parser: provider.clone(),
            claim_assembler: provider.clone(),
            file_reader: provider.clone(),
            frame_extractor: provider,
        }
    }
}

impl core::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
