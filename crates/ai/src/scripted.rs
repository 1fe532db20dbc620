//! In-memory collaborators (for tests/dev).
//!
//! Responses are scripted up front and every call is recorded, so callers can
//! assert both on outcomes and on which services were (not) consulted.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use veritas_claims::{AccountHolder, ClaimValuation, DraftClaim, ParsedPolicy, claim_description};
use veritas_core::{ItemId, ProofId};
use veritas_inventory::{Item, Proof, ProofSuggestion};

use crate::collaborator::{
    ApparelIdentifier, ClaimAssembler, DepreciationCalculator, FileContentReader, FrameExtractor,
    ImageAnalyzer, MarketPricer, PolicyParser, ProofMatcher, ProofStrengthScorer, SerialNumberExtractor,
    WebEnricher,
};
use crate::error::AiError;
use crate::payload::{
    ApparelMatch, Depreciation, HighestRcv, ImageAnalysis, InputFile, MarketPrice, PolicyExtraction,
    ProofStrength, SerialNumberReading, WebIntelligence,
};

/// One recorded collaborator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorCall {
    AnalyzeImage { file_name: String },
    ReadContent { file_name: String },
    MarketPrice { item_id: ItemId },
    HighestRcv { item_id: ItemId },
    WebEnrich { item_id: ItemId },
    IdentifyApparel { file_name: String },
    ExtractSerial { file_name: String },
    ScoreProofs { item_id: ItemId },
    CalculateAcv { item_id: ItemId },
    MatchProofs { item_id: ItemId, candidates: Vec<ProofId> },
    ParsePolicy { file_name: String },
    AssembleClaim { item_id: ItemId },
    ExtractFrames { file_name: String, frames_per_second: u32 },
}

#[derive(Debug, Default)]
struct Script {
    analyses: HashMap<String, Result<ImageAnalysis, AiError>>,
    delays: HashMap<String, Duration>,
    read_failures: HashSet<String>,
    matches: Vec<(String, f64, String)>,
    foreign_matches: Vec<ProofSuggestion>,
    market_price: Option<Result<MarketPrice, AiError>>,
    highest_rcv: Option<Result<HighestRcv, AiError>>,
    web: Option<Result<WebIntelligence, AiError>>,
    apparel: Option<Result<ApparelMatch, AiError>>,
    serial: Option<Result<SerialNumberReading, AiError>>,
    strength: Option<Result<ProofStrength, AiError>>,
    depreciation: Option<Result<Depreciation, AiError>>,
    policy: Option<Result<PolicyExtraction, AiError>>,
    claim_failure: Option<AiError>,
    frames: Option<Result<usize, AiError>>,
    calls: Vec<CollaboratorCall>,
}

/// Scripted, call-recording implementation of every collaborator trait.
#[derive(Debug, Default)]
pub struct ScriptedCollaborators {
    script: Mutex<Script>,
}

impl Script {
    fn record(&mut self, call: CollaboratorCall) {
        tracing::debug!(?call, "scripted collaborator called");
        self.calls.push(call);
    }
}

fn not_scripted(what: &str) -> AiError {
    AiError::unavailable(format!("no scripted {what} response"))
}

fn file_stem(file_name: &str) -> &str {
    file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem)
}

impl ScriptedCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_script(self, f: impl FnOnce(&mut Script)) -> Self {
        f(&mut self.lock());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Analysis result for the photo named `file_name`.
    pub fn with_analysis(self, file_name: impl Into<String>, result: Result<ImageAnalysis, AiError>) -> Self {
        let file_name = file_name.into();
        self.with_script(|s| {
            s.analyses.insert(file_name, result);
        })
    }

    /// Make the analysis of `file_name` take `delay` (tokio time).
    pub fn with_delay(self, file_name: impl Into<String>, delay: Duration) -> Self {
        let file_name = file_name.into();
        self.with_script(|s| {
            s.delays.insert(file_name, delay);
        })
    }

    pub fn with_read_failure(self, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        self.with_script(|s| {
            s.read_failures.insert(file_name);
        })
    }

    /// Suggest any candidate proof named `proof_file_name`.
    pub fn with_match(self, proof_file_name: impl Into<String>, confidence: f64, reason: impl Into<String>) -> Self {
        let entry = (proof_file_name.into(), confidence, reason.into());
        self.with_script(|s| s.matches.push(entry))
    }

    /// Suggest a proof regardless of the candidate set.
    pub fn with_foreign_match(self, proof_id: ProofId) -> Self {
        self.with_script(|s| {
            s.foreign_matches
                .push(ProofSuggestion::new(proof_id, 99.0, "unrelated proof"))
        })
    }

    pub fn with_market_price(self, result: Result<MarketPrice, AiError>) -> Self {
        self.with_script(|s| s.market_price = Some(result))
    }

    pub fn with_highest_rcv(self, result: Result<HighestRcv, AiError>) -> Self {
        self.with_script(|s| s.highest_rcv = Some(result))
    }

    pub fn with_web_facts(self, result: Result<WebIntelligence, AiError>) -> Self {
        self.with_script(|s| s.web = Some(result))
    }

    pub fn with_apparel(self, result: Result<ApparelMatch, AiError>) -> Self {
        self.with_script(|s| s.apparel = Some(result))
    }

    pub fn with_serial(self, result: Result<SerialNumberReading, AiError>) -> Self {
        self.with_script(|s| s.serial = Some(result))
    }

    pub fn with_proof_strength(self, result: Result<ProofStrength, AiError>) -> Self {
        self.with_script(|s| s.strength = Some(result))
    }

    pub fn with_depreciation(self, result: Result<Depreciation, AiError>) -> Self {
        self.with_script(|s| s.depreciation = Some(result))
    }

    pub fn with_policy(self, result: Result<PolicyExtraction, AiError>) -> Self {
        self.with_script(|s| s.policy = Some(result))
    }

    pub fn with_claim_failure(self, error: AiError) -> Self {
        self.with_script(|s| s.claim_failure = Some(error))
    }

    /// Number of frames the extractor yields (or its failure).
    pub fn with_frames(self, result: Result<usize, AiError>) -> Self {
        self.with_script(|s| s.frames = Some(result))
    }

    pub fn calls(&self) -> Vec<CollaboratorCall> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&CollaboratorCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Default analysis for unscripted photos: named after the file.
    fn default_analysis(file_name: &str) -> ImageAnalysis {
        let stem = file_stem(file_name);
        ImageAnalysis {
            item_name: stem.to_string(),
            description: format!("Photo of {stem}"),
            category: "Household".to_string(),
            estimated_value: 100.0,
            brand: None,
            model: None,
        }
    }

    fn scripted<T: Clone>(
        &self,
        call: CollaboratorCall,
        what: &str,
        pick: impl FnOnce(&Script) -> &Option<Result<T, AiError>>,
    ) -> Result<T, AiError> {
        let mut script = self.lock();
        script.record(call);
        pick(&*script).clone().unwrap_or_else(|| Err(not_scripted(what)))
    }
}

#[async_trait]
impl ImageAnalyzer for ScriptedCollaborators {
    async fn analyze_image(&self, proof: &Proof) -> Result<ImageAnalysis, AiError> {
        let (delay, result) = {
            let mut script = self.lock();
            script.record(CollaboratorCall::AnalyzeImage {
                file_name: proof.file_name.clone(),
            });
            (
                script.delays.get(&proof.file_name).copied(),
                script
                    .analyses
                    .get(&proof.file_name)
                    .cloned()
                    .unwrap_or_else(|| Ok(Self::default_analysis(&proof.file_name))),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

#[async_trait]
impl MarketPricer for ScriptedCollaborators {
    async fn market_price(&self, item: &Item) -> Result<MarketPrice, AiError> {
        self.scripted(CollaboratorCall::MarketPrice { item_id: item.id }, "market price", |s| &s.market_price)
    }

    async fn highest_rcv(&self, item: &Item) -> Result<HighestRcv, AiError> {
        self.scripted(CollaboratorCall::HighestRcv { item_id: item.id }, "highest RCV", |s| &s.highest_rcv)
    }
}

#[async_trait]
impl WebEnricher for ScriptedCollaborators {
    async fn enrich(&self, item: &Item) -> Result<WebIntelligence, AiError> {
        self.scripted(CollaboratorCall::WebEnrich { item_id: item.id }, "web enrichment", |s| &s.web)
    }
}

#[async_trait]
impl ApparelIdentifier for ScriptedCollaborators {
    async fn identify_apparel(&self, proof: &Proof) -> Result<ApparelMatch, AiError> {
        let call = CollaboratorCall::IdentifyApparel {
            file_name: proof.file_name.clone(),
        };
        self.scripted(call, "apparel", |s| &s.apparel)
    }
}

#[async_trait]
impl SerialNumberExtractor for ScriptedCollaborators {
    async fn extract_serial(&self, proof: &Proof) -> Result<SerialNumberReading, AiError> {
        let mut script = self.lock();
        script.record(CollaboratorCall::ExtractSerial {
            file_name: proof.file_name.clone(),
        });
        script.serial.clone().unwrap_or_else(|| Ok(SerialNumberReading::default()))
    }
}

#[async_trait]
impl ProofStrengthScorer for ScriptedCollaborators {
    async fn score_proofs(&self, item: &Item) -> Result<ProofStrength, AiError> {
        self.scripted(CollaboratorCall::ScoreProofs { item_id: item.id }, "proof strength", |s| &s.strength)
    }
}

#[async_trait]
impl DepreciationCalculator for ScriptedCollaborators {
    async fn calculate_acv(&self, item: &Item) -> Result<Depreciation, AiError> {
        self.scripted(CollaboratorCall::CalculateAcv { item_id: item.id }, "depreciation", |s| &s.depreciation)
    }
}

#[async_trait]
impl ProofMatcher for ScriptedCollaborators {
    async fn match_proofs(&self, item: &Item, candidates: &[Proof]) -> Result<Vec<ProofSuggestion>, AiError> {
        let mut script = self.lock();
        script.record(CollaboratorCall::MatchProofs {
            item_id: item.id,
            candidates: candidates.iter().map(|p| p.id).collect(),
        });

        let mut out: Vec<ProofSuggestion> = candidates
            .iter()
            .filter_map(|proof| {
                script
                    .matches
                    .iter()
                    .find(|(name, _, _)| *name == proof.file_name)
                    .map(|(_, confidence, reason)| ProofSuggestion::new(proof.id, *confidence, reason.clone()))
            })
            .collect();
        out.extend(script.foreign_matches.iter().cloned());
        Ok(out)
    }
}

#[async_trait]
impl PolicyParser for ScriptedCollaborators {
    async fn parse_policy(&self, file: &InputFile) -> Result<PolicyExtraction, AiError> {
        let call = CollaboratorCall::ParsePolicy {
            file_name: file.file_name.clone(),
        };
        self.scripted(call, "policy", |s| &s.policy)
    }
}

#[async_trait]
impl ClaimAssembler for ScriptedCollaborators {
    async fn assemble_claim(
        &self,
        item: &Item,
        policy: &ParsedPolicy,
        claimant: &AccountHolder,
    ) -> Result<DraftClaim, AiError> {
        {
            let mut script = self.lock();
            script.record(CollaboratorCall::AssembleClaim { item_id: item.id });
            if let Some(err) = script.claim_failure.clone() {
                return Err(err);
            }
        }

        let coverage = item
            .recommended_coverage
            .clone()
            .or_else(|| policy.main_coverage().cloned())
            .ok_or_else(|| AiError::InvalidInput("no coverage line applies to the item".to_string()))?;
        let valuation = ClaimValuation::assess(item.rcv, item.original_cost, &coverage);
        let description = claim_description(item.brand.as_deref(), item.model.as_deref(), &item.name, &item.description);

        Ok(DraftClaim::new(
            item.id,
            policy.id,
            coverage,
            claimant.name.clone(),
            valuation.amount,
            description,
            Utc::now(),
        ))
    }
}

#[async_trait]
impl FileContentReader for ScriptedCollaborators {
    async fn read_content(&self, file: &InputFile) -> Result<String, AiError> {
        let mut script = self.lock();
        script.record(CollaboratorCall::ReadContent {
            file_name: file.file_name.clone(),
        });
        if script.read_failures.contains(&file.file_name) {
            return Err(AiError::InvalidInput(format!("cannot read {}", file.file_name)));
        }
        Ok(format!("data:{};name={};bytes={}", file.mime_type, file.file_name, file.bytes.len()))
    }
}

#[async_trait]
impl FrameExtractor for ScriptedCollaborators {
    async fn extract_frames(&self, video: &InputFile, frames_per_second: u32) -> Result<Vec<InputFile>, AiError> {
        let mut script = self.lock();
        script.record(CollaboratorCall::ExtractFrames {
            file_name: video.file_name.clone(),
            frames_per_second,
        });
        let count = script.frames.clone().unwrap_or(Ok(0))?;
        let stem = file_stem(&video.file_name);
        Ok((0..count)
            .map(|i| InputFile::new(format!("{stem}-frame-{i}.jpg"), "image/jpeg", Vec::new()))
            .collect())
    }
}
