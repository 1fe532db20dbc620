//! Collaborator inputs and response payloads.
//!
//! These are AI results, not vault events: the engine decides how (and
//! whether) each one changes state.

use serde::{Deserialize, Serialize};

use veritas_claims::{CoverageEntry, ParsedPolicy};
use veritas_inventory::{Enrichment, ItemAnalysis, WebFact};

/// A user-supplied file before it becomes a proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFile {
    pub file_name: String,
    pub mime_type: String,
    #[serde(default)]
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.trim().to_ascii_lowercase().starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.trim().to_ascii_lowercase().starts_with("video/")
    }
}

/// Item details recognised in a photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysis {
    pub item_name: String,
    pub description: String,
    pub category: String,
    pub estimated_value: f64,
    pub brand: Option<String>,
    pub model: Option<String>,
}

impl ImageAnalysis {
    pub fn into_item_analysis(self) -> ItemAnalysis {
        ItemAnalysis {
            name: self.item_name,
            description: self.description,
            category: self.category,
            estimated_value: self.estimated_value,
            brand: self.brand,
            model: self.model,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriceKind {
    Rcv,
    Acv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSource {
    pub url: String,
    pub price: f64,
    pub kind: PriceKind,
    pub title: String,
}

/// Replacement cost (new) and actual cash value (used) with their sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPrice {
    pub rcv: f64,
    pub acv: f64,
    pub sources: Vec<PriceSource>,
}

impl MarketPrice {
    pub fn into_enrichment(self) -> Enrichment {
        Enrichment::MarketValuation {
            rcv: self.rcv,
            acv: self.acv,
            sources: self.sources.into_iter().map(|s| s.url).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighestRcv {
    pub price: f64,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebIntelligence {
    pub facts: Vec<WebFact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApparelMatch {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub msrp: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialNumberReading {
    pub serial_number: String,
}

impl SerialNumberReading {
    /// `None` when nothing legible was found.
    pub fn into_serial(self) -> Option<String> {
        let s = self.serial_number.trim();
        if s.is_empty() { None } else { Some(s.to_string()) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofStrength {
    /// 0–100.
    pub score: f64,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depreciation {
    pub acv: f64,
    pub reasoning: String,
}

/// Fields extracted from a policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyExtraction {
    pub policy_number: String,
    pub provider: String,
    pub coverage: Vec<CoverageEntry>,
    pub deductible: f64,
    #[serde(default)]
    pub exclusions: Vec<String>,
    pub confidence_score: f64,
}

impl PolicyExtraction {
    /// Build a policy, auto-verified when confidence reaches `threshold`.
    pub fn into_policy(self, threshold: f64) -> ParsedPolicy {
        ParsedPolicy::new(
            self.policy_number,
            self.provider,
            self.coverage,
            self.deductible,
            self.exclusions,
            self.confidence_score,
        )
        .auto_verified(threshold)
    }
}
