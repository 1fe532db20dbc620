use serde::{Deserialize, Serialize};

use veritas_core::{AccountHolderId, PolicyId};

/// Extraction confidence at or above which a parsed policy is trusted without
/// a manual review.
pub const AUTO_VERIFY_THRESHOLD: f64 = 85.0;

/// Whether a coverage line is the policy's main personal-property limit or a
/// category-specific cap.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageKind {
    #[serde(rename = "main")]
    Main,
    #[serde(rename = "sub-limit")]
    SubLimit,
}

impl CoverageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageKind::Main => "main",
            CoverageKind::SubLimit => "sub-limit",
        }
    }
}

/// One coverage line of a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageEntry {
    pub category: String,
    pub limit: f64,
    pub kind: CoverageKind,
}

impl CoverageEntry {
    pub fn main(category: impl Into<String>, limit: f64) -> Self {
        Self {
            category: category.into(),
            limit,
            kind: CoverageKind::Main,
        }
    }

    pub fn sub_limit(category: impl Into<String>, limit: f64) -> Self {
        Self {
            category: category.into(),
            limit,
            kind: CoverageKind::SubLimit,
        }
    }
}

/// A policy as extracted from an uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPolicy {
    pub id: PolicyId,
    pub policy_number: String,
    pub provider: String,
    pub coverage: Vec<CoverageEntry>,
    pub deductible: f64,
    pub exclusions: Vec<String>,
    /// Extraction confidence, 0–100.
    pub confidence_score: f64,
    pub is_verified: bool,
}

impl ParsedPolicy {
    /// Build an unverified policy. Use [`ParsedPolicy::auto_verified`] to apply
    /// the confidence threshold.
    pub fn new(
        policy_number: impl Into<String>,
        provider: impl Into<String>,
        coverage: Vec<CoverageEntry>,
        deductible: f64,
        exclusions: Vec<String>,
        confidence_score: f64,
    ) -> Self {
        Self {
            id: PolicyId::new(),
            policy_number: policy_number.into(),
            provider: provider.into(),
            coverage,
            deductible,
            exclusions,
            confidence_score,
            is_verified: false,
        }
    }

    /// Mark the policy verified when its confidence reaches `threshold`.
    pub fn auto_verified(mut self, threshold: f64) -> Self {
        if self.confidence_score >= threshold {
            self.is_verified = true;
        }
        self
    }

    /// Manual verification by the user.
    pub fn verify(&mut self) {
        self.is_verified = true;
    }

    /// The first `main` coverage line, in declaration order.
    pub fn main_coverage(&self) -> Option<&CoverageEntry> {
        self.coverage.iter().find(|c| c.kind == CoverageKind::Main)
    }

    pub fn sub_limits(&self) -> impl Iterator<Item = &CoverageEntry> {
        self.coverage.iter().filter(|c| c.kind == CoverageKind::SubLimit)
    }
}

/// The insured person named on claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHolder {
    pub id: AccountHolderId,
    pub name: String,
    pub address: String,
}

impl AccountHolder {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: AccountHolderId::new(),
            name: name.into(),
            address: address.into(),
        }
    }
}
