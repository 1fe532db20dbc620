use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use veritas_claims::{CoverageEntry, DraftClaim};
use veritas_core::{DomainError, Entity, ItemId, ProofId};

use crate::proof::{Proof, ProofSuggestion};

/// Description given to an item while its analysis is outstanding.
pub const PLACEHOLDER_DESCRIPTION: &str = "Analyzing...";

/// Category assigned to items created from non-image files.
pub const DOCUMENTS_CATEGORY: &str = "Documents";

/// Item lifecycle.
///
/// ```text
/// processing ──► needs-review ──► active ──► claimed
///     │  ▲            │
///     ▼  │            ▼
///     error        rejected
/// ```
///
/// Deletion is allowed from every state and is not modelled as a transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    Processing,
    NeedsReview,
    Active,
    Rejected,
    Claimed,
    Error,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Processing => "processing",
            ItemStatus::NeedsReview => "needs-review",
            ItemStatus::Active => "active",
            ItemStatus::Rejected => "rejected",
            ItemStatus::Claimed => "claimed",
            ItemStatus::Error => "error",
        }
    }

    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        use ItemStatus::*;
        matches!(
            (self, next),
            (Processing, NeedsReview)
                | (Processing, Error)
                | (NeedsReview, Active)
                | (NeedsReview, Rejected)
                | (Active, Claimed)
                | (Error, Processing)
        )
    }

    pub fn ensure_transition(self, next: ItemStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::transition(self, next))
        }
    }
}

impl core::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the item entered the vault.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemOrigin {
    #[default]
    ManualUpload,
    RoomScan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebFact {
    pub fact: String,
    pub source: String,
}

/// An inventoried asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub status: ItemStatus,
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub original_cost: f64,
    pub rcv: Option<f64>,
    pub acv: Option<f64>,
    pub acv_reasoning: Option<String>,
    pub proof_strength_score: Option<f64>,
    pub proof_strength_feedback: Option<String>,
    pub linked_proofs: Vec<Proof>,
    pub suggested_proofs: Vec<ProofSuggestion>,
    pub recommended_coverage: Option<CoverageEntry>,
    pub claims: Vec<DraftClaim>,
    pub is_claimed: bool,
    pub notes: Vec<String>,
    pub error_message: Option<String>,
    pub web_facts: Vec<WebFact>,
    pub valuation_sources: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub origin: ItemOrigin,
}

impl Item {
    /// A `processing` placeholder for a file whose analysis has not finished.
    pub fn placeholder(file_name: impl Into<String>, origin: ItemOrigin, now: DateTime<Utc>) -> Self {
        Self {
            id: ItemId::new(),
            status: ItemStatus::Processing,
            name: file_name.into(),
            description: PLACEHOLDER_DESCRIPTION.to_string(),
            category: String::new(),
            brand: None,
            model: None,
            serial_number: None,
            original_cost: 0.0,
            rcv: None,
            acv: None,
            acv_reasoning: None,
            proof_strength_score: None,
            proof_strength_feedback: None,
            linked_proofs: Vec::new(),
            suggested_proofs: Vec::new(),
            recommended_coverage: None,
            claims: Vec::new(),
            is_claimed: false,
            notes: Vec::new(),
            error_message: None,
            web_facts: Vec::new(),
            valuation_sources: Vec::new(),
            created_at: now,
            last_modified_at: now,
            origin,
        }
    }

    pub fn first_image_proof(&self) -> Option<&Proof> {
        self.linked_proofs.iter().find(|p| p.is_image())
    }

    pub fn has_suggestion_for(&self, proof_id: ProofId) -> bool {
        self.suggested_proofs.iter().any(|s| s.proof_id == proof_id)
    }

    /// Best known value: RCV, then ACV, then original cost.
    pub fn best_value(&self) -> f64 {
        self.rcv.or(self.acv).unwrap_or(self.original_cost)
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }
}

/// Result of analysing an item's photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAnalysis {
    pub name: String,
    pub description: String,
    pub category: String,
    pub estimated_value: f64,
    pub brand: Option<String>,
    pub model: Option<String>,
}

impl ItemAnalysis {
    /// Audit note recorded on the item when the analysis is applied.
    pub fn note(&self) -> String {
        format!(
            "AI suggested category '{}' with estimated value ${:.2}",
            self.category, self.estimated_value
        )
    }
}

/// User edits. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub original_cost: Option<f64>,
    pub rcv: Option<f64>,
    pub acv: Option<f64>,
    pub note: Option<String>,
}

impl ItemPatch {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DomainError::validation("name cannot be empty"));
        }
        for (field, value) in [
            ("original_cost", self.original_cost),
            ("rcv", self.rcv),
            ("acv", self.acv),
        ] {
            if value.is_some_and(|v| !(v.is_finite() && v >= 0.0)) {
                return Err(DomainError::validation(format!("{field} must be a non-negative amount")));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &ItemPatch::default()
    }

    /// Names of the fields this patch touches, for audit details.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        let mut push = |set: bool, name: &'static str| {
            if set {
                out.push(name);
            }
        };
        push(self.name.is_some(), "name");
        push(self.description.is_some(), "description");
        push(self.category.is_some(), "category");
        push(self.brand.is_some(), "brand");
        push(self.model.is_some(), "model");
        push(self.serial_number.is_some(), "serialNumber");
        push(self.original_cost.is_some(), "originalCost");
        push(self.rcv.is_some(), "rcv");
        push(self.acv.is_some(), "acv");
        push(self.note.is_some(), "note");
        out
    }

    pub(crate) fn apply_to(&self, item: &mut Item) {
        if let Some(v) = &self.name {
            item.name = v.clone();
        }
        if let Some(v) = &self.description {
            item.description = v.clone();
        }
        if let Some(v) = &self.category {
            item.category = v.clone();
        }
        if let Some(v) = &self.brand {
            item.brand = Some(v.clone());
        }
        if let Some(v) = &self.model {
            item.model = Some(v.clone());
        }
        if let Some(v) = &self.serial_number {
            item.serial_number = Some(v.clone());
        }
        if let Some(v) = self.original_cost {
            item.original_cost = v;
        }
        if let Some(v) = self.rcv {
            item.rcv = Some(v);
        }
        if let Some(v) = self.acv {
            item.acv = Some(v);
        }
        if let Some(v) = &self.note {
            item.notes.push(v.clone());
        }
    }
}

/// Output of a single per-item enrichment action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Enrichment {
    MarketValuation {
        rcv: f64,
        acv: f64,
        sources: Vec<String>,
    },
    HighestRcv {
        rcv: f64,
        source: String,
    },
    WebFacts {
        facts: Vec<WebFact>,
    },
    Apparel {
        brand: Option<String>,
        model: Option<String>,
        msrp: Option<f64>,
    },
    SerialNumber {
        serial_number: String,
    },
    ProofStrength {
        score: f64,
        feedback: String,
    },
    Depreciation {
        acv: f64,
        reasoning: String,
    },
}

impl Enrichment {
    /// Collaborator amounts must be finite and non-negative; scores stay
    /// within 0-100.
    pub fn validate(&self) -> Result<(), DomainError> {
        let amounts: Vec<(&str, f64)> = match self {
            Enrichment::MarketValuation { rcv, acv, .. } => vec![("rcv", *rcv), ("acv", *acv)],
            Enrichment::HighestRcv { rcv, .. } => vec![("rcv", *rcv)],
            Enrichment::Apparel { msrp, .. } => msrp.iter().map(|m| ("msrp", *m)).collect(),
            Enrichment::Depreciation { acv, .. } => vec![("acv", *acv)],
            Enrichment::ProofStrength { score, .. } => {
                if !(0.0..=100.0).contains(score) {
                    return Err(DomainError::validation("proof strength score must be between 0 and 100"));
                }
                Vec::new()
            }
            Enrichment::WebFacts { .. } | Enrichment::SerialNumber { .. } => Vec::new(),
        };
        for (field, value) in amounts {
            if !(value.is_finite() && value >= 0.0) {
                return Err(DomainError::validation(format!("{field} must be a non-negative amount")));
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Enrichment::MarketValuation { .. } => "market valuation",
            Enrichment::HighestRcv { .. } => "highest RCV",
            Enrichment::WebFacts { .. } => "web enrichment",
            Enrichment::Apparel { .. } => "apparel identification",
            Enrichment::SerialNumber { .. } => "serial number",
            Enrichment::ProofStrength { .. } => "proof strength",
            Enrichment::Depreciation { .. } => "depreciation",
        }
    }

    pub(crate) fn apply_to(&self, item: &mut Item) {
        match self {
            Enrichment::MarketValuation { rcv, acv, sources } => {
                item.rcv = Some(*rcv);
                item.acv = Some(*acv);
                for s in sources {
                    if !item.valuation_sources.contains(s) {
                        item.valuation_sources.push(s.clone());
                    }
                }
            }
            Enrichment::HighestRcv { rcv, source } => {
                item.rcv = Some(*rcv);
                if !item.valuation_sources.contains(source) {
                    item.valuation_sources.push(source.clone());
                }
            }
            Enrichment::WebFacts { facts } => {
                for f in facts {
                    if !item.web_facts.contains(f) {
                        item.web_facts.push(f.clone());
                    }
                }
            }
            Enrichment::Apparel { brand, model, msrp } => {
                if brand.is_some() {
                    item.brand = brand.clone();
                }
                if model.is_some() {
                    item.model = model.clone();
                }
                if let Some(msrp) = msrp {
                    item.rcv = Some(*msrp);
                }
            }
            Enrichment::SerialNumber { serial_number } => {
                item.serial_number = Some(serial_number.clone());
            }
            Enrichment::ProofStrength { score, feedback } => {
                item.proof_strength_score = Some(*score);
                item.proof_strength_feedback = Some(feedback.clone());
            }
            Enrichment::Depreciation { acv, reasoning } => {
                item.acv = Some(*acv);
                item.acv_reasoning = Some(reasoning.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_table() {
        use ItemStatus::*;
        assert!(Processing.can_transition_to(NeedsReview));
        assert!(Processing.can_transition_to(Error));
        assert!(NeedsReview.can_transition_to(Active));
        assert!(NeedsReview.can_transition_to(Rejected));
        assert!(Active.can_transition_to(Claimed));
        assert!(Error.can_transition_to(Processing));

        assert!(!Processing.can_transition_to(Active));
        assert!(!Rejected.can_transition_to(Active));
        assert!(!Claimed.can_transition_to(Active));
        assert!(!Active.can_transition_to(NeedsReview));
    }

    #[test]
    fn illegal_transition_names_both_states() {
        let err = ItemStatus::Rejected.ensure_transition(ItemStatus::Claimed).unwrap_err();
        assert_eq!(err, DomainError::transition("rejected", "claimed"));
    }

    #[test]
    fn placeholder_shape() {
        let item = Item::placeholder("tv.jpg", ItemOrigin::RoomScan, Utc::now());
        assert_eq!(item.status, ItemStatus::Processing);
        assert_eq!(item.description, PLACEHOLDER_DESCRIPTION);
        assert_eq!(item.name, "tv.jpg");
        assert_eq!(item.original_cost, 0.0);
        assert_eq!(item.origin, ItemOrigin::RoomScan);
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_value(ItemStatus::NeedsReview).unwrap();
        assert_eq!(json, "needs-review");
    }

    #[test]
    fn patch_validation() {
        let bad = ItemPatch {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = ItemPatch {
            rcv: Some(-1.0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let ok = ItemPatch {
            category: Some("Electronics".into()),
            original_cost: Some(99.0),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.fields(), vec!["category", "originalCost"]);
    }

    #[test]
    fn enrichment_rejects_bad_amounts() {
        let negative = Enrichment::Depreciation {
            acv: -40.0,
            reasoning: "wear".into(),
        };
        assert!(negative.validate().is_err());
        let nan_msrp = Enrichment::Apparel {
            brand: None,
            model: None,
            msrp: Some(f64::NAN),
        };
        assert!(nan_msrp.validate().is_err());
        let score = Enrichment::ProofStrength {
            score: f64::NAN,
            feedback: String::new(),
        };
        assert!(score.validate().is_err());
        let missing_msrp = Enrichment::Apparel {
            brand: Some("Acme".into()),
            model: None,
            msrp: None,
        };
        assert!(missing_msrp.validate().is_ok());
    }

    #[test]
    fn enrichment_does_not_duplicate_sources() {
        let mut item = Item::placeholder("a.jpg", ItemOrigin::ManualUpload, Utc::now());
        let e = Enrichment::MarketValuation {
            rcv: 10.0,
            acv: 6.0,
            sources: vec!["shop.example".into()],
        };
        e.apply_to(&mut item);
        e.apply_to(&mut item);
        assert_eq!(item.valuation_sources, vec!["shop.example".to_string()]);
        assert_eq!(item.rcv, Some(10.0));
        assert_eq!(item.best_value(), 10.0);
    }
}
