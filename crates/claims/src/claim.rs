use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use veritas_core::{ClaimId, Entity, ItemId, PolicyId};

use crate::policy::{CoverageEntry, CoverageKind};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    #[default]
    Draft,
    /// Terminal.
    Submitted,
}

/// A draft insurance claim for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftClaim {
    pub id: ClaimId,
    pub asset_id: ItemId,
    pub policy_id: PolicyId,
    pub coverage: CoverageEntry,
    pub claimant: String,
    pub claimed_value: f64,
    pub description: String,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl DraftClaim {
    pub fn new(
        asset_id: ItemId,
        policy_id: PolicyId,
        coverage: CoverageEntry,
        claimant: impl Into<String>,
        claimed_value: f64,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ClaimId::new(),
            asset_id,
            policy_id,
            coverage,
            claimant: claimant.into(),
            claimed_value,
            description: description.into(),
            status: ClaimStatus::Draft,
            created_at,
            submitted_at: None,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.status == ClaimStatus::Submitted
    }

    /// Move `draft → submitted`. Returns `false` if already submitted.
    pub fn submit(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_submitted() {
            return false;
        }
        self.status = ClaimStatus::Submitted;
        self.submitted_at = Some(at);
        true
    }
}

impl Entity for DraftClaim {
    type Id = ClaimId;

    fn id(&self) -> ClaimId {
        self.id
    }
}

/// Adjuster-readable description: `"<brand> <model> <name> - <first sentence>"`.
pub fn claim_description(
    brand: Option<&str>,
    model: Option<&str>,
    name: &str,
    description: &str,
) -> String {
    let headline = [brand.unwrap_or(""), model.unwrap_or(""), name]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let brief = description.split('.').next().unwrap_or("").trim();
    if brief.is_empty() {
        headline
    } else {
        format!("{headline} - {brief}")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValuationMethod {
    Rcv,
    OriginalCost,
}

/// Value claimed for an item and how it relates to the selected coverage.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimValuation {
    pub amount: f64,
    pub method: ValuationMethod,
    /// The amount exceeds a sub-limit cap; reimbursement stops at the cap.
    pub exceeds_sub_limit: bool,
}

impl ClaimValuation {
    /// RCV when known and positive, otherwise the original cost.
    pub fn assess(rcv: Option<f64>, original_cost: f64, coverage: &CoverageEntry) -> Self {
        let (amount, method) = match rcv {
            Some(v) if v > 0.0 => (v, ValuationMethod::Rcv),
            _ => (original_cost.max(0.0), ValuationMethod::OriginalCost),
        };
        Self {
            amount,
            method,
            exceeds_sub_limit: coverage.kind == CoverageKind::SubLimit && amount > coverage.limit,
        }
    }

    /// The portion of `amount` the coverage line can reimburse.
    pub fn reimbursable(&self, coverage: &CoverageEntry) -> f64 {
        self.amount.min(coverage.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_claim() -> DraftClaim {
        DraftClaim::new(
            ItemId::new(),
            PolicyId::new(),
            CoverageEntry::main("Personal Property", 100_000.0),
            "Jane Doe",
            1_200.0,
            "Sony TV",
            Utc::now(),
        )
    }

    #[test]
    fn submit_is_one_way_and_idempotent() {
        let mut claim = test_claim();
        let first = Utc::now();
        assert!(claim.submit(first));
        assert!(claim.is_submitted());
        assert!(!claim.submit(Utc::now()));
        assert_eq!(claim.submitted_at, Some(first));
    }

    #[test]
    fn description_uses_first_sentence() {
        let d = claim_description(Some("Sony"), Some("X90J"), "Television", "65 inch LED. Wall mounted.");
        assert_eq!(d, "Sony X90J Television - 65 inch LED");
    }

    #[test]
    fn description_without_optional_parts() {
        assert_eq!(claim_description(None, None, "Lamp", ""), "Lamp");
        assert_eq!(claim_description(None, Some(" "), "Lamp", "Brass"), "Lamp - Brass");
    }

    #[test]
    fn valuation_prefers_rcv_and_flags_sub_limit_overrun() {
        let jewelry = CoverageEntry::sub_limit("Jewelry", 1_000.0);
        let v = ClaimValuation::assess(Some(2_500.0), 900.0, &jewelry);
        assert_eq!(v.method, ValuationMethod::Rcv);
        assert_eq!(v.amount, 2_500.0);
        assert!(v.exceeds_sub_limit);
        assert_eq!(v.reimbursable(&jewelry), 1_000.0);

        let v = ClaimValuation::assess(None, 900.0, &jewelry);
        assert_eq!(v.method, ValuationMethod::OriginalCost);
        assert!(!v.exceeds_sub_limit);
    }

    #[test]
    fn main_line_is_never_flagged() {
        let main = CoverageEntry::main("Personal Property", 500.0);
        assert!(!ClaimValuation::assess(Some(900.0), 0.0, &main).exceeds_sub_limit);
    }
}
