use tracing::instrument;

use veritas_ai::InputFile;
use veritas_claims::{ClaimStatus, CoverageSelection, DraftClaim, ParsedPolicy, select_coverage};
use veritas_core::{ClaimId, ItemId, PolicyId};
use veritas_inventory::{CommandKind, ItemStatus};
use veritas_ledger::ActivityAction;

use crate::error::{EngineError, EngineResult};
use crate::vault::Vault;

impl Vault {
    /// Pick the coverage line for the item's category and store it on the
    /// item. Informational, so no activity entry is recorded.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub fn recommend_coverage(&self, item_id: ItemId) -> EngineResult<CoverageSelection> {
        let item = self.require_item(item_id)?;
        let policy = self
            .policy()
            .ok_or_else(|| EngineError::precondition("Upload an insurance policy to get a coverage recommendation."))?;

        let selection = select_coverage(&item.category, &policy);
        if selection.entry().is_none() {
            tracing::info!(category = %item.category, "no coverage available");
        }

        self.commit_logged(
            CommandKind::RecommendCoverage {
                item_id,
                coverage: selection.entry().cloned(),
            },
            None,
        )
        .map_err(|err| err.for_item(item_id))?;
        Ok(selection)
    }

    /// Assemble a draft claim for an approved item.
    ///
    /// Requires a verified policy, a recommended coverage line and an account
    /// holder; all are checked before the assembler is called.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn draft_claim(&self, item_id: ItemId) -> EngineResult<DraftClaim> {
        let item = self.require_item(item_id)?;
        if !matches!(item.status, ItemStatus::Active | ItemStatus::Claimed) {
            return Err(EngineError::precondition(format!(
                "'{}' must be approved before a claim can be drafted.",
                item.name
            )));
        }
        let policy = self
            .policy()
            .ok_or_else(|| EngineError::precondition("Upload an insurance policy before drafting a claim."))?;
        if !policy.is_verified {
            return Err(EngineError::precondition(
                "Verify the insurance policy before drafting a claim.",
            ));
        }
        let Some(coverage) = item.recommended_coverage.clone() else {
            return Err(EngineError::precondition(format!(
                "Get a coverage recommendation for '{}' before drafting a claim.",
                item.name
            )));
        };
        let claimant = self
            .account_holder()
            .ok_or_else(|| EngineError::precondition("An account holder is required to draft a claim."))?;

        let mut claim = self
            .ai
            .claim_assembler
            .assemble_claim(&item, &policy, &claimant)
            .await?;

        claim.asset_id = item_id;
        claim.policy_id = policy.id;
        claim.status = ClaimStatus::Draft;
        claim.submitted_at = None;
        if self.read(|s| s.claim(claim.id).is_some()) {
            claim.id = ClaimId::new();
        }

        let details = format!(
            "Drafted claim {} for '{}' under {} (${:.2})",
            claim.id, item.name, coverage.category, claim.claimed_value
        );
        self.commit_logged(
            CommandKind::AttachClaim { claim: claim.clone() },
            Some((ActivityAction::ClaimDrafted, details)),
        )
        .map_err(|err| err.for_item(item_id))?;
        Ok(claim)
    }

    /// Submit a draft claim. Filing an already submitted claim is a no-op.
    #[instrument(skip(self), fields(claim_id = %claim_id), err)]
    pub fn file_claim(&self, claim_id: ClaimId) -> EngineResult<DraftClaim> {
        if self.read(|s| s.claim(claim_id).is_none()) {
            tracing::warn!("claim not found");
            return Err(EngineError::ClaimNotFound(claim_id));
        }

        self.commit(
            CommandKind::SubmitClaim { claim_id },
            Some((ActivityAction::ClaimSubmitted, format!("Submitted claim {claim_id}"))),
        )?;
        self.read(|s| s.claim(claim_id).cloned())
            .ok_or(EngineError::ClaimNotFound(claim_id))
    }

    /// Parse a policy document and make it the active policy.
    ///
    /// Policies parsed with enough confidence are verified straight away.
    #[instrument(skip_all, fields(file = %file.file_name), err)]
    pub async fn upload_policy(&self, file: InputFile) -> EngineResult<ParsedPolicy> {
        let extraction = self.ai.policy_parser.parse_policy(&file).await?;
        let policy = extraction.into_policy(self.config.auto_verify_threshold);

        let verification = if policy.is_verified {
            "auto-verified"
        } else {
            "needs verification"
        };
        let details = format!(
            "Parsed policy {} from {} ({:.0}% confidence, {verification})",
            policy.policy_number, policy.provider, policy.confidence_score
        );
        self.commit(
            CommandKind::StorePolicy { policy: policy.clone() },
            Some((ActivityAction::PolicyParsed, details)),
        )?;
        Ok(policy)
    }

    /// Install an already parsed policy as the active policy.
    #[instrument(skip_all, fields(policy = %policy.policy_number), err)]
    pub fn install_policy(&self, policy: ParsedPolicy) -> EngineResult<()> {
        let details = format!("Uploaded policy {} from {}", policy.policy_number, policy.provider);
        self.commit(
            CommandKind::StorePolicy { policy },
            Some((ActivityAction::PolicyUploaded, details)),
        )?;
        Ok(())
    }

    /// Mark the active policy as checked by the user.
    #[instrument(skip(self), fields(policy_id = %policy_id), err)]
    pub fn verify_policy(&self, policy_id: PolicyId) -> EngineResult<ParsedPolicy> {
        let Some(policy) = self.policy().filter(|p| p.id == policy_id) else {
            tracing::warn!("not the active policy");
            return Err(EngineError::PolicyNotFound(policy_id));
        };

        self.commit(
            CommandKind::VerifyPolicy { policy_id },
            Some((
                ActivityAction::PolicyVerified,
                format!("Verified policy {}", policy.policy_number),
            )),
        )?;
        self.policy().ok_or(EngineError::PolicyNotFound(policy_id))
    }
}
