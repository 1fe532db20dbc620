use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use veritas_claims::{AccountHolder, CoverageEntry, DraftClaim, ParsedPolicy};
use veritas_core::{
    Aggregate, AggregateRoot, ClaimId, DomainError, ItemId, PolicyId, ProofId, find_by_id,
    find_by_id_mut,
};

use crate::item::{DOCUMENTS_CATEGORY, Enrichment, Item, ItemAnalysis, ItemPatch, ItemStatus};
use crate::proof::{Proof, ProofSuggestion};

/// The most recent reversible action (single slot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UndoableAction {
    #[serde(rename_all = "camelCase")]
    DeleteItem {
        item: Item,
        claims: Vec<DraftClaim>,
        position: usize,
    },
    #[serde(rename_all = "camelCase")]
    RejectSuggestion {
        item_id: ItemId,
        suggestion: ProofSuggestion,
    },
}

impl UndoableAction {
    pub fn describe(&self) -> String {
        match self {
            UndoableAction::DeleteItem { item, .. } => {
                format!("Restored deleted item '{}' ({})", item.name, item.id)
            }
            UndoableAction::RejectSuggestion { item_id, suggestion } => format!(
                "Restored rejected suggestion of proof {} for item {}",
                suggestion.proof_id, item_id
            ),
        }
    }
}

/// Canonical vault state: items, the unlinked proof pool, claims and policy.
///
/// Invariants (checked by [`VaultState::check_invariants`]):
/// - a proof id appears at most once across the pool and all items
/// - every suggestion references a proof in the unlinked pool
/// - a claimed item has at least one draft claim
/// - an item's claims and the global claims agree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultState {
    items: Vec<Item>,
    unlinked_proofs: Vec<Proof>,
    claims: Vec<DraftClaim>,
    account_holder: Option<AccountHolder>,
    policy: Option<ParsedPolicy>,
    pending_undo: Option<UndoableAction>,
    version: u64,
}

impl VaultState {
    pub fn new(account_holder: Option<AccountHolder>) -> Self {
        Self {
            account_holder,
            ..Self::default()
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        find_by_id(&self.items, id)
    }

    pub fn unlinked_proofs(&self) -> &[Proof] {
        &self.unlinked_proofs
    }

    pub fn unlinked_proof(&self, id: ProofId) -> Option<&Proof> {
        find_by_id(&self.unlinked_proofs, id)
    }

    pub fn claims(&self) -> &[DraftClaim] {
        &self.claims
    }

    pub fn claim(&self, id: ClaimId) -> Option<&DraftClaim> {
        find_by_id(&self.claims, id)
    }

    pub fn account_holder(&self) -> Option<&AccountHolder> {
        self.account_holder.as_ref()
    }

    pub fn policy(&self) -> Option<&ParsedPolicy> {
        self.policy.as_ref()
    }

    pub fn pending_undo(&self) -> Option<&UndoableAction> {
        self.pending_undo.as_ref()
    }

    fn require_item(&self, id: ItemId) -> Result<&Item, DomainError> {
        self.item(id).ok_or_else(|| DomainError::not_found("item", id))
    }

    fn known_proof_ids(&self) -> HashSet<ProofId> {
        self.unlinked_proofs
            .iter()
            .chain(self.items.iter().flat_map(|i| i.linked_proofs.iter()))
            .map(|p| p.id)
            .collect()
    }

    fn ensure_new_proofs<'a>(&self, proofs: impl IntoIterator<Item = &'a Proof>) -> Result<(), DomainError> {
        let mut seen = self.known_proof_ids();
        for proof in proofs {
            if !seen.insert(proof.id) {
                return Err(DomainError::conflict(format!("proof {} already exists", proof.id)));
            }
        }
        Ok(())
    }

    /// Verify the structural invariants of the store.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        let mut item_ids = HashSet::new();
        for item in &self.items {
            if !item_ids.insert(item.id) {
                return Err(DomainError::invariant(format!("duplicate item {}", item.id)));
            }
        }

        let mut proof_ids = HashSet::new();
        let all_proofs = self
            .unlinked_proofs
            .iter()
            .chain(self.items.iter().flat_map(|i| i.linked_proofs.iter()));
        for proof in all_proofs {
            if !proof_ids.insert(proof.id) {
                return Err(DomainError::invariant(format!("proof {} is held twice", proof.id)));
            }
        }

        for item in &self.items {
            for s in &item.suggested_proofs {
                if self.unlinked_proof(s.proof_id).is_none() {
                    return Err(DomainError::invariant(format!(
                        "item {} suggests proof {} which is not in the unlinked pool",
                        item.id, s.proof_id
                    )));
                }
            }
            if item.status == ItemStatus::Claimed && !item.is_claimed {
                return Err(DomainError::invariant(format!("item {} is claimed but not flagged", item.id)));
            }
            if item.is_claimed && item.claims.is_empty() {
                return Err(DomainError::invariant(format!("item {} is claimed without a claim", item.id)));
            }
            for claim in &item.claims {
                match self.claim(claim.id) {
                    Some(global) if global == claim && claim.asset_id == item.id => {}
                    _ => {
                        return Err(DomainError::invariant(format!(
                            "claim {} on item {} disagrees with the global claims",
                            claim.id, item.id
                        )));
                    }
                }
            }
        }

        for claim in &self.claims {
            let owned = self
                .item(claim.asset_id)
                .is_some_and(|item| find_by_id(&item.claims, claim.id).is_some());
            if !owned {
                return Err(DomainError::invariant(format!(
                    "claim {} references missing item {}",
                    claim.id, claim.asset_id
                )));
            }
        }

        Ok(())
    }

    fn with_item(&mut self, id: ItemId, at: DateTime<Utc>, f: impl FnOnce(&mut Item)) {
        if let Some(item) = find_by_id_mut(&mut self.items, id) {
            f(item);
            item.last_modified_at = at;
        }
    }
}

impl AggregateRoot for VaultState {
    fn version(&self) -> u64 {
        self.version
    }
}

/// A request to change the vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultCommand {
    pub occurred_at: DateTime<Utc>,
    pub kind: CommandKind,
}

impl VaultCommand {
    pub fn new(kind: CommandKind, occurred_at: DateTime<Utc>) -> Self {
        Self { occurred_at, kind }
    }

    pub fn now(kind: CommandKind) -> Self {
        Self::new(kind, Utc::now())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CommandKind {
    AddItems { items: Vec<Item> },
    LinkProofs { item_id: ItemId, proofs: Vec<Proof> },
    ApplyAnalysis { item_id: ItemId, analysis: ItemAnalysis },
    CatalogDocument { item_id: ItemId, note: String },
    MarkFailed { item_id: ItemId, message: String },
    UpdateItem { item_id: ItemId, patch: ItemPatch },
    ChangeStatus { item_id: ItemId, to: ItemStatus },
    DeleteItem { item_id: ItemId },
    AddUnlinkedProofs { proofs: Vec<Proof> },
    SuggestProofs { item_id: ItemId, suggestions: Vec<ProofSuggestion> },
    ApproveSuggestion { item_id: ItemId, proof_id: ProofId },
    RejectSuggestion { item_id: ItemId, proof_id: ProofId },
    RecommendCoverage { item_id: ItemId, coverage: Option<CoverageEntry> },
    AttachClaim { claim: DraftClaim },
    SubmitClaim { claim_id: ClaimId },
    StorePolicy { policy: ParsedPolicy },
    VerifyPolicy { policy_id: PolicyId },
    Enrich { item_id: ItemId, enrichment: Enrichment },
    Undo,
    Reset,
}

/// A fact that happened to the vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultEvent {
    pub occurred_at: DateTime<Utc>,
    pub change: VaultChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VaultChange {
    ItemsAdded { items: Vec<Item> },
    ProofsLinked { item_id: ItemId, proofs: Vec<Proof> },
    AnalysisApplied { item_id: ItemId, analysis: ItemAnalysis },
    DocumentCataloged { item_id: ItemId, note: String },
    AnalysisFailed { item_id: ItemId, message: String },
    ItemUpdated { item_id: ItemId, patch: ItemPatch },
    StatusChanged { item_id: ItemId, from: ItemStatus, to: ItemStatus },
    ItemDeleted { item: Item, claims: Vec<DraftClaim>, position: usize },
    UnlinkedProofsAdded { proofs: Vec<Proof> },
    ProofsSuggested { item_id: ItemId, suggestions: Vec<ProofSuggestion> },
    SuggestionApproved { item_id: ItemId, proof_id: ProofId },
    SuggestionRejected { item_id: ItemId, suggestion: ProofSuggestion },
    CoverageRecommended { item_id: ItemId, coverage: Option<CoverageEntry> },
    ClaimAttached { claim: DraftClaim },
    ClaimSubmitted { claim_id: ClaimId },
    PolicyStored { policy: ParsedPolicy },
    PolicyVerified { policy_id: PolicyId },
    ItemEnriched { item_id: ItemId, enrichment: Enrichment },
    UndoApplied { action: UndoableAction },
    StateReset,
}

impl VaultEvent {
    pub fn event_type(&self) -> &'static str {
        match &self.change {
            VaultChange::ItemsAdded { .. } => "vault.items.added",
            VaultChange::ProofsLinked { .. } => "vault.item.proofs_linked",
            VaultChange::AnalysisApplied { .. } => "vault.item.analysis_applied",
            VaultChange::DocumentCataloged { .. } => "vault.item.document_cataloged",
            VaultChange::AnalysisFailed { .. } => "vault.item.analysis_failed",
            VaultChange::ItemUpdated { .. } => "vault.item.updated",
            VaultChange::StatusChanged { .. } => "vault.item.status_changed",
            VaultChange::ItemDeleted { .. } => "vault.item.deleted",
            VaultChange::UnlinkedProofsAdded { .. } => "vault.proofs.uploaded",
            VaultChange::ProofsSuggested { .. } => "vault.item.proofs_suggested",
            VaultChange::SuggestionApproved { .. } => "vault.item.suggestion_approved",
            VaultChange::SuggestionRejected { .. } => "vault.item.suggestion_rejected",
            VaultChange::CoverageRecommended { .. } => "vault.item.coverage_recommended",
            VaultChange::ClaimAttached { .. } => "vault.claim.drafted",
            VaultChange::ClaimSubmitted { .. } => "vault.claim.submitted",
            VaultChange::PolicyStored { .. } => "vault.policy.stored",
            VaultChange::PolicyVerified { .. } => "vault.policy.verified",
            VaultChange::ItemEnriched { .. } => "vault.item.enriched",
            VaultChange::UndoApplied { .. } => "vault.undo.applied",
            VaultChange::StateReset => "vault.reset",
        }
    }
}

impl Aggregate for VaultState {
    type Command = VaultCommand;
    type Event = VaultEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        let at = event.occurred_at;
        match &event.change {
            VaultChange::ItemsAdded { items } => {
                self.items.extend(items.iter().cloned());
            }
            VaultChange::ProofsLinked { item_id, proofs } => {
                self.with_item(*item_id, at, |item| item.linked_proofs.extend(proofs.iter().cloned()));
            }
            VaultChange::AnalysisApplied { item_id, analysis } => {
                self.with_item(*item_id, at, |item| {
                    item.status = ItemStatus::NeedsReview;
                    item.name = analysis.name.clone();
                    item.description = analysis.description.clone();
                    item.category = analysis.category.clone();
                    item.original_cost = analysis.estimated_value;
                    item.brand = analysis.brand.clone();
                    item.model = analysis.model.clone();
                    item.error_message = None;
                    item.notes.push(analysis.note());
                });
            }
            VaultChange::DocumentCataloged { item_id, note } => {
                self.with_item(*item_id, at, |item| {
                    item.status = ItemStatus::NeedsReview;
                    item.category = DOCUMENTS_CATEGORY.to_string();
                    item.description = note.clone();
                    item.error_message = None;
                    item.notes.push(note.clone());
                });
            }
            VaultChange::AnalysisFailed { item_id, message } => {
                self.with_item(*item_id, at, |item| {
                    item.status = ItemStatus::Error;
                    item.error_message = Some(message.clone());
                });
            }
            VaultChange::ItemUpdated { item_id, patch } => {
                self.with_item(*item_id, at, |item| patch.apply_to(item));
            }
            VaultChange::StatusChanged { item_id, to, .. } => {
                self.with_item(*item_id, at, |item| {
                    item.status = *to;
                    if *to != ItemStatus::Error {
                        item.error_message = None;
                    }
                });
            }
            VaultChange::ItemDeleted { item, claims, position } => {
                self.items.retain(|i| i.id != item.id);
                self.claims.retain(|c| c.asset_id != item.id);
                self.pending_undo = Some(UndoableAction::DeleteItem {
                    item: item.clone(),
                    claims: claims.clone(),
                    position: *position,
                });
            }
            VaultChange::UnlinkedProofsAdded { proofs } => {
                self.unlinked_proofs.extend(proofs.iter().cloned());
            }
            VaultChange::ProofsSuggested { item_id, suggestions } => {
                self.with_item(*item_id, at, |item| item.suggested_proofs.extend(suggestions.iter().cloned()));
            }
            VaultChange::SuggestionApproved { item_id, proof_id } => {
                let Some(pos) = self.unlinked_proofs.iter().position(|p| p.id == *proof_id) else {
                    return;
                };
                let proof = self.unlinked_proofs.remove(pos);
                // The proof left the pool, so no item may keep suggesting it.
                for item in &mut self.items {
                    item.suggested_proofs.retain(|s| s.proof_id != *proof_id);
                }
                self.with_item(*item_id, at, |item| item.linked_proofs.push(proof));
            }
            VaultChange::SuggestionRejected { item_id, suggestion } => {
                self.with_item(*item_id, at, |item| {
                    item.suggested_proofs.retain(|s| s.proof_id != suggestion.proof_id)
                });
                self.pending_undo = Some(UndoableAction::RejectSuggestion {
                    item_id: *item_id,
                    suggestion: suggestion.clone(),
                });
            }
            VaultChange::CoverageRecommended { item_id, coverage } => {
                self.with_item(*item_id, at, |item| item.recommended_coverage = coverage.clone());
            }
            VaultChange::ClaimAttached { claim } => {
                self.claims.push(claim.clone());
                self.with_item(claim.asset_id, at, |item| {
                    item.claims.push(claim.clone());
                    item.is_claimed = true;
                    item.status = ItemStatus::Claimed;
                });
            }
            VaultChange::ClaimSubmitted { claim_id } => {
                let mut owner = None;
                if let Some(claim) = find_by_id_mut(&mut self.claims, *claim_id) {
                    claim.submit(at);
                    owner = Some(claim.asset_id);
                }
                if let Some(asset_id) = owner {
                    self.with_item(asset_id, at, |item| {
                        if let Some(copy) = find_by_id_mut(&mut item.claims, *claim_id) {
                            copy.submit(at);
                        }
                    });
                }
            }
            VaultChange::PolicyStored { policy } => {
                self.policy = Some(policy.clone());
            }
            VaultChange::PolicyVerified { policy_id } => {
                if let Some(policy) = self.policy.as_mut().filter(|p| p.id == *policy_id) {
                    policy.verify();
                }
            }
            VaultChange::ItemEnriched { item_id, enrichment } => {
                self.with_item(*item_id, at, |item| enrichment.apply_to(item));
            }
            VaultChange::UndoApplied { action } => {
                match action {
                    UndoableAction::DeleteItem { item, claims, position } => {
                        let at_pos = (*position).min(self.items.len());
                        self.items.insert(at_pos, item.clone());
                        self.claims.extend(claims.iter().cloned());
                    }
                    UndoableAction::RejectSuggestion { item_id, suggestion } => {
                        self.with_item(*item_id, at, |item| item.suggested_proofs.push(suggestion.clone()));
                    }
                }
                self.pending_undo = None;
            }
            VaultChange::StateReset => {
                self.items.clear();
                self.unlinked_proofs.clear();
                self.claims.clear();
                self.policy = None;
                self.pending_undo = None;
            }
        }

        // +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let changes = match &command.kind {
            CommandKind::AddItems { items } => self.handle_add_items(items)?,
            CommandKind::LinkProofs { item_id, proofs } => self.handle_link_proofs(*item_id, proofs)?,
            CommandKind::ApplyAnalysis { item_id, analysis } => {
                self.handle_apply_analysis(*item_id, analysis)?
            }
            CommandKind::CatalogDocument { item_id, note } => {
                let item = self.require_item(*item_id)?;
                item.status.ensure_transition(ItemStatus::NeedsReview)?;
                vec![VaultChange::DocumentCataloged {
                    item_id: *item_id,
                    note: note.clone(),
                }]
            }
            CommandKind::MarkFailed { item_id, message } => {
                let item = self.require_item(*item_id)?;
                item.status.ensure_transition(ItemStatus::Error)?;
                vec![VaultChange::AnalysisFailed {
                    item_id: *item_id,
                    message: message.clone(),
                }]
            }
            CommandKind::UpdateItem { item_id, patch } => {
                self.require_item(*item_id)?;
                patch.validate()?;
                vec![VaultChange::ItemUpdated {
                    item_id: *item_id,
                    patch: patch.clone(),
                }]
            }
            CommandKind::ChangeStatus { item_id, to } => self.handle_change_status(*item_id, *to)?,
            CommandKind::DeleteItem { item_id } => self.handle_delete(*item_id)?,
            CommandKind::AddUnlinkedProofs { proofs } => {
                if proofs.is_empty() {
                    return Ok(Vec::new());
                }
                self.ensure_new_proofs(proofs)?;
                vec![VaultChange::UnlinkedProofsAdded { proofs: proofs.clone() }]
            }
            CommandKind::SuggestProofs { item_id, suggestions } => {
                self.handle_suggest(*item_id, suggestions)?
            }
            CommandKind::ApproveSuggestion { item_id, proof_id } => {
                let item = self.require_item(*item_id)?;
                if !item.has_suggestion_for(*proof_id) {
                    return Err(DomainError::not_found("suggestion", proof_id));
                }
                if self.unlinked_proof(*proof_id).is_none() {
                    return Err(DomainError::not_found("proof", proof_id));
                }
                vec![VaultChange::SuggestionApproved {
                    item_id: *item_id,
                    proof_id: *proof_id,
                }]
            }
            CommandKind::RejectSuggestion { item_id, proof_id } => {
                let item = self.require_item(*item_id)?;
                let suggestion = item
                    .suggested_proofs
                    .iter()
                    .find(|s| s.proof_id == *proof_id)
                    .ok_or_else(|| DomainError::not_found("suggestion", proof_id))?;
                vec![VaultChange::SuggestionRejected {
                    item_id: *item_id,
                    suggestion: suggestion.clone(),
                }]
            }
            CommandKind::RecommendCoverage { item_id, coverage } => {
                self.require_item(*item_id)?;
                vec![VaultChange::CoverageRecommended {
                    item_id: *item_id,
                    coverage: coverage.clone(),
                }]
            }
            CommandKind::AttachClaim { claim } => self.handle_attach_claim(claim)?,
            CommandKind::SubmitClaim { claim_id } => {
                let claim = self
                    .claim(*claim_id)
                    .ok_or_else(|| DomainError::not_found("claim", claim_id))?;
                if claim.is_submitted() {
                    return Ok(Vec::new());
                }
                vec![VaultChange::ClaimSubmitted { claim_id: *claim_id }]
            }
            CommandKind::StorePolicy { policy } => vec![VaultChange::PolicyStored { policy: policy.clone() }],
            CommandKind::VerifyPolicy { policy_id } => {
                let policy = self
                    .policy
                    .as_ref()
                    .filter(|p| p.id == *policy_id)
                    .ok_or_else(|| DomainError::not_found("policy", policy_id))?;
                if policy.is_verified {
                    return Ok(Vec::new());
                }
                vec![VaultChange::PolicyVerified { policy_id: *policy_id }]
            }
            CommandKind::Enrich { item_id, enrichment } => {
                self.require_item(*item_id)?;
                enrichment.validate()?;
                vec![VaultChange::ItemEnriched {
                    item_id: *item_id,
                    enrichment: enrichment.clone(),
                }]
            }
            CommandKind::Undo => self.handle_undo()?,
            CommandKind::Reset => vec![VaultChange::StateReset],
        };

        Ok(changes
            .into_iter()
            .map(|change| VaultEvent {
                occurred_at: command.occurred_at,
                change,
            })
            .collect())
    }
}

impl VaultState {
    fn handle_add_items(&self, items: &[Item]) -> Result<Vec<VaultChange>, DomainError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let mut ids: HashSet<ItemId> = self.items.iter().map(|i| i.id).collect();
        for item in items {
            if !ids.insert(item.id) {
                return Err(DomainError::conflict(format!("item {} already exists", item.id)));
            }
            if !item.suggested_proofs.is_empty() || !item.claims.is_empty() || item.is_claimed {
                return Err(DomainError::validation("new items start without suggestions or claims"));
            }
        }
        self.ensure_new_proofs(items.iter().flat_map(|i| i.linked_proofs.iter()))?;
        Ok(vec![VaultChange::ItemsAdded { items: items.to_vec() }])
    }

    fn handle_link_proofs(&self, item_id: ItemId, proofs: &[Proof]) -> Result<Vec<VaultChange>, DomainError> {
        self.require_item(item_id)?;
        if proofs.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_new_proofs(proofs)?;
        Ok(vec![VaultChange::ProofsLinked {
            item_id,
            proofs: proofs.to_vec(),
        }])
    }

    fn handle_apply_analysis(
        &self,
        item_id: ItemId,
        analysis: &ItemAnalysis,
    ) -> Result<Vec<VaultChange>, DomainError> {
        let item = self.require_item(item_id)?;
        // Results arriving for an item that is no longer processing are stale.
        item.status.ensure_transition(ItemStatus::NeedsReview)?;
        if !(analysis.estimated_value.is_finite() && analysis.estimated_value >= 0.0) {
            return Err(DomainError::validation("estimated value must be a non-negative amount"));
        }
        Ok(vec![VaultChange::AnalysisApplied {
            item_id,
            analysis: analysis.clone(),
        }])
    }

    fn handle_change_status(&self, item_id: ItemId, to: ItemStatus) -> Result<Vec<VaultChange>, DomainError> {
        let item = self.require_item(item_id)?;
        if to == ItemStatus::Claimed {
            return Err(DomainError::invariant("an item becomes claimed only by attaching a draft claim"));
        }
        item.status.ensure_transition(to)?;
        Ok(vec![VaultChange::StatusChanged {
            item_id,
            from: item.status,
            to,
        }])
    }

    fn handle_delete(&self, item_id: ItemId) -> Result<Vec<VaultChange>, DomainError> {
        let position = self
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| DomainError::not_found("item", item_id))?;
        let claims = self
            .claims
            .iter()
            .filter(|c| c.asset_id == item_id)
            .cloned()
            .collect();
        Ok(vec![VaultChange::ItemDeleted {
            item: self.items[position].clone(),
            claims,
            position,
        }])
    }

    fn handle_suggest(
        &self,
        item_id: ItemId,
        suggestions: &[ProofSuggestion],
    ) -> Result<Vec<VaultChange>, DomainError> {
        let item = self.require_item(item_id)?;
        let mut seen: HashSet<ProofId> = item.suggested_proofs.iter().map(|s| s.proof_id).collect();
        let fresh: Vec<ProofSuggestion> = suggestions
            .iter()
            .filter(|s| self.unlinked_proof(s.proof_id).is_some())
            .filter(|s| seen.insert(s.proof_id))
            .cloned()
            .collect();
        if fresh.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![VaultChange::ProofsSuggested {
            item_id,
            suggestions: fresh,
        }])
    }

    fn handle_attach_claim(&self, claim: &DraftClaim) -> Result<Vec<VaultChange>, DomainError> {
        let item = self.require_item(claim.asset_id)?;
        if self.claim(claim.id).is_some() {
            return Err(DomainError::conflict(format!("claim {} already exists", claim.id)));
        }
        if item.status != ItemStatus::Claimed {
            item.status.ensure_transition(ItemStatus::Claimed)?;
        }
        Ok(vec![VaultChange::ClaimAttached { claim: claim.clone() }])
    }

    fn handle_undo(&self) -> Result<Vec<VaultChange>, DomainError> {
        let action = self
            .pending_undo
            .as_ref()
            .ok_or_else(|| DomainError::conflict("nothing to undo"))?;

        match action {
            UndoableAction::DeleteItem { item, claims, position } => {
                if self.item(item.id).is_some() {
                    return Err(DomainError::conflict(format!("item {} already exists", item.id)));
                }
                if claims.iter().any(|c| self.claim(c.id).is_some()) {
                    return Err(DomainError::conflict("a deleted claim was recreated"));
                }
                self.ensure_new_proofs(&item.linked_proofs)?;
                // Suggestions of proofs that have left the pool are not restored.
                let mut restored = item.clone();
                restored
                    .suggested_proofs
                    .retain(|s| self.unlinked_proof(s.proof_id).is_some());
                Ok(vec![VaultChange::UndoApplied {
                    action: UndoableAction::DeleteItem {
                        item: restored,
                        claims: claims.clone(),
                        position: *position,
                    },
                }])
            }
            UndoableAction::RejectSuggestion { item_id, suggestion } => {
                let item = self
                    .item(*item_id)
                    .ok_or_else(|| DomainError::conflict("the item of the rejected suggestion is gone"))?;
                if self.unlinked_proof(suggestion.proof_id).is_none() {
                    return Err(DomainError::conflict("the suggested proof is no longer unlinked"));
                }
                if item.has_suggestion_for(suggestion.proof_id) {
                    return Err(DomainError::conflict("the suggestion is already pending"));
                }
                Ok(vec![VaultChange::UndoApplied { action: action.clone() }])
            }
        }
    }
}
