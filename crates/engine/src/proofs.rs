use std::collections::HashSet;

use tracing::instrument;

use veritas_ai::InputFile;
use veritas_core::{ItemId, ProofId};
use veritas_inventory::{CommandKind, Proof, ProofSuggestion};
use veritas_ledger::ActivityAction;

use crate::error::{EngineError, EngineResult};
use crate::vault::Vault;

fn file_names(proofs: &[Proof]) -> String {
    proofs.iter().map(|p| p.file_name.as_str()).collect::<Vec<_>>().join(", ")
}

impl Vault {
    /// Attach evidentiary files directly to an item.
    ///
    /// Every file is read before anything is stored; a read failure leaves
    /// the vault unchanged.
    #[instrument(skip(self, files), fields(item_id = %item_id, files = files.len()), err)]
    pub async fn link_proofs(&self, item_id: ItemId, files: Vec<InputFile>) -> EngineResult<usize> {
        let item = self.require_item(item_id)?;
        if files.is_empty() {
            return Ok(0);
        }

        let proofs = self.read_proofs(&files).await?;
        let count = proofs.len();
        let details = format!("Linked {count} proof(s) to '{}': {}", item.name, file_names(&proofs));
        self.commit_logged(
            CommandKind::LinkProofs { item_id, proofs },
            Some((ActivityAction::ProofLinked, details)),
        )
        .map_err(|err| err.for_item(item_id))?;
        Ok(count)
    }

    /// Add files to the unlinked proof pool.
    #[instrument(skip_all, fields(files = files.len()), err)]
    pub async fn upload_unlinked_proofs(&self, files: Vec<InputFile>) -> EngineResult<Vec<ProofId>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let proofs = self.read_proofs(&files).await?;
        let ids = proofs.iter().map(|p| p.id).collect();
        let details = format!("Uploaded {} unlinked proof(s): {}", proofs.len(), file_names(&proofs));
        self.commit(
            CommandKind::AddUnlinkedProofs { proofs },
            Some((ActivityAction::ProofUploaded, details)),
        )?;
        Ok(ids)
    }

    /// Ask the matcher which pooled proofs belong to the item.
    ///
    /// Proofs already pending for the item are not offered again, and
    /// suggestions outside the offered set are dropped. Returns the number of
    /// suggestions added. Once the matcher has run the request is logged, even
    /// when it found nothing.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn find_proof_matches(&self, item_id: ItemId) -> EngineResult<usize> {
        let item = self.require_item(item_id)?;
        let candidates: Vec<Proof> = self.read(|s| {
            s.unlinked_proofs()
                .iter()
                .filter(|p| !item.has_suggestion_for(p.id))
                .cloned()
                .collect()
        });
        if candidates.is_empty() {
            tracing::debug!("no candidate proofs");
            return Ok(0);
        }

        let offered: HashSet<ProofId> = candidates.iter().map(|p| p.id).collect();
        let returned = self.ai.proof_matcher.match_proofs(&item, &candidates).await?;

        let mut seen = HashSet::new();
        let mut suggestions: Vec<ProofSuggestion> = returned
            .into_iter()
            .filter(|s| offered.contains(&s.proof_id) && seen.insert(s.proof_id))
            .collect();

        // The pool may have changed while the matcher ran.
        let still_present = self.read(|s| match s.item(item_id) {
            Some(current) => {
                suggestions.retain(|x| s.unlinked_proof(x.proof_id).is_some() && !current.has_suggestion_for(x.proof_id));
                true
            }
            None => false,
        });
        if !still_present {
            tracing::warn!("item deleted while matching");
            return Err(EngineError::ItemNotFound(item_id));
        }
        if suggestions.is_empty() {
            tracing::info!("no matching proofs found");
            self.record_activity(
                ActivityAction::AiAnalysis,
                format!("AI found no matching proofs for '{}'", item.name),
            );
            return Ok(0);
        }

        let count = suggestions.len();
        let details = format!("AI suggested {count} proof(s) for '{}'", item.name);
        self.commit_logged(
            CommandKind::SuggestProofs { item_id, suggestions },
            Some((ActivityAction::AiAnalysis, details)),
        )
        .map_err(|err| err.for_item(item_id))?;
        Ok(count)
    }

    /// Move a pending suggested proof from the pool onto the item.
    #[instrument(skip(self), fields(item_id = %item_id, proof_id = %proof_id), err)]
    pub fn approve_suggestion(&self, item_id: ItemId, proof_id: ProofId) -> EngineResult<()> {
        let item = self.require_item(item_id)?;
        if !item.has_suggestion_for(proof_id) {
            tracing::warn!("no such suggestion");
            return Err(EngineError::ProofNotFound(proof_id));
        }
        let Some(proof) = self.read(|s| s.unlinked_proof(proof_id).cloned()) else {
            tracing::warn!("proof no longer in the pool");
            return Err(EngineError::ProofNotFound(proof_id));
        };

        let details = format!("Linked suggested proof '{}' to '{}'", proof.file_name, item.name);
        self.commit_logged(
            CommandKind::ApproveSuggestion { item_id, proof_id },
            Some((ActivityAction::SuggestionApproved, details)),
        )
        .map_err(|err| err.for_item(item_id))?;
        Ok(())
    }

    /// Dismiss a suggestion; the proof stays in the pool.
    #[instrument(skip(self), fields(item_id = %item_id, proof_id = %proof_id), err)]
    pub fn reject_suggestion(&self, item_id: ItemId, proof_id: ProofId) -> EngineResult<()> {
        let item = self.require_item(item_id)?;
        if !item.has_suggestion_for(proof_id) {
            tracing::warn!("no such suggestion");
            return Err(EngineError::ProofNotFound(proof_id));
        }

        let file_name = self
            .read(|s| s.unlinked_proof(proof_id).map(|p| p.file_name.clone()))
            .unwrap_or_else(|| proof_id.to_string());
        let details = format!("Rejected suggested proof '{file_name}' for '{}'", item.name);
        self.commit_logged(
            CommandKind::RejectSuggestion { item_id, proof_id },
            Some((ActivityAction::SuggestionRejected, details)),
        )
        .map_err(|err| err.for_item(item_id))?;
        Ok(())
    }
}
