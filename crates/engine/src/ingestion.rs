//! File and room-scan ingestion.
//!
//! Placeholders are stored before the first `.await`, so callers see every
//! new item in `processing` while analysis runs. Per-item enrichment futures
//! are joined on the calling task and each writes back only to its own item.

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use veritas_ai::InputFile;
use veritas_core::ItemId;
use veritas_inventory::{CommandKind, Item, ItemOrigin, ItemStatus, Proof};
use veritas_ledger::ActivityAction;

use crate::error::{EngineError, EngineResult};
use crate::vault::Vault;

/// Error message left on items whose analysis was cancelled.
pub const ANALYSIS_CANCELLED: &str = "Analysis cancelled";

const DOCUMENT_NOTE: &str = "Document stored without AI analysis; please complete the details manually.";

/// Where each item of a batch ended up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Every placeholder created, in file order.
    pub items: Vec<ItemId>,
    /// Analysed or catalogued; ready for review.
    pub completed: Vec<ItemId>,
    pub failed: Vec<ItemId>,
    pub cancelled: Vec<ItemId>,
}

impl IngestReport {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Vault {
    /// Add one item per file and analyse them concurrently.
    ///
    /// Returns once every item has settled. Items deleted while their analysis
    /// is in flight are left out of the report.
    #[instrument(skip_all, fields(files = files.len(), origin = ?origin), err)]
    pub async fn ingest_files(
        &self,
        files: Vec<InputFile>,
        origin: ItemOrigin,
        cancel: Option<&CancellationToken>,
    ) -> EngineResult<IngestReport> {
        if files.is_empty() {
            return Ok(IngestReport::default());
        }

        let now = Utc::now();
        let placeholders: Vec<Item> = files
            .iter()
            .map(|f| Item::placeholder(f.file_name.clone(), origin, now))
            .collect();
        let ids: Vec<ItemId> = placeholders.iter().map(|i| i.id).collect();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        let details = format!("Added {} item(s) for analysis: {}", files.len(), names.join(", "));

        self.commit(
            CommandKind::AddItems { items: placeholders },
            Some((ActivityAction::ItemAdded, details)),
        )?;
        tracing::info!(items = ids.len(), "placeholders created");

        let work = join_all(ids.iter().zip(&files).map(|(id, file)| self.enrich_new_item(*id, file)));

        let mut cancelled = Vec::new();
        match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        cancelled = self.cancel_unfinished(&ids);
                    }
                    _ = work => {}
                }
            }
            None => {
                work.await;
            }
        }

        Ok(self.report(ids, cancelled))
    }

    /// Extract frames from a room-scan video and ingest them as photos.
    #[instrument(skip_all, fields(video = %video.file_name), err)]
    pub async fn ingest_video(
        &self,
        video: InputFile,
        cancel: Option<&CancellationToken>,
    ) -> EngineResult<IngestReport> {
        if !video.is_video() {
            return Err(EngineError::precondition(format!(
                "'{}' is not a video file.",
                video.file_name
            )));
        }

        let frames = self
            .ai
            .frame_extractor
            .extract_frames(&video, self.config.frame_sampling_rate)
            .await?;
        if frames.is_empty() {
            tracing::info!("no frames extracted");
            return Ok(IngestReport::default());
        }

        self.ingest_files(frames, ItemOrigin::RoomScan, cancel).await
    }

    async fn enrich_new_item(&self, item_id: ItemId, file: &InputFile) {
        let content = match self.ai.file_reader.read_content(file).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(%item_id, file = %file.file_name, error = %err, "could not read file");
                self.fail_item(item_id, format!("Could not read '{}': {err}", file.file_name));
                return;
            }
        };

        let proof = Proof::new(file.file_name.clone(), file.mime_type.clone(), content);
        let linked = self.commit(
            CommandKind::LinkProofs {
                item_id,
                proofs: vec![proof.clone()],
            },
            None,
        );
        if let Err(err) = linked {
            tracing::warn!(%item_id, error = %err, "proof not linked");
            return;
        }

        if proof.is_image() {
            self.analyze_linked_proof(item_id, &proof).await;
        } else if let Err(err) = self.commit(
            CommandKind::CatalogDocument {
                item_id,
                note: DOCUMENT_NOTE.to_string(),
            },
            None,
        ) {
            tracing::warn!(%item_id, error = %err, "document not catalogued");
        }
    }

    /// Run image analysis for `proof` and settle the item.
    pub(crate) async fn analyze_linked_proof(&self, item_id: ItemId, proof: &Proof) {
        match self.ai.image_analyzer.analyze_image(proof).await {
            Ok(analysis) => {
                let applied = self.commit_logged(
                    CommandKind::ApplyAnalysis {
                        item_id,
                        analysis: analysis.into_item_analysis(),
                    },
                    None,
                );
                match applied {
                    Ok(_) => tracing::debug!(%item_id, "analysis applied"),
                    Err(err) if err.is_not_found() => {}
                    Err(err) => {
                        tracing::warn!(%item_id, error = %err, "analysis result rejected");
                        self.fail_item(item_id, format!("AI analysis could not be applied: {err}"));
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%item_id, error = %err, "image analysis failed");
                self.fail_item(item_id, format!("AI analysis failed: {err}"));
            }
        }
    }

    fn fail_item(&self, item_id: ItemId, message: String) {
        if let Err(err) = self.commit(CommandKind::MarkFailed { item_id, message }, None) {
            // Deleted, or already settled by a cancellation.
            tracing::debug!(%item_id, error = %err, "failure not recorded");
        }
    }

    pub(crate) fn cancel_unfinished(&self, ids: &[ItemId]) -> Vec<ItemId> {
        let unfinished: Vec<ItemId> = self.read(|s| {
            ids.iter()
                .copied()
                .filter(|id| s.item(*id).is_some_and(|i| i.status == ItemStatus::Processing))
                .collect()
        });

        unfinished
            .into_iter()
            .filter(|id| {
                self.commit(
                    CommandKind::MarkFailed {
                        item_id: *id,
                        message: ANALYSIS_CANCELLED.to_string(),
                    },
                    None,
                )
                .is_ok()
            })
            .collect()
    }

    fn report(&self, items: Vec<ItemId>, cancelled: Vec<ItemId>) -> IngestReport {
        let (completed, failed) = self.read(|s| {
            let mut completed = Vec::new();
            let mut failed = Vec::new();
            for id in items.iter().filter(|id| !cancelled.contains(id)) {
                match s.item(*id).map(|i| i.status) {
                    None => {}
                    Some(ItemStatus::Error) => failed.push(*id),
                    Some(ItemStatus::Processing) => {
                        tracing::warn!(item_id = %id, "item still processing after ingestion");
                    }
                    Some(_) => completed.push(*id),
                }
            }
            (completed, failed)
        });

        tracing::info!(
            completed = completed.len(),
            failed = failed.len(),
            cancelled = cancelled.len(),
            "ingestion finished"
        );
        IngestReport {
            items,
            completed,
            failed,
            cancelled,
        }
    }
}
