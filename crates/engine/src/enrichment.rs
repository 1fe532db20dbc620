//! On-demand AI enrichment of a single item.
//!
//! Each action reads the item, awaits one collaborator, then applies the
//! result as an [`Enrichment`]. A collaborator failure leaves the item as it
//! was.

use tokio_util::sync::CancellationToken;
use tracing::instrument;

use veritas_core::ItemId;
use veritas_inventory::{CommandKind, Enrichment, Item, ItemStatus, Proof};
use veritas_ledger::ActivityAction;

use crate::error::{EngineError, EngineResult};
use crate::vault::Vault;

impl Vault {
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn lookup_market_price(&self, item_id: ItemId) -> EngineResult<Item> {
        let item = self.require_item(item_id)?;
        let price = self.ai.market_pricer.market_price(&item).await?;
        self.apply_enrichment(&item, price.into_enrichment())
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn lookup_highest_rcv(&self, item_id: ItemId) -> EngineResult<Item> {
        let item = self.require_item(item_id)?;
        let highest = self.ai.market_pricer.highest_rcv(&item).await?;
        self.apply_enrichment(
            &item,
            Enrichment::HighestRcv {
                rcv: highest.price,
                source: highest.source,
            },
        )
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn enrich_from_web(&self, item_id: ItemId) -> EngineResult<Item> {
        let item = self.require_item(item_id)?;
        let intel = self.ai.web_enricher.enrich(&item).await?;
        self.apply_enrichment(&item, Enrichment::WebFacts { facts: intel.facts })
    }

    /// Brand, model and MSRP from the item's first photo.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn identify_apparel(&self, item_id: ItemId) -> EngineResult<Item> {
        let item = self.require_item(item_id)?;
        let photo = first_photo(&item)?;
        let found = self.ai.apparel_identifier.identify_apparel(&photo).await?;
        self.apply_enrichment(
            &item,
            Enrichment::Apparel {
                brand: found.brand,
                model: found.model,
                msrp: found.msrp,
            },
        )
    }

    /// Read a serial number off the item's first photo.
    ///
    /// `Ok(None)` when nothing legible was found; the item is left as is.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn extract_serial_number(&self, item_id: ItemId) -> EngineResult<Option<String>> {
        let item = self.require_item(item_id)?;
        let photo = first_photo(&item)?;
        let reading = self.ai.serial_extractor.extract_serial(&photo).await?;

        let Some(serial_number) = reading.into_serial() else {
            tracing::info!("no serial number found");
            return Ok(None);
        };
        self.apply_enrichment(
            &item,
            Enrichment::SerialNumber {
                serial_number: serial_number.clone(),
            },
        )?;
        Ok(Some(serial_number))
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn score_proof_strength(&self, item_id: ItemId) -> EngineResult<Item> {
        let item = self.require_item(item_id)?;
        let strength = self.ai.proof_strength.score_proofs(&item).await?;
        self.apply_enrichment(
            &item,
            Enrichment::ProofStrength {
                score: strength.score.clamp(0.0, 100.0),
                feedback: strength.feedback,
            },
        )
    }

    /// Actual cash value after depreciation.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn calculate_acv(&self, item_id: ItemId) -> EngineResult<Item> {
        let item = self.require_item(item_id)?;
        let depreciation = self.ai.depreciation.calculate_acv(&item).await?;
        self.apply_enrichment(
            &item,
            Enrichment::Depreciation {
                acv: depreciation.acv,
                reasoning: depreciation.reasoning,
            },
        )
    }

    /// Re-run image analysis for an item whose analysis failed.
    ///
    /// When `cancel` fires before the analyzer answers, the item goes back to
    /// `error` with [`crate::ANALYSIS_CANCELLED`]. Dropping the future without a
    /// token leaves the item `processing`.
    #[instrument(skip(self, cancel), fields(item_id = %item_id), err)]
    pub async fn reanalyze_item(
        &self,
        item_id: ItemId,
        cancel: Option<&CancellationToken>,
    ) -> EngineResult<ItemStatus> {
        let item = self.require_item(item_id)?;
        if item.status != ItemStatus::Error {
            return Err(EngineError::precondition(format!(
                "'{}' is {}; only items whose analysis failed can be re-analyzed.",
                item.name, item.status
            )));
        }
        let photo = first_photo(&item)?;

        self.commit_logged(
            CommandKind::ChangeStatus {
                item_id,
                to: ItemStatus::Processing,
            },
            Some((
                ActivityAction::AiAnalysis,
                format!("Re-running analysis for '{}'", item.name),
            )),
        )
        .map_err(|err| err.for_item(item_id))?;

        let work = self.analyze_linked_proof(item_id, &photo);
        match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        self.cancel_unfinished(&[item_id]);
                    }
                    _ = work => {}
                }
            }
            None => work.await,
        }
        self.require_item(item_id).map(|i| i.status)
    }

    fn apply_enrichment(&self, item: &Item, enrichment: Enrichment) -> EngineResult<Item> {
        let details = format!("Applied {} to '{}'", enrichment.kind(), item.name);
        self.commit_logged(
            CommandKind::Enrich {
                item_id: item.id,
                enrichment,
            },
            Some((ActivityAction::AiAnalysis, details)),
        )
        .map_err(|err| err.for_item(item.id))?;
        self.require_item(item.id)
    }
}

fn first_photo(item: &Item) -> EngineResult<Proof> {
    item.first_image_proof().cloned().ok_or_else(|| {
        EngineError::precondition(format!("'{}' has no photo to analyze.", item.name))
    })
}
