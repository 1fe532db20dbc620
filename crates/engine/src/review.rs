//! Item review: approve/reject, edits, deletion, undo and reset.

use tracing::instrument;

use veritas_core::ItemId;
use veritas_inventory::{CommandKind, Item, ItemPatch, ItemStatus, UndoableAction};
use veritas_ledger::ActivityAction;

use crate::error::{EngineError, EngineResult};
use crate::vault::Vault;

/// Per-item results of a bulk review action.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub succeeded: Vec<ItemId>,
    pub failed: Vec<(ItemId, EngineError)>,
}

impl BulkOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Vault {
    /// `needs-review → active`.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub fn approve_item(&self, item_id: ItemId) -> EngineResult<Item> {
        self.review(item_id, ItemStatus::Active, "Approved")
    }

    /// `needs-review → rejected`.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub fn reject_item(&self, item_id: ItemId) -> EngineResult<Item> {
        self.review(item_id, ItemStatus::Rejected, "Rejected")
    }

    #[instrument(skip_all, fields(items = item_ids.len()))]
    pub fn approve_items(&self, item_ids: &[ItemId]) -> BulkOutcome {
        self.review_many(item_ids, ItemStatus::Active, "Approved")
    }

    #[instrument(skip_all, fields(items = item_ids.len()))]
    pub fn reject_items(&self, item_ids: &[ItemId]) -> BulkOutcome {
        self.review_many(item_ids, ItemStatus::Rejected, "Rejected")
    }

    fn review(&self, item_id: ItemId, to: ItemStatus, verb: &str) -> EngineResult<Item> {
        let item = self.require_item(item_id)?;
        self.commit_logged(
            CommandKind::ChangeStatus { item_id, to },
            Some((ActivityAction::ItemUpdated, format!("{verb} '{}'", item.name))),
        )
        .map_err(|err| err.for_item(item_id))?;
        self.require_item(item_id)
    }

    fn review_many(&self, item_ids: &[ItemId], to: ItemStatus, verb: &str) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        let mut names = Vec::new();

        for &item_id in item_ids {
            let result = self.require_item(item_id).and_then(|item| {
                self.commit(CommandKind::ChangeStatus { item_id, to }, None)
                    .map(|_| item.name)
                    .map_err(|err| err.for_item(item_id))
            });
            match result {
                Ok(name) => {
                    outcome.succeeded.push(item_id);
                    names.push(name);
                }
                Err(err) => {
                    tracing::debug!(%item_id, error = %err, "bulk review skipped item");
                    outcome.failed.push((item_id, err));
                }
            }
        }

        if !names.is_empty() {
            self.record_activity(
                ActivityAction::ItemUpdated,
                format!("{verb} {} item(s): {}", names.len(), names.join(", ")),
            );
        }
        outcome
    }

    /// Edit item fields. Works in every status and never changes it.
    #[instrument(skip(self, patch), fields(item_id = %item_id), err)]
    pub fn update_item(&self, item_id: ItemId, patch: ItemPatch) -> EngineResult<Item> {
        let item = self.require_item(item_id)?;
        let fields = patch.fields();
        let details = if fields.is_empty() {
            format!("Updated '{}'", item.name)
        } else {
            format!("Updated '{}': {}", item.name, fields.join(", "))
        };
        self.commit_logged(
            CommandKind::UpdateItem { item_id, patch },
            Some((ActivityAction::ItemUpdated, details)),
        )
        .map_err(|err| err.for_item(item_id))?;
        self.require_item(item_id)
    }

    /// Remove an item and its claims. Undoable until the next undoable action.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub fn delete_item(&self, item_id: ItemId) -> EngineResult<Item> {
        let item = self.require_item(item_id)?;
        let claims = item.claims.len();
        let details = if claims == 0 {
            format!("Deleted '{}'", item.name)
        } else {
            format!("Deleted '{}' and {claims} claim(s)", item.name)
        };
        self.commit_logged(
            CommandKind::DeleteItem { item_id },
            Some((ActivityAction::ItemDeleted, details)),
        )
        .map_err(|err| err.for_item(item_id))?;
        Ok(item)
    }

    /// Revert the most recent deletion or suggestion rejection.
    #[instrument(skip(self), err)]
    pub fn undo_last(&self) -> EngineResult<UndoableAction> {
        let Some(action) = self.read(|s| s.pending_undo().cloned()) else {
            return Err(EngineError::precondition("There is nothing to undo."));
        };

        self.commit(
            CommandKind::Undo,
            Some((ActivityAction::UndoApplied, action.describe())),
        )?;
        Ok(action)
    }

    /// Empty the inventory. The account holder is kept.
    #[instrument(skip(self))]
    pub fn reset(&self, keep_log: bool) {
        if let Err(err) = self.commit(CommandKind::Reset, None) {
            tracing::error!(error = %err, "reset failed");
        }
        if !keep_log {
            self.clear_activity();
        }
        tracing::info!(keep_log, "vault reset");
    }

    pub fn clear_activity_log(&self) {
        self.clear_activity();
    }
}
