use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;

use veritas_ai::{Collaborators, InputFile};
use veritas_claims::{AccountHolder, DraftClaim, ParsedPolicy};
use veritas_core::{Aggregate, AggregateRoot, ItemId};
use veritas_inventory::{CommandKind, Item, Proof, VaultCommand, VaultEvent, VaultState};
use veritas_ledger::{ActivityAction, ActivityLog, ActivityLogEntry, SyncIndicator, SyncStatus};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Serializable copy of everything the vault holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSnapshot {
    pub state: VaultState,
    pub activity: ActivityLog,
    pub sync_status: SyncStatus,
}

impl VaultSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// The inventory vault: entity store, activity log and sync indicator.
///
/// Locks are held only for short read-modify-write sections and never across
/// an `.await`; collaborator calls run against cloned snapshots.
#[derive(Debug)]
pub struct Vault {
    pub(crate) config: EngineConfig,
    pub(crate) ai: Collaborators,
    state: Mutex<VaultState>,
    activity: Mutex<ActivityLog>,
    sync: SyncIndicator,
}

impl Vault {
    pub fn new(config: EngineConfig, ai: Collaborators) -> Self {
        Self::with_state(config, ai, VaultState::default())
    }

    /// An empty vault owned by `holder`.
    pub fn for_account_holder(config: EngineConfig, ai: Collaborators, holder: AccountHolder) -> Self {
        Self::with_state(config, ai, VaultState::new(Some(holder)))
    }

    pub fn with_state(config: EngineConfig, ai: Collaborators, state: VaultState) -> Self {
        let activity = ActivityLog::new(config.app_tag.clone());
        let sync = SyncIndicator::new(config.sync);
        Self {
            config,
            ai,
            state: Mutex::new(state),
            activity: Mutex::new(activity),
            sync,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, VaultState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_activity(&self) -> MutexGuard<'_, ActivityLog> {
        self.activity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the current state without mutating it.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&VaultState) -> T) -> T {
        f(&self.lock_state())
    }

    /// Apply one command, then record `entry` and signal a save if anything
    /// changed.
    ///
    /// A command that produces no events is a no-op: no entry, no sync.
    pub(crate) fn commit(
        &self,
        kind: CommandKind,
        entry: Option<(ActivityAction, String)>,
    ) -> EngineResult<Vec<VaultEvent>> {
        let command = VaultCommand::now(kind);
        let (events, version) = {
            let mut state = self.lock_state();
            let events = state.execute(&command).map_err(EngineError::from)?;
            (events, state.version())
        };

        if events.is_empty() {
            return Ok(events);
        }

        for event in &events {
            tracing::debug!(event_type = event.event_type(), version, "vault event applied");
        }
        if let Some((action, details)) = entry {
            self.lock_activity().record(action, details);
        }
        self.sync.trigger();
        Ok(events)
    }

    /// Like [`Vault::commit`], logging lookups that failed because an entity
    /// vanished.
    pub(crate) fn commit_logged(
        &self,
        kind: CommandKind,
        entry: Option<(ActivityAction, String)>,
    ) -> EngineResult<Vec<VaultEvent>> {
        self.commit(kind, entry).inspect_err(|err| {
            if err.is_not_found() {
                tracing::warn!(error = %err, "vault change skipped");
            }
        })
    }

    /// Clone of the item, or `ItemNotFound`.
    pub(crate) fn require_item(&self, item_id: ItemId) -> EngineResult<Item> {
        self.item(item_id).ok_or_else(|| {
            tracing::warn!(%item_id, "item not found");
            EngineError::ItemNotFound(item_id)
        })
    }

    /// Read file contents into proofs, failing on the first unreadable file.
    pub(crate) async fn read_proofs(&self, files: &[InputFile]) -> EngineResult<Vec<Proof>> {
        let mut proofs = Vec::with_capacity(files.len());
        for file in files {
            let content = self.ai.file_reader.read_content(file).await?;
            proofs.push(Proof::new(file.file_name.clone(), file.mime_type.clone(), content));
        }
        Ok(proofs)
    }

    /// Append a summary entry for changes already committed without one.
    /// Record an entry that accompanies no state change. The log is part of
    /// what gets saved, so this also signals a save.
    pub(crate) fn record_activity(&self, action: ActivityAction, details: String) {
        self.lock_activity().record(action, details);
        self.sync.trigger();
    }

    pub(crate) fn clear_activity(&self) {
        self.lock_activity().clear();
    }

    pub fn snapshot(&self) -> VaultSnapshot {
        let state = self.lock_state().clone();
        let activity = self.lock_activity().clone();
        VaultSnapshot {
            state,
            activity,
            sync_status: self.sync.status(),
        }
    }

    pub fn item(&self, item_id: ItemId) -> Option<Item> {
        self.read(|s| s.item(item_id).cloned())
    }

    pub fn items(&self) -> Vec<Item> {
        self.read(|s| s.items().to_vec())
    }

    pub fn unlinked_proofs(&self) -> Vec<Proof> {
        self.read(|s| s.unlinked_proofs().to_vec())
    }

    pub fn claims(&self) -> Vec<DraftClaim> {
        self.read(|s| s.claims().to_vec())
    }

    pub fn policy(&self) -> Option<ParsedPolicy> {
        self.read(|s| s.policy().cloned())
    }

    pub fn account_holder(&self) -> Option<AccountHolder> {
        self.read(|s| s.account_holder().cloned())
    }

    pub fn activity(&self) -> Vec<ActivityLogEntry> {
        self.lock_activity().entries().to_vec()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync.status()
    }

    pub fn subscribe_sync(&self) -> watch::Receiver<SyncStatus> {
        self.sync.subscribe()
    }
}
