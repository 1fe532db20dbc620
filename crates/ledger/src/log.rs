//! Append-only activity log.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::action::ActivityAction;
use crate::entry::ActivityLogEntry;

/// Application tag stamped on every entry unless configured otherwise.
pub const DEFAULT_APP_TAG: &str = "VeritasVault";

/// Audit trail of state-changing actions.
///
/// - **Append-only**: entries are never edited or reordered.
/// - The only destructive operation is [`ActivityLog::clear`], used by a full
///   reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLog {
    app: String,
    entries: Vec<ActivityLogEntry>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_APP_TAG)
    }
}

impl ActivityLog {
    pub fn new(app: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            entries: Vec::new(),
        }
    }

    /// Append one entry and return it.
    pub fn record(&mut self, action: ActivityAction, details: impl Into<String>) -> &ActivityLogEntry {
        let entry = ActivityLogEntry::new(self.app.clone(), action, details, Utc::now());
        tracing::debug!(action = %entry.action(), details = entry.details(), "activity recorded");
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[ActivityLogEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&ActivityLogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries recorded for `action`.
    pub fn count_of(&self, action: ActivityAction) -> usize {
        self.entries.iter().filter(|e| e.action() == action).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
