use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use veritas_core::LogEntryId;

use crate::action::ActivityAction;

/// One immutable audit record.
///
/// Fields are private: once appended, an entry is never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    id: LogEntryId,
    timestamp: DateTime<Utc>,
    app: String,
    action: ActivityAction,
    details: String,
}

impl ActivityLogEntry {
    pub(crate) fn new(
        app: impl Into<String>,
        action: ActivityAction,
        details: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: LogEntryId::new(),
            timestamp,
            app: app.into(),
            action,
            details: details.into(),
        }
    }

    pub fn id(&self) -> LogEntryId {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// ISO-8601 timestamp with millisecond precision.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn action(&self) -> ActivityAction {
        self.action
    }

    pub fn details(&self) -> &str {
        &self.details
    }
}
