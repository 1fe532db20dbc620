use serde::{Deserialize, Serialize};

/// Closed set of auditable actions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    ItemAdded,
    ItemUpdated,
    ItemDeleted,
    ProofLinked,
    ProofUploaded,
    SuggestionApproved,
    SuggestionRejected,
    PolicyUploaded,
    PolicyParsed,
    PolicyVerified,
    ClaimDrafted,
    ClaimSubmitted,
    AiAnalysis,
    UndoApplied,
}

impl ActivityAction {
    /// Stable action name, as written to exported logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::ItemAdded => "ITEM_ADDED",
            ActivityAction::ItemUpdated => "ITEM_UPDATED",
            ActivityAction::ItemDeleted => "ITEM_DELETED",
            ActivityAction::ProofLinked => "PROOF_LINKED",
            ActivityAction::ProofUploaded => "PROOF_UPLOADED",
            ActivityAction::SuggestionApproved => "SUGGESTION_APPROVED",
            ActivityAction::SuggestionRejected => "SUGGESTION_REJECTED",
            ActivityAction::PolicyUploaded => "POLICY_UPLOADED",
            ActivityAction::PolicyParsed => "POLICY_PARSED",
            ActivityAction::PolicyVerified => "POLICY_VERIFIED",
            ActivityAction::ClaimDrafted => "CLAIM_DRAFTED",
            ActivityAction::ClaimSubmitted => "CLAIM_SUBMITTED",
            ActivityAction::AiAnalysis => "AI_ANALYSIS",
            ActivityAction::UndoApplied => "UNDO_APPLIED",
        }
    }
}

impl core::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_name_matches_as_str() {
        for action in [
            ActivityAction::ItemAdded,
            ActivityAction::SuggestionApproved,
            ActivityAction::AiAnalysis,
            ActivityAction::UndoApplied,
        ] {
            let json = serde_json::to_value(action).unwrap();
            assert_eq!(json, serde_json::Value::String(action.as_str().to_string()));
        }
    }
}
