use thiserror::Error;

use veritas_ai::AiError;
use veritas_core::{ClaimId, DomainError, ItemId, PolicyId, ProofId};

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by vault operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("proof {0} not found")]
    ProofNotFound(ProofId),

    #[error("claim {0} not found")]
    ClaimNotFound(ClaimId),

    #[error("policy {0} not found")]
    PolicyNotFound(PolicyId),

    /// A required input is missing; checked before any collaborator call.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("collaborator failed: {0}")]
    Collaborator(#[from] AiError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl EngineError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            EngineError::ItemNotFound(_)
            | EngineError::ProofNotFound(_)
            | EngineError::ClaimNotFound(_)
            | EngineError::PolicyNotFound(_) => true,
            EngineError::Domain(d) => d.is_not_found(),
            _ => false,
        }
    }

    /// Re-type a reducer "not found" as the item having vanished.
    pub(crate) fn for_item(self, item_id: ItemId) -> Self {
        match self {
            EngineError::Domain(DomainError::NotFound { entity: "item", .. }) => EngineError::ItemNotFound(item_id),
            other => other,
        }
    }

    /// Message suitable for showing to the user.
    pub fn user_notice(&self) -> String {
        match self {
            EngineError::ItemNotFound(_) => "That item no longer exists.".to_string(),
            EngineError::ProofNotFound(_) => "That proof is no longer available.".to_string(),
            EngineError::ClaimNotFound(_) => "That claim no longer exists.".to_string(),
            EngineError::PolicyNotFound(_) => "That policy is not the active policy.".to_string(),
            EngineError::PreconditionFailed(msg) => msg.clone(),
            EngineError::Collaborator(err) => {
                format!("The analysis service could not complete the request ({err}). Please try again.")
            }
            EngineError::Domain(DomainError::InvalidTransition { from, to }) => {
                format!("An item that is {from} cannot become {to}.")
            }
            EngineError::Domain(err) => format!("The change was not applied: {err}."),
        }
    }
}
