use serde::{Deserialize, Serialize};

use veritas_core::{Entity, ProofId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofKind {
    Image,
    Document,
}

impl ProofKind {
    /// `image/*` is an image; everything else is filed as a document.
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.trim().to_ascii_lowercase().starts_with("image/") {
            ProofKind::Image
        } else {
            ProofKind::Document
        }
    }
}

/// An evidentiary file.
///
/// Lives either in the unlinked pool or in exactly one item's linked proofs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    pub id: ProofId,
    pub kind: ProofKind,
    pub file_name: String,
    pub mime_type: String,
    /// Embedded content reference (e.g. a data URL).
    pub content: String,
}

impl Proof {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, content: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self {
            id: ProofId::new(),
            kind: ProofKind::from_mime(&mime_type),
            file_name: file_name.into(),
            mime_type,
            content: content.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind == ProofKind::Image
    }
}

impl Entity for Proof {
    type Id = ProofId;

    fn id(&self) -> ProofId {
        self.id
    }
}

/// A proposed association between an unlinked proof and an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofSuggestion {
    pub proof_id: ProofId,
    /// 0–100.
    pub confidence: f64,
    pub reason: String,
}

impl ProofSuggestion {
    pub fn new(proof_id: ProofId, confidence: f64, reason: impl Into<String>) -> Self {
        let confidence = if confidence.is_finite() { confidence.clamp(0.0, 100.0) } else { 0.0 };
        Self {
            proof_id,
            confidence,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_mime_type() {
        assert!(Proof::new("tv.jpg", "image/jpeg", "data:").is_image());
        assert_eq!(Proof::new("receipt.pdf", "application/pdf", "data:").kind, ProofKind::Document);
        assert_eq!(ProofKind::from_mime(" IMAGE/PNG"), ProofKind::Image);
    }

    #[test]
    fn suggestion_confidence_is_clamped() {
        let id = ProofId::new();
        assert_eq!(ProofSuggestion::new(id, 140.0, "r").confidence, 100.0);
        assert_eq!(ProofSuggestion::new(id, -3.0, "r").confidence, 0.0);
        assert_eq!(ProofSuggestion::new(id, f64::NAN, "r").confidence, 0.0);
    }
}
