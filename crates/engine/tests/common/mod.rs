#![allow(dead_code)]

use std::sync::Arc;

use veritas_ai::{Collaborators, ImageAnalysis, InputFile, PolicyExtraction, ScriptedCollaborators};
use veritas_claims::{AccountHolder, CoverageEntry};
use veritas_core::ItemId;
use veritas_engine::{EngineConfig, Vault};
use veritas_inventory::ItemOrigin;

pub fn photo(name: &str) -> InputFile {
    InputFile::new(name, "image/jpeg", vec![0xff, 0xd8, 0xff])
}

pub fn document(name: &str) -> InputFile {
    InputFile::new(name, "application/pdf", b"%PDF-1.7".to_vec())
}

pub fn vault_with(ai: Arc<ScriptedCollaborators>) -> Vault {
    veritas_observability::init_for_tests();
    Vault::for_account_holder(
        EngineConfig::default(),
        Collaborators::uniform(ai),
        AccountHolder::new("Jordan Reyes", "12 Elm Street, Springfield"),
    )
}

pub fn analysis(name: &str, category: &str, value: f64) -> ImageAnalysis {
    ImageAnalysis {
        item_name: name.to_string(),
        description: format!("{name}. Shown in the living room."),
        category: category.to_string(),
        estimated_value: value,
        brand: None,
        model: None,
    }
}

pub fn homeowners_policy(confidence: f64) -> PolicyExtraction {
    PolicyExtraction {
        policy_number: "HO-2291".to_string(),
        provider: "Acme Mutual".to_string(),
        coverage: vec![
            CoverageEntry::main("Personal Property", 75_000.0),
            CoverageEntry::sub_limit("Electronics", 5_000.0),
            CoverageEntry::sub_limit("Jewelry", 1_500.0),
        ],
        deductible: 1_000.0,
        exclusions: vec!["Flood".to_string()],
        confidence_score: confidence,
    }
}

/// Ingest one photo and return its (analysed) item.
pub async fn ingest_photo(vault: &Vault, name: &str) -> ItemId {
    let report = vault
        .ingest_files(vec![photo(name)], ItemOrigin::ManualUpload, None)
        .await
        .unwrap();
    report.items[0]
}

/// Ingest and approve one photo.
pub async fn active_item(vault: &Vault, name: &str) -> ItemId {
    let id = ingest_photo(vault, name).await;
    vault.approve_item(id).unwrap();
    id
}
