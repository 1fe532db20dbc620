mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;

use veritas_ai::{AiError, Collaborators, CollaboratorCall, ScriptedCollaborators};
use veritas_claims::{ClaimStatus, CoverageSelection};
use veritas_core::{ClaimId, PolicyId};
use veritas_engine::{EngineConfig, EngineError, Vault};
use veritas_inventory::{ItemPatch, ItemStatus};
use veritas_ledger::ActivityAction;

use common::{active_item, analysis, document, homeowners_policy, vault_with};

fn electronics_ai() -> ScriptedCollaborators {
    ScriptedCollaborators::new()
        .with_analysis("tv.jpg", Ok(analysis("Television", "Electronics", 1200.0)))
        .with_policy(Ok(homeowners_policy(92.0)))
}

fn assembler_calls(ai: &ScriptedCollaborators) -> usize {
    ai.count_calls(|c| matches!(c, CollaboratorCall::AssembleClaim { .. }))
}

#[tokio::test]
async fn confident_policy_is_auto_verified() {
    let vault = vault_with(Arc::new(electronics_ai()));

    let policy = vault.upload_policy(document("policy.pdf")).await.unwrap();

    assert!(policy.is_verified);
    assert_eq!(vault.policy(), Some(policy));
    let activity = vault.activity();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].action(), ActivityAction::PolicyParsed);
}

#[tokio::test]
async fn low_confidence_policy_needs_verification() {
    let vault = vault_with(Arc::new(ScriptedCollaborators::new().with_policy(Ok(homeowners_policy(60.0)))));

    let policy = vault.upload_policy(document("policy.pdf")).await.unwrap();
    assert!(!policy.is_verified);

    let err = vault.verify_policy(PolicyId::new()).unwrap_err();
    assert!(matches!(err, EngineError::PolicyNotFound(_)));

    let verified = vault.verify_policy(policy.id).unwrap();
    assert!(verified.is_verified);
    assert_eq!(vault.activity().last().unwrap().action(), ActivityAction::PolicyVerified);

    // Verifying twice records nothing new.
    let entries = vault.activity().len();
    vault.verify_policy(policy.id).unwrap();
    assert_eq!(vault.activity().len(), entries);
}

#[tokio::test]
async fn threshold_comes_from_config() {
    let ai = Arc::new(ScriptedCollaborators::new().with_policy(Ok(homeowners_policy(70.0))));
    let vault = Vault::new(
        EngineConfig::default().with_auto_verify_threshold(65.0),
        Collaborators::uniform(ai),
    );

    assert!(vault.upload_policy(document("policy.pdf")).await.unwrap().is_verified);
}

#[tokio::test]
async fn parse_failure_leaves_the_vault_unchanged() {
    let vault = vault_with(Arc::new(
        ScriptedCollaborators::new().with_policy(Err(AiError::inference("unreadable scan"))),
    ));

    let err = vault.upload_policy(document("policy.pdf")).await.unwrap_err();

    assert!(matches!(err, EngineError::Collaborator(_)));
    assert!(vault.policy().is_none());
    assert!(vault.activity().is_empty());
}

#[tokio::test]
async fn coverage_prefers_the_matching_sub_limit() {
    let vault = vault_with(Arc::new(electronics_ai()));
    vault.upload_policy(document("policy.pdf")).await.unwrap();
    let tv = active_item(&vault, "tv.jpg").await;
    let entries = vault.activity().len();

    let selection = vault.recommend_coverage(tv).unwrap();

    assert!(matches!(&selection, CoverageSelection::Matched(e) if e.category == "Electronics"));
    assert_eq!(vault.item(tv).unwrap().recommended_coverage.unwrap().limit, 5_000.0);
    assert_eq!(vault.activity().len(), entries);
}

#[tokio::test]
async fn unmatched_category_falls_back_to_main_coverage() {
    let vault = vault_with(Arc::new(electronics_ai()));
    vault.upload_policy(document("policy.pdf")).await.unwrap();
    let rug = active_item(&vault, "rug.jpg").await;

    let selection = vault.recommend_coverage(rug).unwrap();

    assert!(matches!(&selection, CoverageSelection::Fallback(e) if e.category == "Personal Property"));
}

#[tokio::test]
async fn coverage_needs_a_policy() {
    let vault = vault_with(Arc::new(electronics_ai()));
    let tv = active_item(&vault, "tv.jpg").await;

    let err = vault.recommend_coverage(tv).unwrap_err();
    assert!(matches!(err, EngineError::PreconditionFailed(_)));
}

#[tokio::test]
async fn drafting_attaches_the_claim_everywhere() {
    let ai = Arc::new(electronics_ai());
    let vault = vault_with(ai.clone());
    vault.upload_policy(document("policy.pdf")).await.unwrap();
    let tv = active_item(&vault, "tv.jpg").await;
    vault.recommend_coverage(tv).unwrap();

    let claim = vault.draft_claim(tv).await.unwrap();

    assert_eq!(claim.asset_id, tv);
    assert_eq!(claim.status, ClaimStatus::Draft);
    assert_eq!(claim.claimant, "Jordan Reyes");
    assert_eq!(claim.description, "Television - Television");
    let item = vault.item(tv).unwrap();
    assert!(item.is_claimed);
    assert_eq!(item.status, ItemStatus::Claimed);
    assert_eq!(item.claims, vec![claim.clone()]);
    assert_eq!(vault.claims(), vec![claim]);
    assert_eq!(vault.activity().last().unwrap().action(), ActivityAction::ClaimDrafted);
    assert_eq!(assembler_calls(&ai), 1);
}

#[tokio::test]
async fn claim_preconditions_are_checked_before_assembly() {
    let ai = Arc::new(ScriptedCollaborators::new().with_policy(Ok(homeowners_policy(40.0))));
    let vault = vault_with(ai.clone());
    let tv = active_item(&vault, "tv.jpg").await;

    // No policy.
    let err = vault.draft_claim(tv).await.unwrap_err();
    assert!(matches!(err, EngineError::PreconditionFailed(_)));

    // Policy present but unverified.
    let policy = vault.upload_policy(document("policy.pdf")).await.unwrap();
    vault.recommend_coverage(tv).unwrap();
    let err = vault.draft_claim(tv).await.unwrap_err();
    assert!(matches!(err, EngineError::PreconditionFailed(_)));

    // Verified but the item has no recommendation.
    vault.verify_policy(policy.id).unwrap();
    let other = active_item(&vault, "chair.jpg").await;
    let err = vault.draft_claim(other).await.unwrap_err();
    assert!(matches!(err, EngineError::PreconditionFailed(_)));

    assert_eq!(assembler_calls(&ai), 0);
    assert!(vault.claims().is_empty());
    assert!(!vault.item(tv).unwrap().is_claimed);
}

#[tokio::test]
async fn unapproved_items_cannot_be_claimed() {
    let ai = Arc::new(electronics_ai());
    let vault = vault_with(ai.clone());
    vault.upload_policy(document("policy.pdf")).await.unwrap();
    let tv = common::ingest_photo(&vault, "tv.jpg").await;
    vault.recommend_coverage(tv).unwrap();

    let err = vault.draft_claim(tv).await.unwrap_err();

    assert!(matches!(err, EngineError::PreconditionFailed(_)));
    assert_eq!(assembler_calls(&ai), 0);
}

#[tokio::test]
async fn assembler_failure_leaves_item_unclaimed() {
    let ai = Arc::new(electronics_ai().with_claim_failure(AiError::unavailable("service down")));
    let vault = vault_with(ai);
    vault.upload_policy(document("policy.pdf")).await.unwrap();
    let tv = active_item(&vault, "tv.jpg").await;
    vault.recommend_coverage(tv).unwrap();

    let err = vault.draft_claim(tv).await.unwrap_err();

    assert!(matches!(err, EngineError::Collaborator(_)));
    assert_eq!(vault.item(tv).unwrap().status, ItemStatus::Active);
    assert!(vault.claims().is_empty());
}

#[tokio::test]
async fn filing_is_idempotent() {
    let vault = vault_with(Arc::new(electronics_ai()));
    vault.upload_policy(document("policy.pdf")).await.unwrap();
    let tv = active_item(&vault, "tv.jpg").await;
    vault.recommend_coverage(tv).unwrap();
    let claim = vault.draft_claim(tv).await.unwrap();

    let filed = vault.file_claim(claim.id).unwrap();
    assert_eq!(filed.status, ClaimStatus::Submitted);
    assert!(filed.submitted_at.is_some());
    assert_eq!(vault.item(tv).unwrap().claims[0].status, ClaimStatus::Submitted);

    let again = vault.file_claim(claim.id).unwrap();
    assert_eq!(again.submitted_at, filed.submitted_at);
    assert_eq!(vault.activity().iter().filter(|e| e.action() == ActivityAction::ClaimSubmitted).count(), 1);

    let err = vault.file_claim(ClaimId::new()).unwrap_err();
    assert!(matches!(err, EngineError::ClaimNotFound(_)));
}

#[tokio::test]
async fn claimed_items_can_still_be_edited_and_deleted() {
    let vault = vault_with(Arc::new(electronics_ai()));
    vault.upload_policy(document("policy.pdf")).await.unwrap();
    let tv = active_item(&vault, "tv.jpg").await;
    vault.recommend_coverage(tv).unwrap();
    vault.draft_claim(tv).await.unwrap();

    let edited = vault
        .update_item(
            tv,
            ItemPatch {
                serial_number: Some("SN-5521".into()),
                ..ItemPatch::default()
            },
        )
        .unwrap();
    assert_eq!(edited.status, ItemStatus::Claimed);

    vault.delete_item(tv).unwrap();
    assert!(vault.claims().is_empty());
}
