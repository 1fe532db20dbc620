mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use veritas_ai::{AiError, CollaboratorCall, InputFile, ScriptedCollaborators};
use veritas_engine::{ANALYSIS_CANCELLED, CancellationToken, EngineError};
use veritas_inventory::{DOCUMENTS_CATEGORY, ItemOrigin, ItemStatus, PLACEHOLDER_DESCRIPTION};
use veritas_ledger::ActivityAction;

use common::{analysis, document, photo, vault_with};

#[tokio::test(start_paused = true)]
async fn placeholders_are_visible_while_analysis_runs() {
    let ai = Arc::new(ScriptedCollaborators::new().with_delay("tv.jpg", Duration::from_secs(5)));
    let vault = vault_with(ai);

    let ingest = vault.ingest_files(vec![photo("tv.jpg")], ItemOrigin::ManualUpload, None);
    tokio::pin!(ingest);

    let during = tokio::select! {
        biased;
        _ = &mut ingest => panic!("analysis should still be running"),
        _ = tokio::time::sleep(Duration::from_secs(1)) => vault.items(),
    };
    assert_eq!(during.len(), 1);
    assert_eq!(during[0].status, ItemStatus::Processing);
    assert_eq!(during[0].name, "tv.jpg");
    assert_eq!(during[0].description, PLACEHOLDER_DESCRIPTION);
    assert_eq!(during[0].original_cost, 0.0);

    let report = ingest.await.unwrap();
    assert_eq!(report.completed, report.items);
    assert_eq!(vault.item(report.items[0]).unwrap().status, ItemStatus::NeedsReview);
}

#[tokio::test]
async fn batch_records_a_single_entry() {
    let vault = vault_with(Arc::new(ScriptedCollaborators::new()));

    let report = vault
        .ingest_files(
            vec![photo("a.jpg"), photo("b.jpg"), photo("c.jpg")],
            ItemOrigin::ManualUpload,
            None,
        )
        .await
        .unwrap();

    assert_eq!(report.items.len(), 3);
    let activity = vault.activity();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].action(), ActivityAction::ItemAdded);
    assert!(activity[0].details().starts_with("Added 3 item(s)"));
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let ai = Arc::new(ScriptedCollaborators::new());
    let vault = vault_with(ai.clone());

    let report = vault.ingest_files(Vec::new(), ItemOrigin::ManualUpload, None).await.unwrap();

    assert!(report.is_empty());
    assert!(vault.items().is_empty());
    assert!(vault.activity().is_empty());
    assert!(ai.calls().is_empty());
}

#[tokio::test]
async fn analysis_fills_in_the_item() {
    let ai = Arc::new(
        ScriptedCollaborators::new().with_analysis("tv.jpg", Ok(analysis("Television", "Electronics", 1299.5))),
    );
    let vault = vault_with(ai);

    let id = common::ingest_photo(&vault, "tv.jpg").await;
    let item = vault.item(id).unwrap();

    assert_eq!(item.status, ItemStatus::NeedsReview);
    assert_eq!(item.name, "Television");
    assert_eq!(item.category, "Electronics");
    assert_eq!(item.original_cost, 1299.5);
    assert_eq!(item.linked_proofs.len(), 1);
    assert_eq!(
        item.notes,
        vec!["AI suggested category 'Electronics' with estimated value $1299.50".to_string()]
    );
}

#[tokio::test]
async fn one_failure_does_not_affect_siblings() {
    let ai = Arc::new(
        ScriptedCollaborators::new()
            .with_analysis("broken.jpg", Err(AiError::inference("model overloaded")))
            .with_read_failure("corrupt.jpg"),
    );
    let vault = vault_with(ai);

    let report = vault
        .ingest_files(
            vec![photo("lamp.jpg"), photo("broken.jpg"), photo("corrupt.jpg")],
            ItemOrigin::ManualUpload,
            None,
        )
        .await
        .unwrap();

    let [lamp, broken, corrupt] = [report.items[0], report.items[1], report.items[2]];
    assert_eq!(report.completed, vec![lamp]);
    assert_eq!(report.failed, vec![broken, corrupt]);

    assert_eq!(vault.item(lamp).unwrap().status, ItemStatus::NeedsReview);
    let broken = vault.item(broken).unwrap();
    assert_eq!(broken.status, ItemStatus::Error);
    assert!(broken.error_message.unwrap().contains("model overloaded"));
    let corrupt = vault.item(corrupt).unwrap();
    assert_eq!(corrupt.status, ItemStatus::Error);
    assert!(corrupt.linked_proofs.is_empty());
}

#[tokio::test]
async fn documents_skip_image_analysis() {
    let ai = Arc::new(ScriptedCollaborators::new());
    let vault = vault_with(ai.clone());

    let report = vault
        .ingest_files(vec![document("receipt.pdf")], ItemOrigin::ManualUpload, None)
        .await
        .unwrap();

    let item = vault.item(report.items[0]).unwrap();
    assert_eq!(item.status, ItemStatus::NeedsReview);
    assert_eq!(item.category, DOCUMENTS_CATEGORY);
    assert_eq!(item.notes.len(), 1);
    assert_eq!(ai.count_calls(|c| matches!(c, CollaboratorCall::AnalyzeImage { .. })), 0);
}

#[tokio::test(start_paused = true)]
async fn item_deleted_mid_analysis_stays_deleted() {
    let ai = Arc::new(
        ScriptedCollaborators::new()
            .with_delay("slow.jpg", Duration::from_secs(10))
            .with_delay("fast.jpg", Duration::from_secs(1)),
    );
    let vault = vault_with(ai);

    let ingest = vault.ingest_files(vec![photo("slow.jpg"), photo("fast.jpg")], ItemOrigin::ManualUpload, None);
    tokio::pin!(ingest);

    let slow = tokio::select! {
        biased;
        _ = &mut ingest => panic!("analysis should still be running"),
        _ = tokio::time::sleep(Duration::from_secs(2)) => vault.items()[0].id,
    };
    vault.delete_item(slow).unwrap();

    let report = ingest.await.unwrap();
    assert!(vault.item(slow).is_none());
    assert_eq!(vault.items().len(), 1);
    assert_eq!(report.completed.len(), 1);
    assert!(!report.completed.contains(&slow));
    assert!(!report.failed.contains(&slow));
}

#[tokio::test(start_paused = true)]
async fn cancellation_settles_unfinished_items() {
    let ai = Arc::new(ScriptedCollaborators::new().with_delay("slow.jpg", Duration::from_secs(60)));
    let vault = vault_with(ai);
    let token = CancellationToken::new();

    let canceller = {
        let token = token.clone();
        async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            token.cancel();
        }
    };
    let (report, ()) = tokio::join!(
        vault.ingest_files(vec![photo("quick.jpg"), photo("slow.jpg")], ItemOrigin::ManualUpload, Some(&token)),
        canceller,
    );
    let report = report.unwrap();

    let [quick, slow] = [report.items[0], report.items[1]];
    assert_eq!(report.completed, vec![quick]);
    assert_eq!(report.cancelled, vec![slow]);

    let slow = vault.item(slow).unwrap();
    assert_eq!(slow.status, ItemStatus::Error);
    assert_eq!(slow.error_message.as_deref(), Some(ANALYSIS_CANCELLED));
    assert!(vault.items().iter().all(|i| i.status != ItemStatus::Processing));
}

#[tokio::test]
async fn room_scan_frames_become_items() {
    let ai = Arc::new(ScriptedCollaborators::new().with_frames(Ok(3)));
    let vault = vault_with(ai.clone());

    let report = vault
        .ingest_video(InputFile::new("walkthrough.mp4", "video/mp4", vec![0; 16]), None)
        .await
        .unwrap();

    assert_eq!(report.items.len(), 3);
    assert!(vault.items().iter().all(|i| i.origin == ItemOrigin::RoomScan));
    assert_eq!(
        ai.count_calls(|c| matches!(c, CollaboratorCall::ExtractFrames { frames_per_second: 1, .. })),
        1
    );
    assert_eq!(vault.activity().len(), 1);
}

#[tokio::test]
async fn video_without_frames_changes_nothing() {
    let vault = vault_with(Arc::new(ScriptedCollaborators::new().with_frames(Ok(0))));

    let report = vault
        .ingest_video(InputFile::new("dark.mp4", "video/mp4", vec![]), None)
        .await
        .unwrap();

    assert!(report.is_empty());
    assert!(vault.items().is_empty());
    assert!(vault.activity().is_empty());
}

#[tokio::test]
async fn frame_extraction_failure_is_reported() {
    let vault = vault_with(Arc::new(
        ScriptedCollaborators::new().with_frames(Err(AiError::unavailable("decoder missing"))),
    ));

    let err = vault
        .ingest_video(InputFile::new("scan.mov", "video/quicktime", vec![]), None)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Collaborator(_)));
    assert!(vault.items().is_empty());

    let err = vault.ingest_video(photo("still.jpg"), None).await.unwrap_err();
    assert!(matches!(err, EngineError::PreconditionFailed(_)));
}
