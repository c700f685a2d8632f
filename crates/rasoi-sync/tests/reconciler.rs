use std::sync::Arc;

use rasoi_core::{DraftFields, OnboardingStep, RemoteSession};
use rasoi_db::RasoiDb;
use rasoi_remote::{MockBackend, SessionApi};
use rasoi_sync::{DraftReconciler, PushOutcome, SyncError};

async fn setup() -> (Arc<RasoiDb>, Arc<MockBackend>, DraftReconciler<MockBackend>) {
    let db = Arc::new(RasoiDb::in_memory().await.unwrap());
    let backend = MockBackend::new();
    let reconciler = DraftReconciler::new(db.clone(), backend.clone());
    (db, backend, reconciler)
}

fn phone_otp() -> DraftFields {
    DraftFields {
        phone: Some("+9230012345".into()),
        step: Some(OnboardingStep::Otp),
        ..DraftFields::default()
    }
}

#[tokio::test]
async fn merge_accumulates_across_screens() {
    let (db, _backend, reconciler) = setup().await;

    let first = reconciler.merge_and_persist(phone_otp()).await.unwrap();
    assert_eq!(first.remote, PushOutcome::Synced);
    assert_eq!(first.draft.phone.as_deref(), Some("+9230012345"));
    assert_eq!(first.draft.step, Some(OnboardingStep::Otp));

    let second = reconciler
        .merge_and_persist(DraftFields {
            full_name: Some("Asim".into()),
            step: Some(OnboardingStep::KitchenDetails),
            ..DraftFields::default()
        })
        .await
        .unwrap();

    assert_eq!(second.draft.phone.as_deref(), Some("+9230012345"));
    assert_eq!(second.draft.step, Some(OnboardingStep::KitchenDetails));
    assert_eq!(second.draft.full_name.as_deref(), Some("Asim"));
    assert_eq!(db.load_draft().await.unwrap(), second.draft);
}

#[tokio::test]
async fn remote_outage_does_not_block_the_flow() {
    let (db, backend, reconciler) = setup().await;
    backend.fail_sessions(true);

    let result = reconciler.merge_and_persist(phone_otp()).await.unwrap();

    assert!(matches!(result.remote, PushOutcome::Failed(_)));
    let stored = db.load_draft().await.unwrap();
    assert_eq!(stored.phone.as_deref(), Some("+9230012345"));
    assert_eq!(stored.step, Some(OnboardingStep::Otp));
}

#[tokio::test]
async fn push_without_phone_is_reported_not_fatal() {
    let (db, backend, reconciler) = setup().await;

    let result = reconciler
        .merge_and_persist(DraftFields {
            full_name: Some("Asim".into()),
            ..DraftFields::default()
        })
        .await
        .unwrap();

    assert_eq!(
        result.remote,
        PushOutcome::Failed("draft has no phone number".into())
    );
    assert_eq!(
        db.load_draft().await.unwrap().full_name.as_deref(),
        Some("Asim")
    );
    assert!(backend.get_session("+9230012345").await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_partial_is_rejected_at_the_merge_boundary() {
    let (db, _backend, reconciler) = setup().await;

    let result = reconciler
        .merge_and_persist(DraftFields {
            phone: Some("0300-1234567".into()),
            ..DraftFields::default()
        })
        .await;

    assert!(matches!(result, Err(SyncError::Draft(_))));
    assert!(db.load_draft().await.unwrap().is_empty());
}

#[tokio::test]
async fn resume_prefers_the_local_draft() {
    let (_db, backend, reconciler) = setup().await;

    reconciler.merge_and_persist(phone_otp()).await.unwrap();
    backend
        .update_session(RemoteSession {
            phone: "+9230012345".into(),
            fields: DraftFields {
                phone: Some("+9230012345".into()),
                kitchen_name: Some("Stale Remote Kitchen".into()),
                ..DraftFields::default()
            },
            updated_at: 1,
        })
        .await
        .unwrap();

    let resumed = reconciler.resume("+9230012345").await.unwrap();
    assert_eq!(resumed.step, Some(OnboardingStep::Otp));
    assert_eq!(resumed.kitchen_name, None);
}

#[tokio::test]
async fn resume_seeds_from_the_remote_session() {
    let (db, backend, reconciler) = setup().await;

    backend
        .update_session(RemoteSession {
            phone: "+9230012345".into(),
            fields: DraftFields {
                phone: Some("+9230012345".into()),
                step: Some(OnboardingStep::KitchenAddress),
                kitchen_name: Some("Asim's Handi".into()),
                ..DraftFields::default()
            },
            updated_at: 1,
        })
        .await
        .unwrap();

    let resumed = reconciler.resume("+9230012345").await.unwrap();
    assert_eq!(resumed.step, Some(OnboardingStep::KitchenAddress));
    assert_eq!(resumed.kitchen_name.as_deref(), Some("Asim's Handi"));
    assert_eq!(db.load_draft().await.unwrap(), resumed);
}

#[tokio::test]
async fn resume_degrades_to_empty_when_remote_is_down() {
    let (_db, backend, reconciler) = setup().await;
    backend.fail_sessions(true);

    let resumed = reconciler.resume("+9230012345").await.unwrap();
    assert!(resumed.is_empty());
}

#[tokio::test]
async fn finish_clears_the_draft_only_after_a_synced_push() {
    let (db, backend, reconciler) = setup().await;
    reconciler.merge_and_persist(phone_otp()).await.unwrap();

    backend.fail_sessions(true);
    let outcome = reconciler.finish().await.unwrap();
    assert!(matches!(outcome, PushOutcome::Failed(_)));

    let kept = db.load_draft().await.unwrap();
    assert_eq!(kept.step, Some(OnboardingStep::Submitted));

    backend.fail_sessions(false);
    let outcome = reconciler.finish().await.unwrap();
    assert_eq!(outcome, PushOutcome::Synced);
    assert!(db.load_draft().await.unwrap().is_empty());

    let mirrored = backend.get_session("+9230012345").await.unwrap().unwrap();
    assert_eq!(mirrored.fields.step, Some(OnboardingStep::Submitted));
}
