use rasoi_core::{DraftFields, OnboardingStep};
use rasoi_db::RasoiDb;
use tempfile::TempDir;

#[tokio::test]
async fn draft_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partner.db");
    let path = path.to_str().unwrap();

    let draft = DraftFields {
        phone: Some("+9230012345".into()),
        step: Some(OnboardingStep::KitchenDetails),
        full_name: Some("Asim".into()),
        kitchen_name: Some("Asim's Handi".into()),
        ..DraftFields::default()
    };

    let db = RasoiDb::new_with_path(path).await.unwrap();
    db.save_draft(&draft).await.unwrap();
    db.set_remembered_phone("+9230012345").await.unwrap();
    db.close().await;

    // Reopening the same file stands in for an app restart.
    let db = RasoiDb::new_with_path(path).await.unwrap();
    assert_eq!(db.load_draft().await.unwrap(), draft);
    assert_eq!(
        db.remembered_phone().await.unwrap().as_deref(),
        Some("+9230012345")
    );
}
