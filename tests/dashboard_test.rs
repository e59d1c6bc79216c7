//! ダッシュボードの統合テスト

mod support;

use support::*;
use wardrobe::error::WardrobeError;
use wardrobe::services::UploadKind;
use wardrobe::DashboardSession;
use wardrobe_common::{
    ClothingCategory, Error as CommonError, FaceQuality, PreviewRegistry, SlotState,
    ValidationError,
};

fn wardrobe_items() -> Vec<wardrobe_common::SavedItem> {
    vec![
        saved_item("1", "Red Tee", ClothingCategory::Top),
        saved_item("2", "White Shirt", ClothingCategory::Top),
        saved_item("3", "Jeans", ClothingCategory::Bottom),
        saved_item("4", "Cap", ClothingCategory::Head),
    ]
}

async fn load(records: &FakeProfileStore) -> DashboardSession {
    DashboardSession::load(records, OWNER, PreviewRegistry::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_load_and_has_profile() {
    let records = FakeProfileStore::seeded(Some(profile_record(None)), wardrobe_items());
    let session = load(&records).await;
    let state = session.state();
    assert!(state.has_profile());
    assert_eq!(state.items().len(), 4);
    assert_eq!(state.items_in(ClothingCategory::Top).count(), 2);

    let empty = FakeProfileStore::seeded(Some(profile_record(None)), vec![]);
    assert!(!load(&empty).await.state().has_profile());
}

#[tokio::test]
async fn test_toggle_by_id() {
    let records = FakeProfileStore::seeded(Some(profile_record(None)), wardrobe_items());
    let session = load(&records).await;

    session.update(|d| d.toggle("1")).unwrap();
    session.update(|d| d.toggle("3")).unwrap();
    session.update(|d| d.toggle("2")).unwrap();
    {
        let state = session.state();
        let selection = state.selection();
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.get(ClothingCategory::Top).unwrap().id, "2");
        assert_eq!(selection.get(ClothingCategory::Bottom).unwrap().id, "3");
    }

    session.update(|d| d.toggle("2")).unwrap();
    assert!(session.state().selection().get(ClothingCategory::Top).is_none());

    let err = session.update(|d| d.toggle("99")).unwrap_err();
    assert!(matches!(err, WardrobeError::ItemNotFound(_)));
}

#[tokio::test]
async fn test_select_is_idempotent() {
    let records = FakeProfileStore::seeded(Some(profile_record(None)), wardrobe_items());
    let session = load(&records).await;

    session.update(|d| d.select("1")).unwrap();
    session.update(|d| d.select("1")).unwrap();
    assert_eq!(session.state().selection().len(), 1);
}

#[tokio::test]
async fn test_generate_without_profile_picture_makes_no_call() {
    let records = FakeProfileStore::seeded(Some(profile_record(None)), wardrobe_items());
    let session = load(&records).await;
    session.update(|d| d.toggle("1")).unwrap();
    assert_eq!(
        session.state().selection().get(ClothingCategory::Top).unwrap().name,
        "Red Tee"
    );
    let generator = FakeGenerator::default();

    let err = session.generate(&generator).await.unwrap_err();
    assert_eq!(err.to_string(), "Please upload a profile picture first");
    assert_eq!(generator.calls.get(), 0);
    assert!(!session.state().outfit().is_generating());
}

#[tokio::test]
async fn test_generate_without_selection_makes_no_call() {
    let records =
        FakeProfileStore::seeded(Some(profile_record(Some("mem://me.png"))), wardrobe_items());
    let session = load(&records).await;
    let generator = FakeGenerator::default();

    let err = session.generate(&generator).await.unwrap_err();
    assert!(matches!(
        err,
        WardrobeError::Common(CommonError::Validation(ValidationError::NoItemsSelected))
    ));
    assert_eq!(generator.calls.get(), 0);
}

#[tokio::test]
async fn test_generate_sends_selected_items_and_personalization() {
    let records =
        FakeProfileStore::seeded(Some(profile_record(Some("mem://me.png"))), wardrobe_items());
    let session = load(&records).await;
    session.update(|d| d.toggle("1")).unwrap();
    session.update(|d| d.toggle("4")).unwrap();
    let generator = FakeGenerator::default().then_succeed("data:image/png;base64,AAAA");

    let image = session.generate(&generator).await.unwrap();
    assert_eq!(image, "data:image/png;base64,AAAA");

    let request = generator.last_request.borrow().clone().unwrap();
    assert_eq!(request.profile_pic_url, "mem://me.png");
    assert_eq!(request.top_image_url.as_deref(), Some("mem://clothing/1"));
    assert_eq!(request.head_image_url.as_deref(), Some("mem://clothing/4"));
    assert!(request.bottom_image_url.is_none());
    assert_eq!(request.personalization.age, Some(28));

    let state = session.state();
    assert_eq!(state.outfit().image_data_url(), Some("data:image/png;base64,AAAA"));
    assert!(state.outfit().error().is_none());
}

#[tokio::test]
async fn test_regenerate_failure_keeps_previous_image() {
    let records =
        FakeProfileStore::seeded(Some(profile_record(Some("mem://me.png"))), wardrobe_items());
    let session = load(&records).await;
    session.update(|d| d.toggle("3")).unwrap();
    let generator = FakeGenerator::default()
        .then_succeed("data:image/png;base64,FIRST")
        .then_fail("model overloaded");

    session.generate(&generator).await.unwrap();
    let err = session.regenerate(&generator).await.unwrap_err();
    assert!(err.is_retryable());

    let state = session.state();
    assert_eq!(state.outfit().image_data_url(), Some("data:image/png;base64,FIRST"));
    assert_eq!(state.outfit().error(), Some("Failed to generate outfit image"));
    assert!(!state.outfit().is_generating());
    assert_eq!(generator.calls.get(), 2);
}

#[tokio::test]
async fn test_generate_while_in_flight_is_rejected() {
    let records =
        FakeProfileStore::seeded(Some(profile_record(Some("mem://me.png"))), wardrobe_items());
    let session = load(&records).await;
    session.update(|d| d.toggle("1")).unwrap();
    let generator = FakeGenerator::default();
    let release = generator.gate();

    let (first, second) = futures::join!(session.generate(&generator), async {
        let second = session.regenerate(&generator).await;
        let _ = release.send(());
        second
    });

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(WardrobeError::Common(CommonError::GenerationInProgress))
    ));
    assert_eq!(generator.calls.get(), 1);
}

#[tokio::test]
async fn test_add_clothing_flow_refreshes_list() {
    let records = FakeProfileStore::seeded(Some(profile_record(None)), wardrobe_items());
    let session = load(&records).await;
    let classifier = FakeClassifier::default();
    let store = FakeObjectStore::default();

    session
        .drop_clothing(ClothingCategory::Head, png("beanie.png"), &classifier)
        .await
        .unwrap();
    assert_eq!(
        session.state().clothing_category(),
        Some(ClothingCategory::Head)
    );

    let item = session.save_clothing(&store, &records).await.unwrap();
    assert_eq!(item.category, ClothingCategory::Head);
    assert_eq!(item.image_url, "mem://clothing/head/user-1/1-beanie.png");
    assert_eq!(
        store.uploads.borrow()[0].1,
        UploadKind::Clothing(ClothingCategory::Head)
    );

    let state = session.state();
    assert_eq!(state.items().len(), 5);
    assert!(state.find_item(&item.id).is_some());
    assert!(state.clothing_slot().is_empty());
    assert!(state.clothing_category().is_none());
    assert_eq!(state.previews().outstanding(), 0);
}

#[tokio::test]
async fn test_rejected_clothing_cannot_be_saved() {
    let records = FakeProfileStore::seeded(Some(profile_record(None)), vec![]);
    let session = load(&records).await;
    let classifier = FakeClassifier::default()
        .with_report("cat.png", {
            let mut report = clothing_report("Cat", ClothingCategory::Top);
            report.is_clothing = false;
            report
        });
    let store = FakeObjectStore::default();

    session
        .drop_clothing(ClothingCategory::Top, png("cat.png"), &classifier)
        .await
        .unwrap();
    assert!(matches!(
        session.state().clothing_slot().state(),
        SlotState::Failed { .. }
    ));

    let err = session.save_clothing(&store, &records).await.unwrap_err();
    assert!(matches!(err, WardrobeError::Common(CommonError::Rejected(_))));
    assert_eq!(store.upload_count(), 0);
}

#[tokio::test]
async fn test_face_flow_sets_profile_picture() {
    let records = FakeProfileStore::seeded(Some(profile_record(None)), wardrobe_items());
    let session = load(&records).await;
    let verifier = FakeVerifier::new(FaceQuality::Good, &[]);
    let store = FakeObjectStore::default();

    session.drop_face(jpeg("me.jpg"), &verifier).await.unwrap();
    let profile = session.save_face(&store, &records).await.unwrap();

    assert_eq!(
        profile.profile_pic.as_deref(),
        Some("mem://profile/user-1/1-me.jpg")
    );
    assert_eq!(store.uploads.borrow()[0].1, UploadKind::Profile);
    let state = session.state();
    assert_eq!(state.profile_pic(), Some("mem://profile/user-1/1-me.jpg"));
    assert!(state.face_slot().is_empty());
}

#[tokio::test]
async fn test_poor_face_is_rejected() {
    let records = FakeProfileStore::seeded(Some(profile_record(None)), vec![]);
    let session = load(&records).await;
    let verifier = FakeVerifier::new(FaceQuality::Poor, &["blurry", "dark"]);
    let store = FakeObjectStore::default();

    session.drop_face(png("me.png"), &verifier).await.unwrap();
    assert_eq!(
        session.state().face_slot().error(),
        Some("Photo quality is too low. Issues: blurry, dark. Please upload a clearer photo.")
    );

    assert!(session.save_face(&store, &records).await.is_err());
    assert_eq!(store.upload_count(), 0);
    assert!(records.stored_profile().unwrap().profile_pic.is_none());
}

#[tokio::test]
async fn test_no_face_is_rejected() {
    let records = FakeProfileStore::seeded(Some(profile_record(None)), vec![]);
    let session = load(&records).await;
    let verifier = FakeVerifier::no_face();

    session.drop_face(png("wall.png"), &verifier).await.unwrap();
    assert!(session
        .state()
        .face_slot()
        .error()
        .unwrap()
        .contains("clear face"));
}

#[tokio::test]
async fn test_refresh_drops_stale_selection() {
    let records = FakeProfileStore::seeded(Some(profile_record(None)), wardrobe_items());
    let session = load(&records).await;
    session.update(|d| d.toggle("1")).unwrap();

    let fresh = FakeProfileStore::seeded(Some(profile_record(None)), vec![]);
    session.refresh(&fresh).await.unwrap();
    assert!(session.state().selection().is_empty());
}

#[tokio::test]
async fn test_classification_failure_shows_generic_message() {
    let records = FakeProfileStore::seeded(Some(profile_record(None)), vec![]);
    let session = load(&records).await;
    let classifier = FakeClassifier::default().failing("shirt.png", "upstream 503 body");

    session
        .drop_clothing(ClothingCategory::Top, png("shirt.png"), &classifier)
        .await
        .unwrap();

    let state = session.state();
    let error = state.clothing_slot().error().unwrap();
    assert_eq!(error, "Failed to analyze clothing image. Please try again.");
    assert!(!error.contains("503"));
}
