mod helpers;

use std::sync::Arc;

use filestash_core::models::UploadStatus;
use filestash_db::InMemoryTagRepository;
use filestash_services::{AppError, Services};
use helpers::{test_config, upload_request, FlakyFileRepository, FlakyStorage, TEST_TAGS};

struct Fixture {
    services: Services,
    storage: Arc<FlakyStorage>,
    files: Arc<FlakyFileRepository>,
}

fn fixture() -> Fixture {
    let storage = Arc::new(FlakyStorage::new());
    let files = Arc::new(FlakyFileRepository::new());
    let services = Services::assemble(
        &test_config(&[]),
        storage.clone(),
        files.clone(),
        Arc::new(InMemoryTagRepository::with_tags(TEST_TAGS)),
    );
    Fixture {
        services,
        storage,
        files,
    }
}

#[tokio::test]
async fn failed_metadata_save_removes_the_written_object() {
    let fx = fixture();
    fx.files.fail_save(true);

    let id = fx
        .services
        .files
        .upload(upload_request("alice", "a.txt", "payload", &["go"]))
        .await
        .unwrap();

    let mut status = fx.services.files.get_status(id).await;
    for _ in 0..400 {
        if status != UploadStatus::InProgress {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        status = fx.services.files.get_status(id).await;
    }

    assert_eq!(status, UploadStatus::Failed);
    assert!(fx.files.is_empty().await);
    assert!(fx.storage.keys().await.is_empty());
}

#[tokio::test]
async fn rename_metadata_failure_is_reported() {
    let fx = fixture();
    let record = fx
        .services
        .files
        .upload_and_wait(upload_request("alice", "a.txt", "payload", &[]))
        .await
        .unwrap();
    fx.files.fail_save(true);

    let result = fx.services.files.rename(record.id, "b.txt", "alice").await;

    assert!(matches!(result, Err(AppError::RenameFailed(_))));
    // Objects already moved; the record still points at the old name
    assert_eq!(fx.storage.keys().await, vec!["alice/b.txt".to_string()]);
    let persisted = fx.services.files.get(record.id).await.unwrap().unwrap();
    assert_eq!(persisted.filename, "a.txt");
}

#[tokio::test]
async fn upload_and_wait_save_failure_is_upload_failed() {
    let fx = fixture();
    fx.files.fail_save(true);

    let err = fx
        .services
        .files
        .upload_and_wait(upload_request("alice", "a.txt", "payload", &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UploadFailed(_)));
    assert!(fx.storage.keys().await.is_empty());
}
