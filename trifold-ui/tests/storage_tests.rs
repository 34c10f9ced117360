//! Integration tests for the storage layer
//!
//! Exercises both stores through StoreSet the way the handlers do,
//! including migration between them and validation of hand-written
//! archive files.

use serde_json::json;
use tempfile::TempDir;
use trifold_common::db::init_database;
use trifold_common::model::{
    AiResponse, HistoryItem, Provider, Rating, RatingCategory, StorageBackend,
};
use trifold_common::Error;
use trifold_ui::storage::{migrate, validate_items, ArchiveStore, SqliteStore, StoreSet};

async fn setup_stores() -> (StoreSet, TempDir) {
    let tmp = TempDir::new().unwrap();
    let pool = init_database(&tmp.path().join("trifold.db"))
        .await
        .expect("Should initialize test database");

    let stores = StoreSet::new(
        SqliteStore::new(pool),
        ArchiveStore::new(tmp.path().join("history.json")),
    );
    (stores, tmp)
}

fn rated_item(id: &str) -> HistoryItem {
    let mut item = HistoryItem::new(format!("question {}", id));
    item.id = id.to_string();
    item.responses = Provider::ALL
        .iter()
        .map(|&provider| AiResponse {
            provider,
            model: format!("{}-default", provider),
            text: format!("{} answer", provider),
            latency_ms: 100,
            error: None,
            rating: Rating {
                accuracy: Some(true),
                concise: Some(false),
                ..Rating::default()
            },
        })
        .collect();
    item
}

#[tokio::test]
async fn both_backends_support_the_same_operations() {
    let (stores, _tmp) = setup_stores().await;

    for backend in [StorageBackend::Database, StorageBackend::Archive] {
        let item = rated_item("shared-id");
        stores.upsert(backend, &item).await.unwrap();

        assert!(stores.exists(backend, "shared-id").await.unwrap());
        assert_eq!(stores.count(backend).await.unwrap(), 1);

        let loaded = stores.get(backend, "shared-id").await.unwrap().unwrap();
        assert_eq!(loaded.query, item.query);
        assert_eq!(loaded.responses.len(), 3);
        assert_eq!(loaded.responses[0].rating.accuracy, Some(true));

        stores
            .set_rating(backend, "shared-id", 2, RatingCategory::Relevance, Some(true))
            .await
            .unwrap();
        let loaded = stores.get(backend, "shared-id").await.unwrap().unwrap();
        assert_eq!(loaded.responses[2].rating.relevance, Some(true));

        assert!(stores.delete(backend, "shared-id").await.unwrap());
        assert_eq!(stores.count(backend).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn set_rating_errors_match_across_backends() {
    let (stores, _tmp) = setup_stores().await;

    for backend in [StorageBackend::Database, StorageBackend::Archive] {
        stores.upsert(backend, &rated_item("present")).await.unwrap();

        let missing = stores
            .set_rating(backend, "missing", 0, RatingCategory::Accuracy, Some(true))
            .await;
        assert!(matches!(missing, Err(Error::NotFound(_))));

        let bad_index = stores
            .set_rating(backend, "present", 3, RatingCategory::Accuracy, Some(true))
            .await;
        assert!(matches!(bad_index, Err(Error::InvalidInput(_))));
    }
}

#[tokio::test]
async fn migrate_database_to_archive_preserves_ratings() {
    let (stores, _tmp) = setup_stores().await;

    stores
        .upsert(StorageBackend::Database, &rated_item("a"))
        .await
        .unwrap();
    stores
        .upsert(StorageBackend::Database, &rated_item("b"))
        .await
        .unwrap();

    let report = migrate(&stores, StorageBackend::Database, StorageBackend::Archive)
        .await
        .unwrap();
    assert_eq!(report.migrated, 2);

    // Source intact
    assert_eq!(stores.count(StorageBackend::Database).await.unwrap(), 2);

    // Destination carries the full item, ratings included
    let copied = stores
        .get(StorageBackend::Archive, "a")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(copied.responses[1].rating.accuracy, Some(true));
    assert_eq!(copied.responses[1].rating.concise, Some(false));
}

#[tokio::test]
async fn migrate_archive_to_database_converges_by_id() {
    let (stores, _tmp) = setup_stores().await;

    let mut item = rated_item("same-id");
    item.query = "archive version".to_string();
    stores.upsert(StorageBackend::Archive, &item).await.unwrap();

    let mut stale = rated_item("same-id");
    stale.query = "stale database version".to_string();
    stores.upsert(StorageBackend::Database, &stale).await.unwrap();

    migrate(&stores, StorageBackend::Archive, StorageBackend::Database)
        .await
        .unwrap();

    // Existing destination item was replaced, not duplicated
    assert_eq!(stores.count(StorageBackend::Database).await.unwrap(), 1);
    let merged = stores
        .get(StorageBackend::Database, "same-id")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(merged.query, "archive version");

    // Running it again changes nothing
    let report = migrate(&stores, StorageBackend::Archive, StorageBackend::Database)
        .await
        .unwrap();
    assert_eq!(report.migrated, 1);
    assert_eq!(stores.count(StorageBackend::Database).await.unwrap(), 1);
}

#[tokio::test]
async fn migrate_same_backend_is_rejected() {
    let (stores, _tmp) = setup_stores().await;

    let result = migrate(&stores, StorageBackend::Database, StorageBackend::Database).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn hand_written_archive_file_is_readable() {
    let (stores, tmp) = setup_stores().await;

    // The archive is the localStorage analog: users may import a file
    // produced elsewhere
    let content = json!({
        "version": 1,
        "items": [
            {
                "id": "imported",
                "query": "from another machine",
                "created_at": "2026-08-20T12:00:00Z",
                "responses": [
                    {
                        "provider": "anthropic",
                        "model": "claude-3-5-haiku-latest",
                        "text": "carried over",
                        "latency_ms": 321,
                        "rating": {"accuracy": true}
                    }
                ]
            }
        ]
    });
    std::fs::write(tmp.path().join("history.json"), content.to_string()).unwrap();

    let items = stores.list(StorageBackend::Archive).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "imported");
    assert_eq!(items[0].responses[0].provider, Provider::Anthropic);
    assert_eq!(items[0].responses[0].rating.accuracy, Some(true));
    assert_eq!(items[0].responses[0].rating.unbiased, None);
}

#[tokio::test]
async fn validation_flags_problems_in_imported_archive() {
    let (stores, tmp) = setup_stores().await;

    // Duplicate ids and a response missing both text and error
    let content = json!({
        "version": 1,
        "items": [
            {
                "id": "dup",
                "query": "fine",
                "created_at": "2026-08-20T12:00:00Z",
                "responses": [
                    {"provider": "openai", "model": "gpt-4o-mini", "text": "ok", "latency_ms": 10}
                ]
            },
            {
                "id": "dup",
                "query": "",
                "created_at": "2026-08-20T12:00:00Z",
                "responses": [
                    {"provider": "gemini", "model": "gemini-2.0-flash", "latency_ms": 10}
                ]
            }
        ]
    });
    std::fs::write(tmp.path().join("history.json"), content.to_string()).unwrap();

    let items = stores.list(StorageBackend::Archive).await.unwrap();
    let report = validate_items(StorageBackend::Archive, &items);

    assert!(!report.ok);
    assert_eq!(report.checked, 2);
    let messages: Vec<&str> = report.issues.iter().map(|i| i.message.as_str()).collect();
    assert!(messages.contains(&"duplicate id"));
    assert!(messages.contains(&"empty query"));
    assert!(messages.contains(&"response 0 has neither text nor error"));
}

#[tokio::test]
async fn clearing_one_backend_leaves_the_other_alone() {
    let (stores, _tmp) = setup_stores().await;

    stores
        .upsert(StorageBackend::Database, &rated_item("db-item"))
        .await
        .unwrap();
    stores
        .upsert(StorageBackend::Archive, &rated_item("archive-item"))
        .await
        .unwrap();

    stores.clear(StorageBackend::Archive).await.unwrap();

    assert_eq!(stores.count(StorageBackend::Archive).await.unwrap(), 0);
    assert_eq!(stores.count(StorageBackend::Database).await.unwrap(), 1);
}
