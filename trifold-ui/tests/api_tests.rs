//! Integration tests for the trifold-ui HTTP API
//!
//! Requests are driven through the router with tower's oneshot, so no
//! listener is needed. Provider endpoints are only exercised on their
//! validation paths; nothing here talks to a real provider.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;
use trifold_common::config::ProvidersConfig;
use trifold_ui::providers::ProviderSet;
use trifold_ui::storage::{ArchiveStore, SqliteStore, StoreSet};
use trifold_ui::{build_router, AppState};

/// Build an app over a throwaway root folder
async fn setup_app() -> (Router, TempDir) {
    let tmp = TempDir::new().unwrap();

    let pool = trifold_common::db::init_database(&tmp.path().join("trifold.db"))
        .await
        .expect("Should initialize test database");

    let stores = StoreSet::new(
        SqliteStore::new(pool.clone()),
        ArchiveStore::new(tmp.path().join("history.json")),
    );
    let providers = ProviderSet::new(&ProvidersConfig::default(), Duration::from_secs(5))
        .expect("Should build provider set");

    let state = AppState::new(pool, stores, providers);
    (build_router(state), tmp)
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("Response should be valid JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = extract_json(response.into_body()).await;
    (status, body)
}

fn sample_save_body(query: &str) -> Value {
    json!({
        "query": query,
        "responses": [
            {
                "provider": "openai",
                "model": "gpt-4o-mini",
                "text": "first answer",
                "latency_ms": 120
            },
            {
                "provider": "anthropic",
                "model": "claude-3-5-haiku-latest",
                "text": "second answer",
                "latency_ms": 340
            },
            {
                "provider": "gemini",
                "model": "gemini-2.0-flash",
                "text": "",
                "latency_ms": 5000,
                "error": "timed out"
            }
        ]
    })
}

// ---- service endpoints ----

#[tokio::test]
async fn health_returns_module_identity() {
    let (app, _tmp) = setup_app().await;

    let (status, body) = send(&app, test_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "trifold-ui");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn buildinfo_reports_compile_time_values() {
    let (app, _tmp) = setup_app().await;

    let (status, body) = send(&app, test_request("GET", "/api/buildinfo")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());
    assert!(body["git_hash"].is_string());
    assert!(body["build_timestamp"].is_string());
    assert!(body["build_profile"].is_string());
}

#[tokio::test]
async fn index_page_is_served() {
    let (app, _tmp) = setup_app().await;

    let response = app.clone().oneshot(test_request("GET", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("<html"));
    assert!(html.contains("Trifold"));
}

#[tokio::test]
async fn static_assets_have_content_types() {
    let (app, _tmp) = setup_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/static/app.js"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/javascript"
    );

    let response = app
        .clone()
        .oneshot(test_request("GET", "/static/style.css"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/css");
}

#[tokio::test]
async fn providers_are_listed_in_fixed_order() {
    let (app, _tmp) = setup_app().await;

    let (status, body) = send(&app, test_request("GET", "/api/providers")).await;
    assert_eq!(status, StatusCode::OK);

    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["id"], "openai");
    assert_eq!(entries[1]["id"], "anthropic");
    assert_eq!(entries[2]["id"], "gemini");
    for entry in entries {
        assert!(entry["model"].is_string());
        assert!(entry["configured"].is_boolean());
    }
}

// ---- ask validation ----

#[tokio::test]
async fn ask_rejects_unknown_provider() {
    let (app, _tmp) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/ask", &json!({"model": "mistral", "query": "hi"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("unknown provider"));
}

#[tokio::test]
async fn ask_rejects_empty_query() {
    let (app, _tmp) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/ask", &json!({"model": "openai", "query": "   "})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn ask_all_rejects_empty_query() {
    let (app, _tmp) = setup_app().await;

    let (status, _body) = send(
        &app,
        json_request("POST", "/api/ask/all", &json!({"query": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_body_is_a_400_not_422() {
    let (app, _tmp) = setup_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/ask")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn missing_body_field_is_a_400() {
    let (app, _tmp) = setup_app().await;

    let (status, body) = send(&app, json_request("POST", "/api/ask", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// ---- history CRUD ----

#[tokio::test]
async fn history_crud_roundtrip() {
    let (app, _tmp) = setup_app().await;

    // Create
    let (status, created) = send(
        &app,
        json_request("POST", "/api/history", &sample_save_body("what is rust?")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert!(created["created_at"].is_string());
    assert_eq!(created["responses"].as_array().unwrap().len(), 3);

    // Read one
    let (status, fetched) = send(&app, test_request("GET", &format!("/api/history?id={}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["query"], "what is rust?");
    assert_eq!(fetched["responses"][2]["error"], "timed out");

    // Read all
    let (status, all) = send(&app, test_request("GET", "/api/history/all")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    // Replace
    let mut replacement = fetched.clone();
    replacement["query"] = json!("what is rust, really?");
    let (status, updated) = send(&app, json_request("PUT", "/api/history", &replacement)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["query"], "what is rust, really?");

    let (_, fetched) = send(&app, test_request("GET", &format!("/api/history?id={}", id))).await;
    assert_eq!(fetched["query"], "what is rust, really?");

    // Delete
    let (status, ack) = send(
        &app,
        test_request("DELETE", &format!("/api/history?id={}", id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], true);

    let (status, _) = send(&app, test_request("GET", &format!("/api/history?id={}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_accepts_client_supplied_id() {
    let (app, _tmp) = setup_app().await;

    let mut body = sample_save_body("client id");
    body["id"] = json!("my-own-id");

    let (status, created) = send(&app, json_request("POST", "/api/history", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["id"], "my-own-id");
}

#[tokio::test]
async fn create_rejects_duplicate_id() {
    let (app, _tmp) = setup_app().await;

    let mut body = sample_save_body("first");
    body["id"] = json!("dup");
    let (status, _) = send(&app, json_request("POST", "/api/history", &body)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = send(&app, json_request("POST", "/api/history", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"]["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));
}

#[tokio::test]
async fn create_rejects_structural_problems() {
    let (app, _tmp) = setup_app().await;

    // Empty query
    let (status, _) = send(
        &app,
        json_request("POST", "/api/history", &json!({"query": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // More responses than providers
    let mut body = sample_save_body("too many");
    let extra = body["responses"][0].clone();
    body["responses"].as_array_mut().unwrap().push(extra);
    let (status, _) = send(&app, json_request("POST", "/api/history", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Blank explicit id
    let mut body = sample_save_body("blank id");
    body["id"] = json!("  ");
    let (status, _) = send(&app, json_request("POST", "/api/history", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_and_delete_require_id_parameter() {
    let (app, _tmp) = setup_app().await;

    let (status, _) = send(&app, test_request("GET", "/api/history")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, test_request("DELETE", "/api/history")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_ids_are_404() {
    let (app, _tmp) = setup_app().await;

    let (status, body) = send(&app, test_request("GET", "/api/history?id=ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app, test_request("DELETE", "/api/history?id=ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut body = sample_save_body("never saved");
    body["id"] = json!("ghost");
    body["created_at"] = json!("2026-08-25T10:00:00Z");
    let (status, _) = send(&app, json_request("PUT", "/api/history", &body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_all_clears_active_backend() {
    let (app, _tmp) = setup_app().await;

    for query in ["one", "two"] {
        let (status, _) = send(
            &app,
            json_request("POST", "/api/history", &sample_save_body(query)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = send(&app, test_request("DELETE", "/api/history/all")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, all) = send(&app, test_request("GET", "/api/history/all")).await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn history_all_is_ordered_newest_first() {
    let (app, _tmp) = setup_app().await;

    let mut older = sample_save_body("older");
    older["id"] = json!("older");
    older["created_at"] = json!("2026-08-20T10:00:00Z");
    let mut newer = sample_save_body("newer");
    newer["id"] = json!("newer");
    newer["created_at"] = json!("2026-08-24T10:00:00Z");

    send(&app, json_request("POST", "/api/history", &older)).await;
    send(&app, json_request("POST", "/api/history", &newer)).await;

    let (_, all) = send(&app, test_request("GET", "/api/history/all")).await;
    let items = all.as_array().unwrap();
    assert_eq!(items[0]["id"], "newer");
    assert_eq!(items[1]["id"], "older");
}

// ---- backend targeting ----

#[tokio::test]
async fn backend_parameter_targets_one_store() {
    let (app, tmp) = setup_app().await;

    let (status, created) = send(
        &app,
        json_request(
            "POST",
            "/api/history?backend=archive",
            &sample_save_body("archived question"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_str().unwrap().to_string();

    // Present in the archive, absent from the database
    let (_, archived) = send(
        &app,
        test_request("GET", "/api/history/all?backend=archive"),
    )
    .await;
    assert_eq!(archived.as_array().unwrap().len(), 1);

    let (_, database) = send(
        &app,
        test_request("GET", "/api/history/all?backend=database"),
    )
    .await;
    assert!(database.as_array().unwrap().is_empty());

    assert!(tmp.path().join("history.json").exists());

    let (status, _) = send(
        &app,
        test_request("GET", &format!("/api/history?id={}&backend=archive", id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_backend_parameter_is_a_400_with_error_body() {
    let (app, _tmp) = setup_app().await;

    let (status, body) = send(&app, test_request("GET", "/api/history/all?backend=cloud")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].as_str().unwrap().contains("cloud"));

    // Storage routes share the same envelope
    let (status, body) = send(&app, test_request("DELETE", "/api/storage?backend=cloud")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// ---- ratings ----

#[tokio::test]
async fn rating_flow_set_and_reset() {
    let (app, _tmp) = setup_app().await;

    let mut body = sample_save_body("rate me");
    body["id"] = json!("rated");
    send(&app, json_request("POST", "/api/history", &body)).await;

    // Thumbs-up accuracy on the second response
    let (status, ack) = send(
        &app,
        json_request(
            "PUT",
            "/api/history/rating",
            &json!({"id": "rated", "response_index": 1, "category": "accuracy", "value": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["success"], true);

    let (_, item) = send(&app, test_request("GET", "/api/history?id=rated")).await;
    assert_eq!(item["responses"][1]["rating"]["accuracy"], true);
    assert_eq!(item["responses"][0]["rating"]["accuracy"], Value::Null);

    // Null resets the category to unknown
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/history/rating",
            &json!({"id": "rated", "response_index": 1, "category": "accuracy", "value": null}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, item) = send(&app, test_request("GET", "/api/history?id=rated")).await;
    assert_eq!(item["responses"][1]["rating"]["accuracy"], Value::Null);
}

#[tokio::test]
async fn rating_rejects_unknown_category() {
    let (app, _tmp) = setup_app().await;

    let mut body = sample_save_body("rate me");
    body["id"] = json!("rated");
    send(&app, json_request("POST", "/api/history", &body)).await;

    let (status, error) = send(
        &app,
        json_request(
            "PUT",
            "/api/history/rating",
            &json!({"id": "rated", "response_index": 0, "category": "vibes", "value": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"]["message"]
        .as_str()
        .unwrap()
        .contains("unknown rating category"));
}

#[tokio::test]
async fn rating_index_out_of_range_is_a_400() {
    let (app, _tmp) = setup_app().await;

    let mut body = sample_save_body("rate me");
    body["id"] = json!("rated");
    send(&app, json_request("POST", "/api/history", &body)).await;

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/history/rating",
            &json!({"id": "rated", "response_index": 7, "category": "concise", "value": false}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rating_unknown_item_is_a_404() {
    let (app, _tmp) = setup_app().await;

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/history/rating",
            &json!({"id": "ghost", "response_index": 0, "category": "concise", "value": false}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---- storage management ----

#[tokio::test]
async fn storage_status_reports_counts_and_active_backend() {
    let (app, _tmp) = setup_app().await;

    let (status, body) = send(&app, test_request("GET", "/api/storage")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], "database");
    assert_eq!(body["database_items"], 0);
    assert_eq!(body["archive_items"], 0);
    assert!(body["archive_path"].as_str().unwrap().ends_with("history.json"));
}

#[tokio::test]
async fn switching_backend_redirects_new_history() {
    let (app, _tmp) = setup_app().await;

    let (status, _) = send(
        &app,
        json_request("PUT", "/api/storage", &json!({"backend": "archive"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, storage) = send(&app, test_request("GET", "/api/storage")).await;
    assert_eq!(storage["active"], "archive");

    // No backend parameter: the persisted selection applies
    send(
        &app,
        json_request("POST", "/api/history", &sample_save_body("goes to archive")),
    )
    .await;

    let (_, archived) = send(
        &app,
        test_request("GET", "/api/history/all?backend=archive"),
    )
    .await;
    assert_eq!(archived.as_array().unwrap().len(), 1);

    let (_, database) = send(
        &app,
        test_request("GET", "/api/history/all?backend=database"),
    )
    .await;
    assert!(database.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn migrate_copies_between_backends() {
    let (app, _tmp) = setup_app().await;

    for query in ["one", "two"] {
        send(
            &app,
            json_request("POST", "/api/history", &sample_save_body(query)),
        )
        .await;
    }

    let (status, report) = send(
        &app,
        json_request(
            "POST",
            "/api/storage/migrate",
            &json!({"from": "database", "to": "archive"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["migrated"], 2);
    assert_eq!(report["from"], "database");
    assert_eq!(report["to"], "archive");

    // Source intact, destination populated
    let (_, storage) = send(&app, test_request("GET", "/api/storage")).await;
    assert_eq!(storage["database_items"], 2);
    assert_eq!(storage["archive_items"], 2);
}

#[tokio::test]
async fn migrate_rejects_same_backend() {
    let (app, _tmp) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/storage/migrate",
            &json!({"from": "archive", "to": "archive"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn validate_reports_clean_store() {
    let (app, _tmp) = setup_app().await;

    send(
        &app,
        json_request("POST", "/api/history", &sample_save_body("check me")),
    )
    .await;

    let (status, report) = send(&app, test_request("GET", "/api/storage/validate")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["backend"], "database");
    assert_eq!(report["checked"], 1);
    assert_eq!(report["ok"], true);

    let (status, report) = send(
        &app,
        test_request("GET", "/api/storage/validate?backend=archive"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["backend"], "archive");
    assert_eq!(report["checked"], 0);
}

#[tokio::test]
async fn wipe_requires_explicit_backend() {
    let (app, _tmp) = setup_app().await;

    let (status, _) = send(&app, test_request("DELETE", "/api/storage")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(
        &app,
        json_request("POST", "/api/history", &sample_save_body("doomed")),
    )
    .await;

    let (status, _) = send(&app, test_request("DELETE", "/api/storage?backend=database")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, storage) = send(&app, test_request("GET", "/api/storage")).await;
    assert_eq!(storage["database_items"], 0);
}
