mod common;

use axum::http::StatusCode;
use common::{build_test_app, create_post, get, post, put};
use serde_json::json;

#[tokio::test]
async fn history_restore_and_diff() {
    let app = build_test_app();
    let doc = create_post(&app, "Original").await;
    let id = doc["id"].as_i64().unwrap();
    let doc_uri = format!("/api/v1/documents/{id}");

    let (_, saved) = put(
        &app,
        &doc_uri,
        "author",
        json!({
            "expected_updated_at": doc["updated_at"],
            "title": "Rewritten",
            "blocks": [
                { "id": "b1", "type": "text", "data": { "content": "Hello again" } },
                { "id": "b2", "type": "divider" }
            ]
        }),
    )
    .await;
    let saved = &saved["data"]["document"];

    let (status, json) = get(&app, &format!("{doc_uri}/versions"), Some("author")).await;
    assert_eq!(status, StatusCode::OK);
    let versions = json["data"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    // Newest first.
    assert_eq!(versions[0]["version_number"], 2);
    let first_id = versions[1]["id"].as_i64().unwrap();
    let second_id = versions[0]["id"].as_i64().unwrap();

    let (status, json) = get(
        &app,
        &format!("{doc_uri}/diff?from={first_id}&to={second_id}"),
        Some("author"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["added"], json!(["b2"]));
    assert_eq!(json["data"]["changed"], json!(["b1"]));
    assert_eq!(json["data"]["title_changed"], true);

    let (status, json) = post(
        &app,
        &format!("{doc_uri}/versions/{first_id}/restore"),
        "author",
        json!({ "expected_updated_at": saved["updated_at"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["document"]["title"], "Original");
    assert_eq!(json["data"]["version"]["version_number"], 3);
}

#[tokio::test]
async fn version_of_another_document_is_not_found() {
    let app = build_test_app();
    let a = create_post(&app, "Alpha").await;
    let b = create_post(&app, "Beta").await;

    let (_, json) = get(
        &app,
        &format!("/api/v1/documents/{}/versions", b["id"]),
        Some("author"),
    )
    .await;
    let b_version = json["data"][0]["id"].as_i64().unwrap();

    let (status, _) = get(
        &app,
        &format!("/api/v1/documents/{}/versions/{b_version}", a["id"]),
        Some("author"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
