mod common;

use axum::http::StatusCode;
use common::{build_test_app, create_post, get, post, put};
use serde_json::json;

fn transitions_uri(doc: &serde_json::Value) -> String {
    format!("/api/v1/documents/{}/transitions", doc["id"])
}

#[tokio::test]
async fn submit_approve_publishes_and_exposes_read_path() {
    let app = build_test_app();
    let doc = create_post(&app, "Hello World").await;
    let uri = transitions_uri(&doc);

    // Not visible while still a draft.
    let (status, _) = get(&app, "/api/v1/published/post/hello-world", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = post(
        &app,
        &uri,
        "author",
        json!({ "transition": { "action": "submit" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["status"], "reviewing");

    let (status, json) = post(
        &app,
        &uri,
        "approver",
        json!({ "transition": { "action": "approve" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["status"], "published");
    assert!(json["data"]["published_at"].is_string());

    let (status, json) = get(&app, "/api/v1/published/post/hello-world", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["title"], "Hello World");

    let (status, json) = get(&app, "/api/v1/published/post", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn author_cannot_approve() {
    let app = build_test_app();
    let doc = create_post(&app, "Needs review").await;
    let uri = transitions_uri(&doc);

    post(&app, &uri, "author", json!({ "transition": { "action": "submit" } })).await;
    let (status, json) = post(
        &app,
        &uri,
        "author",
        json!({ "transition": { "action": "approve" } }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "WORKFLOW_ERROR");

    let (_, json) = get(&app, &format!("/api/v1/documents/{}", doc["id"]), Some("author")).await;
    assert_eq!(json["data"]["status"], "reviewing");
}

#[tokio::test]
async fn illegal_transition_is_rejected() {
    let app = build_test_app();
    let doc = create_post(&app, "Fresh").await;
    let (status, json) = post(
        &app,
        &transitions_uri(&doc),
        "admin",
        json!({ "transition": { "action": "approve" } }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "WORKFLOW_ERROR");
}

#[tokio::test]
async fn reject_records_feedback_and_returns_to_draft() {
    let app = build_test_app();
    let doc = create_post(&app, "Rough cut").await;
    let uri = transitions_uri(&doc);

    post(&app, &uri, "author", json!({ "transition": { "action": "submit" } })).await;
    let (status, json) = post(
        &app,
        &uri,
        "approver",
        json!({ "transition": { "action": "reject", "feedback": "Tighten the intro" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["status"], "draft");
    assert_eq!(json["data"]["review_feedback"], "Tighten the intro");
    assert_eq!(json["data"]["reviewer_id"], 7);
}

#[tokio::test]
async fn stale_transition_conflicts() {
    let app = build_test_app();
    let doc = create_post(&app, "Racing").await;
    let doc_uri = format!("/api/v1/documents/{}", doc["id"]);

    put(
        &app,
        &doc_uri,
        "author",
        json!({ "expected_updated_at": doc["updated_at"], "title": "Racing ahead" }),
    )
    .await;

    let (status, json) = post(
        &app,
        &transitions_uri(&doc),
        "author",
        json!({
            "expected_updated_at": doc["updated_at"],
            "transition": { "action": "submit" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONCURRENCY_CONFLICT");
}

#[tokio::test]
async fn author_cannot_edit_under_review() {
    let app = build_test_app();
    let doc = create_post(&app, "Locked").await;
    let (_, json) = post(
        &app,
        &transitions_uri(&doc),
        "author",
        json!({ "transition": { "action": "submit" } }),
    )
    .await;
    let reviewing = &json["data"];

    let (status, json) = put(
        &app,
        &format!("/api/v1/documents/{}", doc["id"]),
        "author",
        json!({ "expected_updated_at": reviewing["updated_at"], "title": "Sneaky" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "WORKFLOW_ERROR");
}

#[tokio::test]
async fn unknown_published_kind_is_bad_request() {
    let app = build_test_app();
    let (status, json) = get(&app, "/api/v1/published/newsletter", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}
