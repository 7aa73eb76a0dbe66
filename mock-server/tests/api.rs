use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with_db, Db};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn authorized(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, "Basic test-key")
        .body(String::new())
        .unwrap()
}

async fn create(app: &Router, body: &str) -> String {
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/players", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created = body_json(resp).await;
    assert_eq!(created["success"], true);
    created["id"].as_str().unwrap().to_string()
}

async fn fetch(app: &Router, id: &str) -> Value {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/players/{id}"))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// --- create ---

#[tokio::test]
async fn create_player_returns_id() {
    let app = app();
    let id = create(&app, r#"{"app_id":"a1","device_type":1}"#).await;
    assert!(!id.is_empty());
}

#[tokio::test]
async fn create_player_without_app_id_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/players", r#"{"device_type":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["errors"][0], "app_id not found");
}

// --- get ---

#[tokio::test]
async fn get_player_omits_id() {
    let app = app();
    let id = create(&app, r#"{"app_id":"a1","language":"en"}"#).await;
    let player = fetch(&app, &id).await;
    assert!(player.get("id").is_none());
    assert_eq!(player["language"], "en");
    assert_eq!(player["session_count"], 1);
}

#[tokio::test]
async fn get_player_not_found() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/players/does-not-exist")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body, json!({ "errors": ["No user with this id found"] }));
}

// --- update ---

#[tokio::test]
async fn update_player_merges_tags() {
    let app = app();
    let id = create(&app, r#"{"app_id":"a1","tags":{"level":"1","team":"red"}}"#).await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/players/{id}"),
            r#"{"app_id":"a1","tags":{"level":"2","team":""},"amount_spent":"12.50"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "success": true }));

    let player = fetch(&app, &id).await;
    assert_eq!(player["tags"], json!({ "level": "2" }));
    assert_eq!(player["amount_spent"], json!(12.5));
}

#[tokio::test]
async fn update_player_not_found() {
    let resp = app()
        .oneshot(json_request("PUT", "/api/v1/players/nope", r#"{"app_id":"a1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- list ---

#[tokio::test]
async fn list_requires_rest_key() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/players?app_id=a1")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_filters_by_app_and_pages() {
    let db = Db::default();
    let app = app_with_db(db.clone());
    for _ in 0..3 {
        create(&app, r#"{"app_id":"a1"}"#).await;
    }
    create(&app, r#"{"app_id":"other"}"#).await;
    assert_eq!(db.read().await.len(), 4);

    let resp = app
        .clone()
        .oneshot(authorized("GET", "/api/v1/players?app_id=a1&limit=2&offset=1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await;
    assert_eq!(page["total_count"], 3);
    assert_eq!(page["offset"], 1);
    assert_eq!(page["limit"], 2);
    let players = page["players"].as_array().unwrap();
    assert_eq!(players.len(), 2);
    assert!(players.iter().all(|p| p["id"].is_string()));
}

// --- events ---

#[tokio::test]
async fn session_purchase_and_focus_update_counters() {
    let app = app();
    let id = create(&app, r#"{"app_id":"a1"}"#).await;

    for (uri, body) in [
        (format!("/api/v1/players/{id}/on_session"), r#"{"language":"de"}"#),
        (
            format!("/api/v1/players/{id}/on_purchase"),
            r#"{"purchases":[{"sku":"gems","amount":1.5,"iso":"USD"},{"sku":"coins","amount":2.0,"iso":"USD"}]}"#,
        ),
        (
            format!("/api/v1/players/{id}/on_focus"),
            r#"{"state":"ping","active_time":60}"#,
        ),
    ] {
        let resp = app
            .clone()
            .oneshot(json_request("POST", &uri, body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }

    let player = fetch(&app, &id).await;
    assert_eq!(player["session_count"], 2);
    assert_eq!(player["language"], "de");
    assert_eq!(player["amount_spent"], json!(3.5));
    assert_eq!(player["playtime"], 60);
}

#[tokio::test]
async fn on_focus_rejects_unknown_state() {
    let app = app();
    let id = create(&app, r#"{"app_id":"a1"}"#).await;
    let resp = app
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/players/{id}/on_focus"),
            r#"{"state":"start","active_time":1}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- csv export ---

#[tokio::test]
async fn csv_export_returns_file_url() {
    let resp = app()
        .oneshot(authorized("POST", "/api/v1/players/csv_export?app_id=a1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let url = body["csv_file_url"].as_str().unwrap();
    assert!(url.starts_with("https://onesignal.com/csv_exports/a1/"));
}
