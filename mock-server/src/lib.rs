use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

/// Largest page the list endpoint returns.
pub const MAX_PAGE_SIZE: usize = 300;

/// Stored player: the provider-facing JSON fields plus the owning `app_id`.
#[derive(Clone, Debug)]
pub struct StoredPlayer {
    pub app_id: String,
    pub fields: Map<String, Value>,
}

pub type Db = Arc<RwLock<HashMap<String, StoredPlayer>>>;

type ApiError = (StatusCode, Json<Value>);

pub fn app() -> Router {
    app_with_db(Db::default())
}

/// Build the router over an existing store so tests can seed or inspect it.
pub fn app_with_db(db: Db) -> Router {
    let players = Router::new()
        .route("/players", get(list_players).post(create_player))
        .route("/players/csv_export", post(csv_export))
        .route("/players/{id}", get(get_player).put(update_player))
        .route("/players/{id}/on_session", post(on_session))
        .route("/players/{id}/on_purchase", post(on_purchase))
        .route("/players/{id}/on_focus", post(on_focus));
    Router::new().nest("/api/v1", players).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn errors(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "errors": [message] })))
}

fn not_found() -> ApiError {
    errors(StatusCode::NOT_FOUND, "No user with this id found")
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

fn require_rest_key(headers: &HeaderMap) -> Result<(), ApiError> {
    let authorized = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Basic ") && value.len() > "Basic ".len());
    if authorized {
        Ok(())
    } else {
        Err(errors(
            StatusCode::BAD_REQUEST,
            "Please include a case-sensitive header of Authorization: Basic <YOUR-REST-API-KEY-HERE>",
        ))
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or_default(),
        Value::String(text) => text.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

/// Apply request fields to a stored record. Tags merge key by key and an
/// empty tag value deletes the tag.
fn merge_fields(target: &mut Map<String, Value>, input: Map<String, Value>) {
    for (key, value) in input {
        match key.as_str() {
            "app_id" => {}
            "amount_spent" => {
                target.insert(key, json!(as_f64(&value)));
            }
            "tags" => {
                let tags = target
                    .entry("tags")
                    .or_insert_with(|| Value::Object(Map::new()));
                if let (Value::Object(existing), Value::Object(updates)) = (tags, value) {
                    for (tag, tag_value) in updates {
                        if tag_value.as_str() == Some("") {
                            existing.remove(&tag);
                        } else {
                            existing.insert(tag, tag_value);
                        }
                    }
                }
            }
            _ => {
                target.insert(key, value);
            }
        }
    }
}

fn increment(target: &mut Map<String, Value>, key: &str, by: i64) {
    let current = target.get(key).and_then(Value::as_i64).unwrap_or_default();
    target.insert(key.to_string(), json!(current + by));
}

async fn create_player(
    State(db): State<Db>,
    Json(input): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let app_id = match input.get("app_id").and_then(Value::as_str) {
        Some(app_id) if !app_id.is_empty() => app_id.to_string(),
        _ => return Err(errors(StatusCode::BAD_REQUEST, "app_id not found")),
    };

    let timestamp = now();
    let mut fields = Map::new();
    fields.insert("device_type".to_string(), json!(0));
    fields.insert("session_count".to_string(), json!(1));
    fields.insert("playtime".to_string(), json!(0));
    fields.insert("badge_count".to_string(), json!(0));
    fields.insert("amount_spent".to_string(), json!(0.0));
    fields.insert("created_at".to_string(), json!(timestamp));
    fields.insert("last_active".to_string(), json!(timestamp));
    fields.insert("invalid_identifier".to_string(), json!(false));
    fields.insert("tags".to_string(), json!({}));
    merge_fields(&mut fields, input);

    let id = Uuid::new_v4().to_string();
    db.write()
        .await
        .insert(id.clone(), StoredPlayer { app_id, fields });
    debug!(%id, "created player");
    Ok(Json(json!({ "success": true, "id": id })))
}

/// Mirrors the provider: the body of a single-player fetch carries no `id`.
async fn get_player(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let players = db.read().await;
    let player = players.get(&id).ok_or_else(not_found)?;
    Ok(Json(Value::Object(player.fields.clone())))
}

async fn update_player(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let mut players = db.write().await;
    let player = players.get_mut(&id).ok_or_else(not_found)?;
    merge_fields(&mut player.fields, input);
    Ok(success())
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub app_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

async fn list_players(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    require_rest_key(&headers)?;
    let app_id = params
        .app_id
        .filter(|app_id| !app_id.is_empty())
        .ok_or_else(|| errors(StatusCode::BAD_REQUEST, "app_id not found"))?;
    let limit = params.limit.unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or_default();

    let players = db.read().await;
    let mut matching: Vec<(&String, &StoredPlayer)> = players
        .iter()
        .filter(|(_, player)| player.app_id == app_id)
        .collect();
    matching.sort_by(|(a, _), (b, _)| a.cmp(b));

    let page: Vec<Value> = matching
        .iter()
        .skip(offset)
        .take(limit)
        .map(|(id, player)| {
            let mut fields = player.fields.clone();
            fields.insert("id".to_string(), json!(id));
            Value::Object(fields)
        })
        .collect();

    Ok(Json(json!({
        "total_count": matching.len(),
        "offset": offset,
        "limit": limit,
        "players": page,
    })))
}

async fn on_session(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let mut players = db.write().await;
    let player = players.get_mut(&id).ok_or_else(not_found)?;
    merge_fields(&mut player.fields, input);
    increment(&mut player.fields, "session_count", 1);
    player
        .fields
        .insert("last_active".to_string(), json!(now()));
    Ok(success())
}

#[derive(Debug, Deserialize)]
pub struct PurchaseInput {
    pub sku: String,
    pub amount: f64,
    pub iso: String,
}

#[derive(Debug, Deserialize)]
pub struct OnPurchaseInput {
    pub purchases: Vec<PurchaseInput>,
    #[serde(default)]
    pub existing: bool,
}

async fn on_purchase(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<OnPurchaseInput>,
) -> Result<Json<Value>, ApiError> {
    if input.purchases.iter().any(|p| p.sku.is_empty() || p.iso.is_empty()) {
        return Err(errors(StatusCode::BAD_REQUEST, "purchases require sku and iso"));
    }
    let mut players = db.write().await;
    let player = players.get_mut(&id).ok_or_else(not_found)?;
    let spent = player.fields.get("amount_spent").map(as_f64).unwrap_or_default();
    let added: f64 = input.purchases.iter().map(|p| p.amount).sum();
    player
        .fields
        .insert("amount_spent".to_string(), json!(spent + added));
    debug!(%id, existing = input.existing, added, "recorded purchases");
    Ok(success())
}

#[derive(Debug, Deserialize)]
pub struct OnFocusInput {
    pub state: String,
    pub active_time: i64,
}

async fn on_focus(
    State(db): State<Db>,
    Path(id): Path<String>,
    Json(input): Json<OnFocusInput>,
) -> Result<Json<Value>, ApiError> {
    if input.state != "ping" {
        return Err(errors(StatusCode::BAD_REQUEST, "state must be ping"));
    }
    let mut players = db.write().await;
    let player = players.get_mut(&id).ok_or_else(not_found)?;
    increment(&mut player.fields, "playtime", input.active_time);
    Ok(success())
}

#[derive(Debug, Deserialize)]
pub struct CsvExportParams {
    pub app_id: Option<String>,
}

async fn csv_export(
    headers: HeaderMap,
    Query(params): Query<CsvExportParams>,
) -> Result<Json<Value>, ApiError> {
    require_rest_key(&headers)?;
    let app_id = params
        .app_id
        .filter(|app_id| !app_id.is_empty())
        .ok_or_else(|| errors(StatusCode::BAD_REQUEST, "app_id not found"))?;
    let url = format!(
        "https://onesignal.com/csv_exports/{app_id}/users_{}.csv.gz",
        Uuid::new_v4().simple()
    );
    Ok(Json(json!({ "csv_file_url": url })))
}
