//! Wire schema of the OneSignal players resource.
//!
//! # Design
//! Read models (`Player` and the response wrappers) decode permissively:
//! unknown keys are ignored, and missing keys or JSON `null` fall back to the
//! field's default, because the provider omits and adds fields freely.
//! Write models use an explicit `Option` per optional field and skip `None`
//! on serialization. A field set to `Some(0)`, `Some(false)` or `Some("")`
//! is still emitted; only absent fields are left out.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Device platform code used by OneSignal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum DeviceType {
    #[default]
    Ios,
    Android,
    Amazon,
    WindowsPhone,
    ChromeApp,
    ChromeWeb,
    Windows,
    Safari,
    Firefox,
    MacOs,
    Alexa,
    Email,
    Huawei,
    Sms,
    /// A code this crate does not know about yet.
    Other(i32),
}

impl From<i32> for DeviceType {
    fn from(code: i32) -> Self {
        match code {
            0 => DeviceType::Ios,
            1 => DeviceType::Android,
            2 => DeviceType::Amazon,
            3 => DeviceType::WindowsPhone,
            4 => DeviceType::ChromeApp,
            5 => DeviceType::ChromeWeb,
            6 => DeviceType::Windows,
            7 => DeviceType::Safari,
            8 => DeviceType::Firefox,
            9 => DeviceType::MacOs,
            10 => DeviceType::Alexa,
            11 => DeviceType::Email,
            13 => DeviceType::Huawei,
            14 => DeviceType::Sms,
            other => DeviceType::Other(other),
        }
    }
}

impl From<DeviceType> for i32 {
    fn from(device_type: DeviceType) -> Self {
        match device_type {
            DeviceType::Ios => 0,
            DeviceType::Android => 1,
            DeviceType::Amazon => 2,
            DeviceType::WindowsPhone => 3,
            DeviceType::ChromeApp => 4,
            DeviceType::ChromeWeb => 5,
            DeviceType::Windows => 6,
            DeviceType::Safari => 7,
            DeviceType::Firefox => 8,
            DeviceType::MacOs => 9,
            DeviceType::Alexa => 10,
            DeviceType::Email => 11,
            DeviceType::Huawei => 13,
            DeviceType::Sms => 14,
            DeviceType::Other(code) => code,
        }
    }
}

/// A player (device or session endpoint) as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub identifier: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub session_count: i64,
    pub language: Option<String>,
    /// Offset from UTC in seconds.
    #[serde(deserialize_with = "null_as_default")]
    pub timezone: i64,
    pub game_version: Option<String>,
    pub device_os: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub device_type: DeviceType,
    pub device_model: Option<String>,
    pub ad_id: Option<String>,
    pub sdk: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: HashMap<String, String>,
    /// Seconds of active use.
    #[serde(deserialize_with = "null_as_default")]
    pub playtime: i64,
    /// Unix timestamp.
    #[serde(deserialize_with = "null_as_default")]
    pub last_active: i64,
    /// Unix timestamp.
    #[serde(deserialize_with = "null_as_default")]
    pub created_at: i64,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount_spent: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub invalid_identifier: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub badge_count: i64,
}

/// Payload for creating or updating a player.
///
/// Only `app_id` is required. `amount_spent` is a string on the wire and is
/// sent exactly as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRequest {
    pub app_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_spent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playtime: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active: Option<i64>,
    /// 1 = development, 2 = ad-hoc (iOS test builds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_type: Option<i32>,
    /// 1 = subscribed, -2 = unsubscribed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_types: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl PlayerRequest {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Self::default()
        }
    }
}

/// Query parameters for listing players. Returns one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerListOptions {
    pub app_id: String,
    /// Page size; the provider caps it at 300.
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerListResponse {
    pub total_count: u64,
    pub offset: u64,
    pub limit: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerCreateResponse {
    pub success: bool,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerOnSessionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerOnPurchaseOptions {
    pub purchases: Vec<Purchase>,
    /// Set when reporting purchases made before the SDK was installed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub sku: String,
    pub amount: f64,
    /// ISO 4217 currency code.
    #[serde(rename = "iso")]
    pub iso_currency: String,
}

/// Session activity report. The provider only accepts `state: "ping"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerOnFocusOptions {
    pub state: String,
    /// Seconds of activity since the last report.
    pub active_time: i64,
}

impl PlayerOnFocusOptions {
    pub fn ping(active_time: i64) -> Self {
        Self {
            state: "ping".to_string(),
            active_time,
        }
    }
}

/// Options for requesting a CSV export of every player of an app.
///
/// `app_id` travels in the query string, the rest in the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCsvExportOptions {
    #[serde(skip)]
    pub app_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_fields: Option<Vec<String>>,
    /// Unix timestamp, as a string on the wire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerCsvExportResponse {
    pub csv_file_url: String,
}

/// Generic `{"success": ...}` reply. Any other top-level keys are kept in
/// `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The provider's error envelope, `{"errors": [...]}` or
/// `{"errors": {"field": [...]}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    errors: serde_json::Value,
}

impl ErrorResponse {
    pub(crate) fn into_messages(self) -> Vec<String> {
        let mut messages = Vec::new();
        collect_messages(self.errors, &mut messages);
        messages
    }
}

fn collect_messages(value: serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Null => {}
        serde_json::Value::String(message) => out.push(message),
        serde_json::Value::Array(items) => {
            for item in items {
                collect_messages(item, out);
            }
        }
        serde_json::Value::Object(fields) => {
            for (key, value) in fields {
                let mut nested = Vec::new();
                collect_messages(value, &mut nested);
                if nested.is_empty() {
                    out.push(key);
                } else {
                    out.extend(nested.into_iter().map(|message| format!("{key}: {message}")));
                }
            }
        }
        other => out.push(other.to_string()),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a JSON number, a numeric string, or `null`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(NumberOrString::Number(value)) => Ok(value),
        Some(NumberOrString::String(text)) if text.trim().is_empty() => Ok(0.0),
        Some(NumberOrString::String(text)) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_with_only_app_id_has_one_key() {
        let body = serde_json::to_value(PlayerRequest::new("a1")).unwrap();
        assert_eq!(body, json!({ "app_id": "a1" }));
    }

    #[test]
    fn explicit_zero_values_are_emitted() {
        let request = PlayerRequest {
            session_count: Some(0),
            language: Some(String::new()),
            badge_count: Some(0),
            device_type: Some(DeviceType::Ios),
            ..PlayerRequest::new("a1")
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "app_id": "a1",
                "session_count": 0,
                "language": "",
                "badge_count": 0,
                "device_type": 0
            })
        );
    }

    #[test]
    fn amount_spent_is_sent_as_string() {
        let request = PlayerRequest {
            amount_spent: Some("12.50".to_string()),
            ..PlayerRequest::new("a1")
        };
        let body = serde_json::to_string(&request).unwrap();
        assert!(body.contains(r#""amount_spent":"12.50""#), "{body}");
    }

    #[test]
    fn player_decodes_partial_body() {
        let player: Player = serde_json::from_str(r#"{"id":"X","playtime":5}"#).unwrap();
        assert_eq!(player.id, "X");
        assert_eq!(player.playtime, 5);
        assert!(player.tags.is_empty());
        assert!(player.identifier.is_none());
    }

    #[test]
    fn player_decodes_nulls_and_unknown_fields() {
        let body = r#"{
            "identifier": null,
            "session_count": 3,
            "tags": null,
            "amount_spent": null,
            "badge_count": null,
            "external_user_id": "u-1",
            "device_type": 1
        }"#;
        let player: Player = serde_json::from_str(body).unwrap();
        assert_eq!(player.id, "");
        assert_eq!(player.session_count, 3);
        assert!(player.tags.is_empty());
        assert_eq!(player.amount_spent, 0.0);
        assert_eq!(player.badge_count, 0);
        assert_eq!(player.device_type, DeviceType::Android);
    }

    #[test]
    fn player_amount_spent_accepts_numeric_string() {
        let player: Player = serde_json::from_str(r#"{"amount_spent":"12.5"}"#).unwrap();
        assert_eq!(player.amount_spent, 12.5);
        let player: Player = serde_json::from_str(r#"{"amount_spent":3}"#).unwrap();
        assert_eq!(player.amount_spent, 3.0);
        assert!(serde_json::from_str::<Player>(r#"{"amount_spent":"lots"}"#).is_err());
    }

    #[test]
    fn unknown_device_type_round_trips() {
        let device: DeviceType = serde_json::from_str("42").unwrap();
        assert_eq!(device, DeviceType::Other(42));
        assert_eq!(serde_json::to_string(&device).unwrap(), "42");
        assert_eq!(serde_json::to_string(&DeviceType::Sms).unwrap(), "14");
    }

    #[test]
    fn purchase_uses_iso_key() {
        let options = PlayerOnPurchaseOptions {
            purchases: vec![Purchase {
                sku: "gems-100".to_string(),
                amount: 0.99,
                iso_currency: "USD".to_string(),
            }],
            existing: None,
        };
        let body = serde_json::to_value(&options).unwrap();
        assert_eq!(
            body,
            json!({ "purchases": [{ "sku": "gems-100", "amount": 0.99, "iso": "USD" }] })
        );
    }

    #[test]
    fn csv_export_options_keep_app_id_out_of_body() {
        let options = PlayerCsvExportOptions {
            app_id: "a1".to_string(),
            segment_name: Some("Active Users".to_string()),
            ..PlayerCsvExportOptions::default()
        };
        let body = serde_json::to_value(&options).unwrap();
        assert_eq!(body, json!({ "segment_name": "Active Users" }));
    }

    #[test]
    fn success_response_keeps_extra_fields() {
        let response: SuccessResponse =
            serde_json::from_str(r#"{"success":true,"id":"p1","warnings":[]}"#).unwrap();
        assert!(response.success);
        assert_eq!(response.extra["id"], "p1");
        assert!(response.extra.contains_key("warnings"));
    }

    #[test]
    fn error_envelope_flattens_messages() {
        let list: ErrorResponse =
            serde_json::from_str(r#"{"errors":["app_id not found"]}"#).unwrap();
        assert_eq!(list.into_messages(), vec!["app_id not found"]);

        let keyed: ErrorResponse =
            serde_json::from_str(r#"{"errors":{"invalid_player_ids":["p1","p2"]}}"#).unwrap();
        assert_eq!(
            keyed.into_messages(),
            vec!["invalid_player_ids: p1", "invalid_player_ids: p2"]
        );
    }
}
