//! Trackimo REST payloads, as the vendor sends them.

use serde::{Deserialize, Serialize};

use super::de::{bool_option, f64_option, string_option};

/// Location packet returned by the `location`, `history` and
/// `locations/filter` endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackimoFix {
    /// Only present in `locations/filter` results.
    #[serde(default, deserialize_with = "string_option")]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "f64_option")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "f64_option")]
    pub lng: Option<f64>,
    #[serde(default, deserialize_with = "f64_option")]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "f64_option")]
    pub speed: Option<f64>,
    #[serde(default, deserialize_with = "string_option")]
    pub speed_unit: Option<String>,
    #[serde(default, deserialize_with = "f64_option")]
    pub battery: Option<f64>,
    /// Epoch seconds.
    #[serde(default, deserialize_with = "f64_option")]
    pub time: Option<f64>,
    /// Epoch milliseconds.
    #[serde(default, deserialize_with = "f64_option")]
    pub updated: Option<f64>,
    #[serde(default, deserialize_with = "bool_option")]
    pub moving: Option<bool>,
    #[serde(default, deserialize_with = "bool_option")]
    pub gps: Option<bool>,
    #[serde(default, deserialize_with = "f64_option")]
    pub hdop: Option<f64>,
}

/// Entry of `accounts/{account}/devices`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackimoDeviceSummary {
    #[serde(rename = "deviceId", default, deserialize_with = "string_option")]
    pub device_id: Option<String>,
}

/// Body of `accounts/{account}/devices/{device}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackimoDeviceDetails {
    #[serde(default, deserialize_with = "string_option")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_option")]
    pub imsi: Option<String>,
    #[serde(default, deserialize_with = "string_option")]
    pub status: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "string_option")]
    pub device_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthCode {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Milliseconds.
    #[serde(default, deserialize_with = "f64_option")]
    pub expires_in: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "accountId")]
    pub account_id: i64,
}

/// Device operations supported by `devices/ops`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCommand {
    Beep,
    Locate,
}

impl DeviceCommand {
    pub fn path(&self) -> &'static str {
        match self {
            DeviceCommand::Beep => "beep",
            DeviceCommand::Locate => "getLocation",
        }
    }

    pub fn body(&self, device_id: i64) -> serde_json::Value {
        match self {
            DeviceCommand::Beep => serde_json::json!({
                "devices": [device_id],
                "beepPeriod": 2,
                "beepType": 1,
            }),
            DeviceCommand::Locate => serde_json::json!({
                "devices": [device_id],
                "forceGpsRead": true,
                "sendGsmBeforeLock": true,
            }),
        }
    }
}
