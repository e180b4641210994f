use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::Provider;

/// A single fix in the shared shape. Optional fields serialize as `null`
/// when the vendor did not report them; they are never defaulted to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub device_id: String,
    pub provider: Provider,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters.
    pub altitude: Option<f64>,
    /// km/h.
    pub speed: Option<f64>,
    /// Degrees, 0-359.
    pub course: Option<u16>,
    /// Percent, 0-100.
    pub battery: Option<u8>,
    pub timestamp: DateTime<Utc>,
    pub address: Option<String>,
    /// Kilometers.
    pub odometer: Option<f64>,
    pub is_moving: bool,
    pub is_gps_fix: Option<bool>,
    pub hdop: Option<f64>,
    /// Untouched vendor packet, kept for traceability.
    pub raw_data: Option<Map<String, Value>>,
}

impl Location {
    /// Bare fix with every optional field absent.
    pub fn new(
        device_id: impl Into<String>,
        provider: Provider,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            provider,
            latitude,
            longitude,
            altitude: None,
            speed: None,
            course: None,
            battery: None,
            timestamp,
            address: None,
            odometer: None,
            is_moving: false,
            is_gps_fix: None,
            hdop: None,
            raw_data: None,
        }
    }
}
