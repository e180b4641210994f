//! Arvento → shared records.
//!
//! Arvento reports no battery, GPS-fix flag or hdop; those are always
//! absent. The whole packet is kept verbatim in `raw_data`.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use super::course_degrees;
use crate::error::{GatewayError, Result};
use crate::models::arvento::ArventoPacket;
use crate::models::{Device, Location, Provider};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn location(packet: Map<String, Value>) -> Result<Location> {
    let fields: ArventoPacket = serde_json::from_value(Value::Object(packet.clone()))
        .map_err(|e| GatewayError::Vendor(format!("malformed arvento packet: {}", e)))?;

    let node = fields
        .node
        .ok_or_else(|| GatewayError::missing_field(Provider::Arvento, "strNode"))?;
    let latitude = fields
        .latitude
        .ok_or_else(|| GatewayError::missing_field(Provider::Arvento, "dLatitude"))?;
    let longitude = fields
        .longitude
        .ok_or_else(|| GatewayError::missing_field(Provider::Arvento, "dLongitude"))?;
    let timestamp = fields
        .gmt_date_time
        .as_deref()
        .ok_or_else(|| GatewayError::missing_field(Provider::Arvento, "dtGMTDateTime"))
        .and_then(parse_gmt)?;

    let mut location = Location::new(node, Provider::Arvento, latitude, longitude, timestamp);
    location.altitude = fields.altitude;
    location.speed = fields.speed;
    location.course = fields.course.map(course_degrees);
    location.address = fields.address.filter(|a| !a.trim().is_empty());
    location.odometer = fields.odometer;
    location.is_moving = fields.speed.map_or(false, |speed| speed > 0.0);
    location.raw_data = Some(packet);

    Ok(location)
}

fn parse_gmt(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| GatewayError::Vendor(format!("invalid dtGMTDateTime '{}'", raw)))
}

/// A registered vehicle. The plate stands in for the vendor node, which is
/// only learned when a location is fetched.
pub fn device(license_plate: &str, name: Option<&str>) -> Device {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(license_plate);

    Device {
        device_id: license_plate.to_string(),
        provider: Provider::Arvento,
        name: Some(name.to_string()),
        status: Some("active".to_string()),
        imsi: None,
        device_type: None,
        last_location: None,
    }
}
