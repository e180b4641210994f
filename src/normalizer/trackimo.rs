//! Trackimo → shared records.
//!
//! Trackimo reports no course, address, odometer or raw passthrough; those
//! fields are always absent. Everything else maps field for field.

use chrono::{DateTime, TimeZone, Utc};

use super::battery_percent;
use crate::error::{GatewayError, Result};
use crate::models::trackimo::{TrackimoDeviceDetails, TrackimoFix};
use crate::models::{Device, Location, Provider};

const KM_PER_MILE: f64 = 1.60934;

pub fn location(device_id: &str, fix: &TrackimoFix) -> Result<Location> {
    let latitude = fix
        .lat
        .ok_or_else(|| GatewayError::missing_field(Provider::Trackimo, "lat"))?;
    let longitude = fix
        .lng
        .ok_or_else(|| GatewayError::missing_field(Provider::Trackimo, "lng"))?;
    let timestamp = fix_time(fix)?;

    let mut location = Location::new(device_id, Provider::Trackimo, latitude, longitude, timestamp);
    location.altitude = fix.altitude;
    location.speed = fix.speed.map(|speed| match fix.speed_unit.as_deref() {
        Some(unit) if unit.eq_ignore_ascii_case("mph") => speed * KM_PER_MILE,
        _ => speed,
    });
    location.battery = fix.battery.map(battery_percent);
    location.is_moving = fix.moving.unwrap_or(false);
    location.is_gps_fix = fix.gps;
    location.hdop = fix.hdop;

    Ok(location)
}

/// `time` (epoch seconds) wins over `updated` (epoch milliseconds).
fn fix_time(fix: &TrackimoFix) -> Result<DateTime<Utc>> {
    let parsed = match (fix.time, fix.updated) {
        (Some(secs), _) => Utc.timestamp_opt(secs as i64, 0).single(),
        (None, Some(millis)) => Utc.timestamp_millis_opt(millis as i64).single(),
        (None, None) => return Err(GatewayError::missing_field(Provider::Trackimo, "time")),
    };
    parsed.ok_or_else(|| GatewayError::Vendor("trackimo fix time out of range".to_string()))
}

pub fn device(
    device_id: &str,
    details: &TrackimoDeviceDetails,
    last_location: Option<Location>,
) -> Device {
    Device {
        device_id: device_id.to_string(),
        provider: Provider::Trackimo,
        name: details.name.clone(),
        status: details.status.clone(),
        imsi: details.imsi.clone(),
        device_type: details.device_type.clone(),
        last_location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(payload: &str) -> TrackimoFix {
        serde_json::from_str(payload).unwrap()
    }

    #[test]
    fn test_full_fix() {
        let fix = fix(r#"
        {
            "lat": 32.0853,
            "lng": 34.7818,
            "altitude": 12,
            "speed": 10,
            "speed_unit": "kph",
            "battery": 87,
            "time": 1685590943,
            "moving": true,
            "gps": false,
            "hdop": 1.2
        }
        "#);

        let location = location("600123456", &fix).unwrap();
        assert_eq!(location.device_id, "600123456");
        assert_eq!(location.provider, Provider::Trackimo);
        assert_eq!(location.latitude, 32.0853);
        assert_eq!(location.altitude, Some(12.0));
        assert_eq!(location.speed, Some(10.0));
        assert_eq!(location.battery, Some(87));
        assert_eq!(location.timestamp.to_rfc3339(), "2023-06-01T03:42:23+00:00");
        assert!(location.is_moving);
        assert_eq!(location.is_gps_fix, Some(false));
        assert_eq!(location.hdop, Some(1.2));
    }

    #[test]
    fn test_missing_optionals_stay_absent() {
        let location = location("1", &fix(r#"{"lat": 1.5, "lng": 2.5, "time": 0}"#)).unwrap();
        assert_eq!(location.altitude, None);
        assert_eq!(location.speed, None);
        assert_eq!(location.course, None);
        assert_eq!(location.battery, None);
        assert_eq!(location.address, None);
        assert_eq!(location.odometer, None);
        assert_eq!(location.is_gps_fix, None);
        assert_eq!(location.hdop, None);
        assert_eq!(location.raw_data, None);
        assert!(!location.is_moving);
    }

    #[test]
    fn test_mph_converted() {
        let location =
            location("1", &fix(r#"{"lat": 1, "lng": 2, "time": 0, "speed": 10, "speed_unit": "mph"}"#))
                .unwrap();
        assert!((location.speed.unwrap() - 16.0934).abs() < 1e-9);
    }

    #[test]
    fn test_updated_millis_used_without_time() {
        let location =
            location("1", &fix(r#"{"lat": 1, "lng": 2, "updated": 1685590943500}"#)).unwrap();
        assert_eq!(location.timestamp.timestamp_millis(), 1685590943500);
    }

    #[test]
    fn test_missing_required_fields() {
        let err = location("1", &fix(r#"{"lng": 2, "time": 0}"#)).unwrap_err();
        assert!(matches!(err, GatewayError::Vendor(ref m) if m.contains("'lat'")));

        let err = location("1", &fix(r#"{"lat": 1, "lng": 2}"#)).unwrap_err();
        assert!(matches!(err, GatewayError::Vendor(ref m) if m.contains("'time'")));
    }

    #[test]
    fn test_device_from_details() {
        let details: TrackimoDeviceDetails = serde_json::from_str(
            r#"{"name": "Dog collar", "imsi": 425010123456789, "status": "active", "type": "TRACKIMO_GUARDIAN"}"#,
        )
        .unwrap();
        let device = device("600123456", &details, None);
        assert_eq!(device.name.as_deref(), Some("Dog collar"));
        assert_eq!(device.imsi.as_deref(), Some("425010123456789"));
        assert_eq!(device.device_type.as_deref(), Some("TRACKIMO_GUARDIAN"));
        assert_eq!(device.last_location, None);
    }
}
