//! Pure mapping from vendor payloads into the shared `Location` / `Device`
//! shapes. Vendor-shaped data does not travel past this module except in
//! `Location::raw_data`.

pub mod arvento;
pub mod trackimo;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::trackimo::TrackimoFix;
use crate::models::Location;

/// A location payload tagged with the vendor that produced it.
#[derive(Debug, Clone)]
pub enum RawLocation {
    Trackimo { device_id: String, fix: TrackimoFix },
    Arvento(Map<String, Value>),
}

pub fn normalize_location(raw: RawLocation) -> Result<Location> {
    match raw {
        RawLocation::Trackimo { device_id, fix } => trackimo::location(&device_id, &fix),
        RawLocation::Arvento(packet) => arvento::location(packet),
    }
}

/// Folds any heading into 0-359.
fn course_degrees(value: f64) -> u16 {
    (value.round() as i64).rem_euclid(360) as u16
}

fn battery_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
