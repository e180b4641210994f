//! A built-in Arvento stand-in with a fixed two-vehicle fleet, for running
//! the gateway without vendor access.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use tracing::debug;

use super::{ArventoApi, ArventoCredentials};
use crate::error::Result;

/// `(plate, node, latitude, longitude, speed, course, odometer, address, minutes ago)`
const FLEET: [(&str, &str, f64, f64, f64, u16, f64, &str, i64); 2] = [
    ("34ABC123", "NODE001", 40.978, 29.092, 12.3, 45, 25010.0, "İstanbul, Türkiye", 3),
    ("35XYZ789", "NODE002", 38.4237, 27.1428, 0.0, 0, 10200.0, "İzmir, Türkiye", 7),
];

#[derive(Default)]
pub struct OfflineArvento;

impl OfflineArvento {
    /// Plates and display names of the sample fleet, in registration order.
    pub fn vehicles(&self) -> Vec<(String, String)> {
        FLEET
            .iter()
            .map(|(plate, node, ..)| (plate.to_string(), format!("Mock Vehicle {}", node)))
            .collect()
    }
}

#[async_trait]
impl ArventoApi for OfflineArvento {
    async fn probe(&self, _credentials: &ArventoCredentials) -> Result<()> {
        debug!("Arvento offline mode: skipping service probe");
        Ok(())
    }

    async fn node_from_plate(
        &self,
        _credentials: &ArventoCredentials,
        license_plate: &str,
    ) -> Result<Option<String>> {
        Ok(FLEET
            .iter()
            .find(|vehicle| vehicle.0 == license_plate)
            .map(|vehicle| vehicle.1.to_string()))
    }

    async fn vehicle_status(
        &self,
        _credentials: &ArventoCredentials,
        node: &str,
    ) -> Result<Option<Map<String, Value>>> {
        let Some(&(_, node, lat, lng, speed, course, odometer, address, age)) =
            FLEET.iter().find(|vehicle| vehicle.1 == node)
        else {
            return Ok(None);
        };

        let at = Utc::now() - Duration::minutes(age);
        let packet = json!({
            "strNode": node,
            "dtGMTDateTime": at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "dLatitude": lat,
            "dLongitude": lng,
            "dSpeed": speed,
            "nCourse": course,
            "dOdometer": odometer,
            "strAddress": address,
        });

        Ok(packet.as_object().cloned())
    }
}
