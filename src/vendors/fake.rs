//! In-process vendor doubles that count every call they receive.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{
    ArventoApi, ArventoCredentials, TrackimoApi, TrackimoCredentials, TrackimoRefresh,
    TrackimoSession,
};
use crate::error::{GatewayError, Result};
use crate::models::trackimo::{DeviceCommand, TrackimoDeviceDetails, TrackimoDeviceSummary, TrackimoFix};

#[derive(Default)]
pub struct FakeTrackimo {
    calls: AtomicUsize,
    pub password: String,
    pub devices: Vec<i64>,
    pub fixes: HashMap<i64, Value>,
    pub history: Vec<Value>,
    pub failing_details: Vec<i64>,
    pub ignore_paging: bool,
    pub commands: Mutex<Vec<(i64, DeviceCommand)>>,
}

impl FakeTrackimo {
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            ..Default::default()
        }
    }

    pub fn with_device(mut self, device_id: i64, fix: Option<Value>) -> Self {
        self.devices.push(device_id);
        if let Some(fix) = fix {
            self.fixes.insert(device_id, fix);
        }
        self
    }

    pub fn with_history(mut self, history: Vec<Value>) -> Self {
        self.history = history;
        self
    }

    /// Details of this device answer with a vendor error.
    pub fn with_failing_details(mut self, device_id: i64) -> Self {
        self.failing_details.push(device_id);
        self
    }

    /// Every page request returns the first page.
    pub fn ignoring_pages(mut self) -> Self {
        self.ignore_paging = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn session() -> TrackimoSession {
        TrackimoSession {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires: None,
            account_id: 1001,
        }
    }

    fn known(&self, device_id: i64) -> Result<()> {
        if self.devices.contains(&device_id) {
            Ok(())
        } else {
            Err(GatewayError::NotFound(format!("trackimo device {} not found", device_id)))
        }
    }
}

fn parse_fix(value: &Value) -> TrackimoFix {
    serde_json::from_value(value.clone()).unwrap()
}

#[async_trait]
impl TrackimoApi for FakeTrackimo {
    async fn login(&self, credentials: &TrackimoCredentials) -> Result<TrackimoSession> {
        self.hit();
        if credentials.password == self.password {
            Ok(Self::session())
        } else {
            Err(GatewayError::Auth("trackimo rejected login (401 Unauthorized)".to_string()))
        }
    }

    async fn refresh(&self, refresh: &TrackimoRefresh) -> Result<TrackimoSession> {
        self.hit();
        if refresh.refresh_token == "refresh" {
            Ok(Self::session())
        } else {
            Err(GatewayError::Vendor("trackimo token refresh failed with 500".to_string()))
        }
    }

    async fn device_page(
        &self,
        _session: &TrackimoSession,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TrackimoDeviceSummary>> {
        self.hit();
        let page = if self.ignore_paging { 1 } else { page };
        let start = ((page - 1) * limit) as usize;
        Ok(self
            .devices
            .iter()
            .skip(start)
            .take(limit as usize)
            .map(|id| TrackimoDeviceSummary {
                device_id: Some(id.to_string()),
            })
            .collect())
    }

    async fn device_details(
        &self,
        _session: &TrackimoSession,
        device_id: i64,
    ) -> Result<TrackimoDeviceDetails> {
        self.hit();
        self.known(device_id)?;
        if self.failing_details.contains(&device_id) {
            return Err(GatewayError::Vendor("trackimo device failed with 500".to_string()));
        }
        Ok(serde_json::from_value(json!({
            "name": format!("Tracker {}", device_id),
            "status": "active",
            "type": "TRACKIMO_UNIVERSAL"
        }))
        .unwrap())
    }

    async fn latest_fixes(
        &self,
        _session: &TrackimoSession,
        device_ids: &[i64],
    ) -> Result<Vec<TrackimoFix>> {
        self.hit();
        Ok(device_ids
            .iter()
            .filter_map(|id| {
                self.fixes.get(id).map(|fix| {
                    let mut fix = fix.clone();
                    fix["device_id"] = json!(id);
                    parse_fix(&fix)
                })
            })
            .collect())
    }

    async fn location(
        &self,
        _session: &TrackimoSession,
        device_id: i64,
    ) -> Result<Option<TrackimoFix>> {
        self.hit();
        self.known(device_id)?;
        Ok(self.fixes.get(&device_id).map(parse_fix))
    }

    async fn history(
        &self,
        _session: &TrackimoSession,
        device_id: i64,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<TrackimoFix>> {
        self.hit();
        self.known(device_id)?;
        Ok(self.history.iter().take(limit as usize).map(parse_fix).collect())
    }

    async fn command(
        &self,
        _session: &TrackimoSession,
        device_id: i64,
        command: DeviceCommand,
    ) -> Result<()> {
        self.hit();
        self.known(device_id)?;
        self.commands.lock().unwrap().push((device_id, command));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeArvento {
    calls: AtomicUsize,
    pub unreachable: bool,
    pub nodes: HashMap<String, String>,
    pub packets: HashMap<String, Value>,
}

impl FakeArvento {
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    pub fn with_vehicle(mut self, plate: &str, packet: Value) -> Self {
        let node = packet["strNode"].as_str().unwrap().to_string();
        self.nodes.insert(plate.to_string(), node.clone());
        self.packets.insert(node, packet);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ArventoApi for FakeArvento {
    async fn probe(&self, _credentials: &ArventoCredentials) -> Result<()> {
        self.hit();
        if self.unreachable {
            Err(GatewayError::Vendor("arvento request failed: connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    async fn node_from_plate(
        &self,
        _credentials: &ArventoCredentials,
        license_plate: &str,
    ) -> Result<Option<String>> {
        self.hit();
        Ok(self.nodes.get(license_plate).cloned())
    }

    async fn vehicle_status(
        &self,
        _credentials: &ArventoCredentials,
        node: &str,
    ) -> Result<Option<Map<String, Value>>> {
        self.hit();
        Ok(self
            .packets
            .get(node)
            .and_then(|packet| packet.as_object().cloned()))
    }
}

pub fn trackimo_credentials(password: &str) -> TrackimoCredentials {
    TrackimoCredentials {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        username: "user@example.com".to_string(),
        password: password.to_string(),
    }
}

pub fn arvento_credentials() -> ArventoCredentials {
    ArventoCredentials {
        host: "https://ws.arvento.com/v1/report.asmx?wsdl".to_string(),
        username: "fleet".to_string(),
        pin1: "1111".to_string(),
        pin2: "2222".to_string(),
        offline: false,
    }
}

/// The `LastPacket` sample from Arvento's documentation.
pub fn sample_packet() -> Value {
    json!({
        "strNode": "K1200098807",
        "dtGMTDateTime": "2023-06-01T03:42:23",
        "dLatitude": 40.97681,
        "dLongitude": 34.810963,
        "dSpeed": 0,
        "strAddress": "Ömer Derindere Blv., Cumhuriyet Mh., Osmancık, Çorum, Türkiye",
        "nCourse": 0,
        "dOdometer": 24507,
        "nAltitude": 0
    })
}
