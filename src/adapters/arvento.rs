use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::ReregistrationPolicy;
use crate::error::{GatewayError, Result};
use crate::models::{Device, Location};
use crate::normalizer::{self, arvento, RawLocation};
use crate::vendors::{ArventoApi, ArventoCredentials, OfflineArvento};

/// A connected Arvento account plus the vehicles registered against it.
/// Arvento has no device listing, so the gateway keeps its own.
pub struct ArventoAdapter {
    api: Arc<dyn ArventoApi>,
    credentials: ArventoCredentials,
    policy: ReregistrationPolicy,
    vehicles: RwLock<Vec<Device>>,
}

impl ArventoAdapter {
    pub async fn connect(
        api: Arc<dyn ArventoApi>,
        credentials: ArventoCredentials,
        policy: ReregistrationPolicy,
    ) -> Result<Self> {
        api.probe(&credentials).await.map_err(|e| match e {
            GatewayError::Auth(_) => e,
            other => GatewayError::Auth(format!("Arvento connection failed: {}", other)),
        })?;
        info!("Arvento connected ({})", credentials.endpoint());

        Ok(Self {
            api,
            credentials,
            policy,
            vehicles: RwLock::new(Vec::new()),
        })
    }

    /// Connects to the bundled sample fleet; its vehicles start registered.
    pub fn connect_offline(credentials: ArventoCredentials, policy: ReregistrationPolicy) -> Self {
        let offline = OfflineArvento;
        let vehicles = offline
            .vehicles()
            .iter()
            .map(|(plate, name)| arvento::device(plate, Some(name.as_str())))
            .collect();
        info!("Arvento offline mode enabled; using sample fleet");

        Self {
            api: Arc::new(offline),
            credentials,
            policy,
            vehicles: RwLock::new(vehicles),
        }
    }

    /// Adds a plate to the tracked set. Local only; the vendor is not called.
    pub async fn register_vehicle(&self, license_plate: &str, name: Option<&str>) -> Result<Device> {
        let plate = license_plate.trim();
        if plate.is_empty() {
            return Err(GatewayError::Validation("license_plate must not be empty".to_string()));
        }

        let mut vehicles = self.vehicles.write().await;
        if let Some(existing) = vehicles.iter_mut().find(|d| d.device_id == plate) {
            return match self.policy {
                ReregistrationPolicy::Keep => Ok(existing.clone()),
                ReregistrationPolicy::Rename => {
                    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
                        existing.name = Some(name.to_string());
                    }
                    Ok(existing.clone())
                }
                ReregistrationPolicy::Reject => Err(GatewayError::Validation(format!(
                    "vehicle {} is already registered",
                    plate
                ))),
            };
        }

        let device = arvento::device(plate, name);
        vehicles.push(device.clone());
        info!("Arvento vehicle {} registered", plate);
        Ok(device)
    }

    pub async fn list_devices(&self) -> Vec<Device> {
        self.vehicles.read().await.clone()
    }

    pub async fn get_location_by_plate(&self, license_plate: &str) -> Result<Location> {
        let plate = license_plate.trim();
        let node = self
            .api
            .node_from_plate(&self.credentials, plate)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("vehicle with plate {} not found", plate)))?;

        self.get_location_by_node(&node).await
    }

    pub async fn get_location_by_node(&self, node: &str) -> Result<Location> {
        let packet = self
            .api
            .vehicle_status(&self.credentials, node)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("no status for arvento node {}", node)))?;

        normalizer::normalize_location(RawLocation::Arvento(packet))
    }
}
