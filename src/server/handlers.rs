use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

use crate::adapters::{ArventoAdapter, CommandAck, TrackimoAdapter};
use crate::error::{GatewayError, Result};
use crate::models::trackimo::DeviceCommand;
use crate::models::{Device, Location, Provider};
use crate::server::state::AppState;
use crate::vendors::{ArventoCredentials, TrackimoCredentials, TrackimoRefresh};

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub hours: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AddVehicleRequest {
    pub license_plate: String,
    pub name: Option<String>,
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| GatewayError::Validation(e.body_text()))
}

// ==================== SYSTEM ====================

pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let connected = state.connections.connected().await;
    Json(json!({
        "status": "running",
        "connected_providers": connected,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Every connected provider's devices, concatenated in provider order.
/// No cross-provider deduplication.
pub async fn all_devices(State(state): State<Arc<AppState>>) -> Json<Vec<Device>> {
    let trackimo = state.connections.trackimo().await.ok();
    let arvento = state.connections.arvento().await.ok();

    let (trackimo_devices, arvento_devices) = tokio::join!(
        async {
            match trackimo {
                Some(adapter) => adapter.list_devices().await.unwrap_or_else(|e| {
                    error!("Error getting devices from trackimo: {}", e);
                    Vec::new()
                }),
                None => Vec::new(),
            }
        },
        async {
            match arvento {
                Some(adapter) => adapter.list_devices().await,
                None => Vec::new(),
            }
        }
    );

    let mut devices = trackimo_devices;
    devices.extend(arvento_devices);
    Json(devices)
}

pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<Json<Value>> {
    let provider = Provider::from_name(&provider)
        .ok_or_else(|| GatewayError::Validation(format!("unknown provider '{}'", provider)))?;

    if !state.connections.disconnect(provider).await {
        return Err(GatewayError::NotFound(format!("provider {} not connected", provider)));
    }
    info!("{} disconnected", provider);

    Ok(Json(json!({
        "status": "disconnected",
        "provider": provider,
    })))
}

// ==================== TRACKIMO ====================

fn trackimo_connected(adapter: &TrackimoAdapter) -> Json<Value> {
    Json(json!({
        "status": "connected",
        "provider": Provider::Trackimo,
        "auth": adapter.session(),
    }))
}

pub async fn trackimo_connect(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<TrackimoCredentials>, JsonRejection>,
) -> Result<Json<Value>> {
    let credentials = body(payload)?;
    let adapter = TrackimoAdapter::connect(
        state.trackimo_api.clone(),
        &credentials,
        state.trackimo_options(),
    )
    .await?;

    let adapter = state.connections.set_trackimo(adapter).await;
    Ok(trackimo_connected(&adapter))
}

pub async fn trackimo_restore(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<TrackimoRefresh>, JsonRejection>,
) -> Result<Json<Value>> {
    let refresh = body(payload)?;
    let adapter = TrackimoAdapter::restore(
        state.trackimo_api.clone(),
        &refresh,
        state.trackimo_options(),
    )
    .await?;

    let adapter = state.connections.set_trackimo(adapter).await;
    Ok(trackimo_connected(&adapter))
}

pub async fn trackimo_devices(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Device>>> {
    let adapter = state.connections.trackimo().await?;
    Ok(Json(adapter.list_devices().await?))
}

pub async fn trackimo_location(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Json<Location>> {
    let adapter = state.connections.trackimo().await?;
    Ok(Json(adapter.get_location(&device_id).await?))
}

pub async fn trackimo_history(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    params: std::result::Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<Vec<Location>>> {
    let adapter = state.connections.trackimo().await?;
    let Query(params) = params.map_err(|e| GatewayError::Validation(e.body_text()))?;
    let hours = params.hours.unwrap_or(state.config.history_default_hours);

    Ok(Json(adapter.get_history(&device_id, hours).await?))
}

async fn trackimo_command(
    state: &AppState,
    device_id: &str,
    command: DeviceCommand,
) -> Result<Json<CommandAck>> {
    let adapter = state.connections.trackimo().await?;
    Ok(Json(adapter.send_command(device_id, command).await?))
}

pub async fn trackimo_beep(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Json<CommandAck>> {
    trackimo_command(&state, &device_id, DeviceCommand::Beep).await
}

pub async fn trackimo_locate(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Json<CommandAck>> {
    trackimo_command(&state, &device_id, DeviceCommand::Locate).await
}

// ==================== ARVENTO ====================

pub async fn arvento_connect(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ArventoCredentials>, JsonRejection>,
) -> Result<Json<Value>> {
    let credentials = body(payload)?;
    let policy = state.config.arvento_reregistration;
    let adapter = if credentials.offline || state.config.arvento_offline {
        ArventoAdapter::connect_offline(credentials, policy)
    } else {
        ArventoAdapter::connect(state.arvento_api.clone(), credentials, policy).await?
    };
    state.connections.set_arvento(adapter).await;

    Ok(Json(json!({
        "status": "connected",
        "provider": Provider::Arvento,
    })))
}

pub async fn arvento_add_vehicle(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<AddVehicleRequest>, JsonRejection>,
) -> Result<Json<Device>> {
    let adapter = state.connections.arvento().await?;
    let request = body(payload)?;

    Ok(Json(
        adapter
            .register_vehicle(&request.license_plate, request.name.as_deref())
            .await?,
    ))
}

pub async fn arvento_vehicles(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Device>>> {
    let adapter = state.connections.arvento().await?;
    Ok(Json(adapter.list_devices().await))
}

pub async fn arvento_location_by_node(
    State(state): State<Arc<AppState>>,
    Path(node): Path<String>,
) -> Result<Json<Location>> {
    let adapter = state.connections.arvento().await?;
    Ok(Json(adapter.get_location_by_node(&node).await?))
}

pub async fn arvento_location_by_plate(
    State(state): State<Arc<AppState>>,
    Path(plate): Path<String>,
) -> Result<Json<Location>> {
    let adapter = state.connections.arvento().await?;
    Ok(Json(adapter.get_location_by_plate(&plate).await?))
}
