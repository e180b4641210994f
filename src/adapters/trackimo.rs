use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, Result};
use crate::models::trackimo::{DeviceCommand, TrackimoDeviceDetails};
use crate::models::{Device, Location, Provider};
use crate::normalizer::{self, trackimo, RawLocation};
use crate::vendors::{TrackimoApi, TrackimoCredentials, TrackimoRefresh, TrackimoSession};

/// Ten years; anything longer is not a history window.
const MAX_HISTORY_HOURS: i64 = 24 * 365 * 10;

/// Upper bound on device pages read per listing.
const MAX_DEVICE_PAGES: u32 = 100;

/// Device detail requests in flight at once.
const DETAILS_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct TrackimoOptions {
    pub page_size: u32,
    pub history_limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandAck {
    pub device_id: String,
    pub provider: Provider,
    pub command: DeviceCommand,
    pub status: &'static str,
}

/// A connected Trackimo account.
pub struct TrackimoAdapter {
    api: Arc<dyn TrackimoApi>,
    session: TrackimoSession,
    options: TrackimoOptions,
}

fn auth_failure(e: GatewayError) -> GatewayError {
    match e {
        GatewayError::Auth(_) => e,
        other => GatewayError::Auth(format!("trackimo authentication failed: {}", other)),
    }
}

/// Trackimo device ids are integers; anything else never reaches the vendor.
fn parse_device_id(device_id: &str) -> Result<i64> {
    device_id
        .trim()
        .parse()
        .map_err(|_| GatewayError::Validation(format!("invalid trackimo device id '{}'", device_id)))
}

impl TrackimoAdapter {
    pub async fn connect(
        api: Arc<dyn TrackimoApi>,
        credentials: &TrackimoCredentials,
        options: TrackimoOptions,
    ) -> Result<Self> {
        let session = api.login(credentials).await.map_err(auth_failure)?;
        info!("Trackimo connected (account {})", session.account_id);
        Ok(Self { api, session, options })
    }

    pub async fn restore(
        api: Arc<dyn TrackimoApi>,
        refresh: &TrackimoRefresh,
        options: TrackimoOptions,
    ) -> Result<Self> {
        let session = api.refresh(refresh).await.map_err(auth_failure)?;
        info!("Trackimo session restored (account {})", session.account_id);
        Ok(Self { api, session, options })
    }

    pub fn session(&self) -> &TrackimoSession {
        &self.session
    }

    /// Devices of the account with their latest fix. A device whose details
    /// or fix cannot be read is still listed, with what could be read.
    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        let ids = self.device_ids().await?;

        let details: Vec<TrackimoDeviceDetails> = stream::iter(ids.iter().copied())
            .map(|id| async move {
                self.api
                    .device_details(&self.session, id)
                    .await
                    .unwrap_or_else(|e| {
                        warn!("Failed to load trackimo device {} details: {}", id, e);
                        TrackimoDeviceDetails::default()
                    })
            })
            .buffered(DETAILS_CONCURRENCY)
            .collect()
            .await;

        let mut latest = HashMap::new();
        if !ids.is_empty() {
            for fix in self.api.latest_fixes(&self.session, &ids).await? {
                if let Some(device_id) = fix.device_id.clone() {
                    latest.insert(device_id, fix);
                }
            }
        }

        Ok(ids
            .iter()
            .zip(details)
            .map(|(id, details)| {
                let device_id = id.to_string();
                let last_location = latest.remove(&device_id).and_then(|fix| {
                    let raw = RawLocation::Trackimo {
                        device_id: device_id.clone(),
                        fix,
                    };
                    match normalizer::normalize_location(raw) {
                        Ok(location) => Some(location),
                        Err(e) => {
                            warn!("Dropping last location of trackimo device {}: {}", id, e);
                            None
                        }
                    }
                });
                trackimo::device(&device_id, &details, last_location)
            })
            .collect())
    }

    /// Walks the device pages until a short page, a page that repeats the
    /// previous one, or `MAX_DEVICE_PAGES`.
    async fn device_ids(&self) -> Result<Vec<i64>> {
        let limit = self.options.page_size.max(1);
        let mut ids = Vec::new();
        let mut previous: Option<Vec<Option<String>>> = None;

        for page in 1..=MAX_DEVICE_PAGES {
            let summaries = self.api.device_page(&self.session, page, limit).await?;
            let fetched = summaries.len();
            let keys: Vec<_> = summaries.iter().map(|s| s.device_id.clone()).collect();
            if fetched > 0 && previous.as_ref() == Some(&keys) {
                warn!("Trackimo returned page {} twice; stopping pagination", page - 1);
                break;
            }

            for summary in summaries {
                match summary.device_id.as_deref().map(parse_device_id) {
                    Some(Ok(id)) => ids.push(id),
                    _ => debug!("Skipping trackimo device entry without numeric id"),
                }
            }
            if fetched < limit as usize {
                return Ok(ids);
            }
            if page == MAX_DEVICE_PAGES {
                warn!("Trackimo device listing stopped after {} pages", MAX_DEVICE_PAGES);
            }
            previous = Some(keys);
        }

        Ok(ids)
    }

    pub async fn get_location(&self, device_id: &str) -> Result<Location> {
        let id = parse_device_id(device_id)?;
        let fix = self
            .api
            .location(&self.session, id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("no location for trackimo device {}", id)))?;

        normalizer::normalize_location(RawLocation::Trackimo {
            device_id: id.to_string(),
            fix,
        })
    }

    /// Fixes from the last `hours` hours, oldest first.
    pub async fn get_history(&self, device_id: &str, hours: i64) -> Result<Vec<Location>> {
        if hours <= 0 {
            return Err(GatewayError::Validation(format!(
                "hours must be positive, got {}",
                hours
            )));
        }
        if hours > MAX_HISTORY_HOURS {
            return Err(GatewayError::Validation(format!(
                "hours must not exceed {}",
                MAX_HISTORY_HOURS
            )));
        }
        let id = parse_device_id(device_id)?;

        let to = Utc::now();
        let from = to - Duration::hours(hours);
        let fixes = self
            .api
            .history(&self.session, id, from, to, self.options.history_limit)
            .await?;

        let mut locations = fixes
            .into_iter()
            .map(|fix| {
                normalizer::normalize_location(RawLocation::Trackimo {
                    device_id: id.to_string(),
                    fix,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        locations.sort_by_key(|location| location.timestamp);

        Ok(locations)
    }

    /// Not idempotent on the device side; sent exactly once.
    pub async fn send_command(&self, device_id: &str, command: DeviceCommand) -> Result<CommandAck> {
        let id = parse_device_id(device_id)?;
        self.api.command(&self.session, id, command).await?;
        info!("Trackimo {:?} sent to device {}", command, id);

        Ok(CommandAck {
            device_id: id.to_string(),
            provider: Provider::Trackimo,
            command,
            status: "sent",
        })
    }
}
