use serde::Serialize;

use super::{Location, Provider};

/// A tracked unit. `(device_id, provider)` identifies it across the merged view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub device_id: String,
    pub provider: Provider,
    pub name: Option<String>,
    /// Vendor-defined free text, e.g. "active".
    pub status: Option<String>,
    pub imsi: Option<String>,
    pub device_type: Option<String>,
    pub last_location: Option<Location>,
}
