//! Clients for the vendor services. The traits are the seam adapters are
//! written against; the concrete types speak the real wire protocols.

pub mod arvento;
pub mod offline;
pub mod soap;
pub mod trackimo;

#[cfg(test)]
pub mod fake;

pub use arvento::{ArventoApi, ArventoCredentials, SoapArventoClient};
pub use offline::OfflineArvento;
pub use trackimo::{
    HttpTrackimoClient, TrackimoApi, TrackimoCredentials, TrackimoRefresh, TrackimoSession,
};
