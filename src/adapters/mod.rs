//! One adapter per provider. An adapter exists only once its provider has
//! connected, and owns that connection's credentials for its lifetime.

pub mod arvento;
pub mod trackimo;

pub use arvento::ArventoAdapter;
pub use trackimo::{CommandAck, TrackimoAdapter, TrackimoOptions};
