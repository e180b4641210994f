pub mod arvento;
pub mod device;
pub mod location;
pub mod provider;
pub mod trackimo;

mod de;

pub use device::Device;
pub use location::Location;
pub use provider::Provider;
