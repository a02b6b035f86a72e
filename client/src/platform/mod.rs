//! Host implementations of the monitor's platform traits

mod net;
mod wireless;

pub use net::HostNetClient;
pub use wireless::LinuxWifi;
