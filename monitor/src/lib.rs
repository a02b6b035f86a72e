//! Linkwatch Monitor Library
//!
//! WiFi connection diagnostics on top of platform-provided primitives.
//! This includes the `Monitor` state holder, signal scoring and history,
//! ping/HTTP/throughput probes and the JSON report formats.

pub mod constants;
pub mod error;
pub mod http;
pub mod monitor;
pub mod ping;
pub mod platform;
pub mod report;
pub mod signal;

pub use constants::*;
pub use error::PlatformError;
pub use http::ConnectionInfo;
pub use monitor::{Connectivity, Monitor, MonitorConfig, Snapshot};
pub use ping::PingStats;
pub use platform::{Encryption, HttpResponse, NetClient, NetworkInfo, WifiStatus};
pub use signal::{signal_score, SignalHistory, SignalSample};
