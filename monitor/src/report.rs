//! JSON report formats for the snapshot, history and HTTP probes

use crate::http::ConnectionInfo;
use crate::signal::SignalSample;
use serde::{Serialize, Serializer};
use tracing::warn;

/// Serialize `value` compactly, falling back to `fallback` on failure
fn to_json<T: Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!("JSON serialization failed: {}", e);
            fallback.to_string()
        }
    }
}

/// `[{"rssi":-60,"score":80,"time":1234},...]`, oldest first
pub fn history_json<'a, I>(samples: I) -> String
where
    I: IntoIterator<Item = &'a SignalSample>,
{
    let samples: Vec<&SignalSample> = samples.into_iter().collect();
    to_json(&samples, "[]")
}

pub fn connection_json(info: &ConnectionInfo) -> String {
    to_json(info, "{}")
}

pub(crate) fn object_json<T: Serialize>(value: &T) -> String {
    to_json(value, "{}")
}

/// Serialize an `f32` rounded to two decimals
pub(crate) fn two_decimals<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    let rounded = (f64::from(*value) * 100.0).round() / 100.0;
    serializer.serialize_f64(rounded)
}
