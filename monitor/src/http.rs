//! HTTP reachability, throughput and captive portal probes

use crate::constants::*;
use crate::error::PlatformError;
use crate::platform::NetClient;
use serde::Serialize;
use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of a single HTTP GET probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub url: String,
    pub success: bool,
    /// HTTP status, or a negative client error code
    pub status_code: i32,
    /// Milliseconds until the response arrived, -1 if no request was made
    pub response_time: i64,
    pub redirected: bool,
    pub redirect_location: String,
    pub error_message: String,
}

impl ConnectionInfo {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            success: false,
            status_code: 0,
            response_time: 0,
            redirected: false,
            redirect_location: String::new(),
            error_message: String::new(),
        }
    }

    /// Whether a request actually went out (and should update last-seen HTTP stats)
    pub fn attempted(&self) -> bool {
        self.response_time >= 0
    }
}

/// GET `url` once and describe the outcome.
///
/// 2xx and 3xx count as success; 3xx additionally records the redirect target.
pub fn test_connection<N: NetClient + ?Sized>(client: &mut N, url: &str, timeout: Duration) -> ConnectionInfo {
    let mut info = ConnectionInfo::new(url);

    let start = Instant::now();
    let result = client.get(url, timeout);
    let elapsed = start.elapsed().as_millis() as i64;

    match result {
        Ok(response) => {
            let code = i32::from(response.status);
            info.status_code = code;
            info.response_time = elapsed;
            info.success = (200..400).contains(&code);
            if (300..400).contains(&code) {
                info.redirected = true;
                info.redirect_location = response.location.unwrap_or_default();
            }
            debug!("GET {} -> {} in {}ms", url, code, elapsed);
        }
        Err(PlatformError::Session(msg)) => {
            info.status_code = HTTP_SESSION_FAILED;
            info.response_time = -1;
            info.error_message = format!("HTTP begin failed: {}", msg);
            warn!("GET {} -> {}", url, info.error_message);
        }
        Err(e) => {
            info.status_code = e.status_code();
            info.response_time = elapsed;
            info.error_message = e.to_string();
            warn!("GET {} -> {} ({})", url, info.status_code, e);
        }
    }

    info
}

/// Download `url` and return the observed speed in KB/s.
///
/// Returns 0 when the request fails or the server does not declare a length.
pub fn download_speed<N: NetClient + ?Sized>(client: &mut N, url: &str) -> f32 {
    let start = Instant::now();
    let mut response = match client.get(url, THROUGHPUT_TIMEOUT) {
        Ok(response) => response,
        Err(e) => {
            warn!("Download test {} failed: {}", url, e);
            return 0.0;
        }
    };

    let size = match response.content_length {
        Some(size) if size > 0 => size,
        _ => {
            debug!("Download test {} -> status {}, no content length", url, response.status);
            return 0.0;
        }
    };

    let mut buf = [0u8; DOWNLOAD_CHUNK_SIZE];
    let mut total: u64 = 0;
    while total < size {
        let want = (size - total).min(buf.len() as u64) as usize;
        match response.body.read(&mut buf[..want]) {
            Ok(0) => {
                debug!("Download test {} ended early at {}/{} bytes", url, total, size);
                break;
            }
            Ok(n) => total += n as u64,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Download test {} read error after {} bytes: {}", url, total, e);
                break;
            }
        }
    }

    let speed = kb_per_sec(total, start.elapsed());
    debug!("Download test {} -> {} bytes, {:.2} KB/s", url, total, speed);
    speed
}

/// POST a fixed dummy payload to `url` and return the observed speed in KB/s.
pub fn upload_speed<N: NetClient + ?Sized>(client: &mut N, url: &str) -> f32 {
    let payload = [UPLOAD_FILL_BYTE; UPLOAD_PAYLOAD_SIZE];

    let start = Instant::now();
    let result = client.post(url, &payload, THROUGHPUT_TIMEOUT);
    let elapsed = start.elapsed();

    match result {
        Ok(response) => {
            let speed = kb_per_sec(payload.len() as u64, elapsed);
            debug!("Upload test {} -> status {}, {:.2} KB/s", url, response.status, speed);
            speed
        }
        Err(e) => {
            warn!("Upload test {} failed: {}", url, e);
            0.0
        }
    }
}

/// Whether something intercepts the no-content probe endpoint
pub fn captive_portal_active<N: NetClient + ?Sized>(client: &mut N, url: &str) -> bool {
    match client.get(url, THROUGHPUT_TIMEOUT) {
        Ok(response) => {
            let active = i32::from(response.status) != NO_CONTENT;
            if active {
                debug!("Captive portal probe {} -> {}", url, response.status);
            }
            active
        }
        Err(e) => {
            debug!("Captive portal probe {} failed: {}", url, e);
            true
        }
    }
}

fn kb_per_sec(bytes: u64, elapsed: Duration) -> f32 {
    let secs = elapsed.max(Duration::from_millis(1)).as_secs_f32();
    (bytes as f32 / 1024.0) / secs
}
