//! Default targets, sizes and timings

use std::time::Duration;

/// Host probed by the ping test when none is given
pub const DEFAULT_HOST: &str = "google.com";

/// Port used for TCP connect probes
pub const PING_PORT: u16 = 80;

/// Number of connect probes per ping test
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Pause between two consecutive connect probes
pub const PROBE_DELAY: Duration = Duration::from_millis(50);

/// Upper bound for a single connect probe
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Maximum number of signal samples kept in history
pub const MAX_HISTORY_ENTRIES: usize = 20;

/// Timeout for `test_connection` when the caller has no preference
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_millis(3000);

/// Timeout for throughput and captive portal requests
pub const THROUGHPUT_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoint that answers 204 when no portal intercepts traffic
pub const CAPTIVE_PORTAL_URL: &str = "http://clients3.google.com/generate_204";

/// Status returned by the captive portal probe endpoint
pub const NO_CONTENT: i32 = 204;

/// Read chunk for download streaming (bytes)
pub const DOWNLOAD_CHUNK_SIZE: usize = 128;

/// Dummy payload size for the upload test (bytes)
pub const UPLOAD_PAYLOAD_SIZE: usize = 512;

/// Byte the upload payload is filled with
pub const UPLOAD_FILL_BYTE: u8 = b'A';

/// Status code reported when the HTTP session cannot be set up
pub const HTTP_SESSION_FAILED: i32 = -1;
