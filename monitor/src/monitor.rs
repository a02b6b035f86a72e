//! Connection quality monitor
//!
//! Holds the latest metrics and signal history, refreshed by caller-driven
//! `update()` ticks. Every call blocks for the duration of its network I/O.

use crate::constants::*;
use crate::http::{self, ConnectionInfo};
use crate::ping::{self, PingStats};
use crate::platform::{NetClient, NetworkInfo, WifiStatus};
use crate::report;
use crate::signal::{signal_score, SignalHistory, SignalSample};
use serde::Serialize;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tunables for the measurement pipeline
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Connect probes per ping test (at least 1)
    pub sample_size: usize,
    pub probe_delay: Duration,
    pub connect_timeout: Duration,
    pub ping_port: u16,
    pub history_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            probe_delay: PROBE_DELAY,
            connect_timeout: CONNECT_TIMEOUT,
            ping_port: PING_PORT,
            history_capacity: MAX_HISTORY_ENTRIES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Connected,
    Disconnected,
}

impl Connectivity {
    fn from_link(connected: bool) -> Self {
        if connected {
            Connectivity::Connected
        } else {
            Connectivity::Disconnected
        }
    }
}

/// Latest measured values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Average connect RTT in ms, -1 when every probe failed
    pub latency: i32,
    #[serde(serialize_with = "report::two_decimals")]
    pub jitter: f32,
    pub packet_loss: u8,
    pub signal_score: u8,
    pub rssi: i32,
    #[serde(rename = "httpStatus")]
    pub http_status: i32,
    pub http_response_time: i64,
}

type Hook = Box<dyn FnMut()>;

/// WiFi connection monitor over a status provider `W` and network client `N`
pub struct Monitor<W, N> {
    wifi: W,
    client: N,
    config: MonitorConfig,
    host: String,
    snapshot: Snapshot,
    disconnect_count: u32,
    last_disconnect_time: u64,
    last_status: Connectivity,
    history: SignalHistory,
    started: Instant,
    on_disconnect: Option<Hook>,
    on_reconnect: Option<Hook>,
}

impl<W: WifiStatus, N: NetClient> Monitor<W, N> {
    pub fn new(wifi: W, client: N) -> Self {
        Self::with_config(wifi, client, MonitorConfig::default())
    }

    pub fn with_config(wifi: W, client: N, mut config: MonitorConfig) -> Self {
        config.sample_size = config.sample_size.max(1);
        let history = SignalHistory::new(config.history_capacity);

        Self {
            wifi,
            client,
            config,
            host: DEFAULT_HOST.to_string(),
            snapshot: Snapshot::default(),
            disconnect_count: 0,
            last_disconnect_time: 0,
            last_status: Connectivity::Connected,
            history,
            started: Instant::now(),
            on_disconnect: None,
            on_reconnect: None,
        }
    }

    /// Reset all metrics, counters and history and bind the ping target
    pub fn begin(&mut self, host: &str) {
        self.host = host.to_string();
        self.snapshot = Snapshot {
            rssi: self.wifi.rssi(),
            ..Snapshot::default()
        };
        self.disconnect_count = 0;
        self.last_disconnect_time = 0;
        self.last_status = Connectivity::Connected;
        self.history.clear();

        info!(
            "Monitor started: host={}, samples={}, history={}",
            self.host, self.config.sample_size, self.history.capacity()
        );
    }

    /// Replace the network client, returning the previous one
    pub fn set_client(&mut self, client: N) -> N {
        std::mem::replace(&mut self.client, client)
    }

    /// Called once per Connected -> Disconnected transition
    pub fn on_disconnect(&mut self, hook: impl FnMut() + 'static) {
        self.on_disconnect = Some(Box::new(hook));
    }

    /// Called once per Disconnected -> Connected transition
    pub fn on_reconnect(&mut self, hook: impl FnMut() + 'static) {
        self.on_reconnect = Some(Box::new(hook));
    }

    /// One measurement tick: link state, ping test, signal score, history
    pub fn update(&mut self) {
        self.update_wifi_status();
        self.ping_test();
        self.calculate_signal_score();
        self.record_signal_sample();
    }

    fn update_wifi_status(&mut self) {
        let current = Connectivity::from_link(self.wifi.is_connected());

        match (self.last_status, current) {
            (Connectivity::Connected, Connectivity::Disconnected) => {
                self.disconnect_count += 1;
                self.last_disconnect_time = self.millis();
                warn!("WiFi disconnected (count: {})", self.disconnect_count);
                if let Some(hook) = self.on_disconnect.as_mut() {
                    hook();
                }
            }
            (Connectivity::Disconnected, Connectivity::Connected) => {
                info!("WiFi reconnected");
                if let Some(hook) = self.on_reconnect.as_mut() {
                    hook();
                }
            }
            _ => {}
        }

        self.last_status = current;
        self.snapshot.rssi = self.wifi.rssi();
    }

    fn ping_test(&mut self) {
        let rtts = ping::run_probes(
            &mut self.client,
            &self.host,
            self.config.ping_port,
            self.config.sample_size,
            self.config.connect_timeout,
            self.config.probe_delay,
        );
        let stats = PingStats::from_rtts(&rtts);

        self.snapshot.latency = stats.latency;
        self.snapshot.jitter = stats.jitter;
        self.snapshot.packet_loss = stats.packet_loss;

        debug!(
            "Ping {}: latency={}ms jitter={:.2}ms loss={}% ({}/{} ok)",
            self.host, stats.latency, stats.jitter, stats.packet_loss, stats.successes, stats.sample_size
        );
    }

    fn calculate_signal_score(&mut self) {
        self.snapshot.signal_score = signal_score(self.snapshot.rssi);
    }

    /// Append the current RSSI and score to history
    pub fn record_signal_sample(&mut self) {
        let sample = SignalSample {
            rssi: self.snapshot.rssi,
            signal_score: self.snapshot.signal_score,
            timestamp: self.millis(),
        };
        self.history.push(sample);
    }

    /// Milliseconds since this monitor was created
    fn millis(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// GET `url` and record its status and timing as the latest HTTP check
    pub fn test_connection(&mut self, url: &str, timeout: Duration) -> ConnectionInfo {
        let info = http::test_connection(&mut self.client, url, timeout);
        if info.attempted() {
            self.snapshot.http_status = info.status_code;
            self.snapshot.http_response_time = info.response_time;
        }
        info
    }

    /// Download speed in KB/s, 0 on failure
    pub fn test_download_speed(&mut self, url: &str) -> f32 {
        http::download_speed(&mut self.client, url)
    }

    /// Upload speed in KB/s, 0 on failure
    pub fn test_upload_speed(&mut self, url: &str) -> f32 {
        http::upload_speed(&mut self.client, url)
    }

    pub fn is_captive_portal_active(&mut self, url: &str) -> bool {
        http::captive_portal_active(&mut self.client, url)
    }

    pub fn scan_networks(&mut self) -> Vec<NetworkInfo> {
        match self.wifi.scan() {
            Ok(networks) => {
                debug!("Scan found {} networks", networks.len());
                networks
            }
            Err(e) => {
                warn!("Network scan failed: {}", e);
                Vec::new()
            }
        }
    }

    pub fn latency(&self) -> i32 {
        self.snapshot.latency
    }

    pub fn jitter(&self) -> f32 {
        self.snapshot.jitter
    }

    pub fn packet_loss(&self) -> u8 {
        self.snapshot.packet_loss
    }

    pub fn signal_score(&self) -> u8 {
        self.snapshot.signal_score
    }

    pub fn rssi(&self) -> i32 {
        self.snapshot.rssi
    }

    pub fn http_status_code(&self) -> i32 {
        self.snapshot.http_status
    }

    pub fn http_response_time(&self) -> i64 {
        self.snapshot.http_response_time
    }

    pub fn disconnect_count(&self) -> u32 {
        self.disconnect_count
    }

    /// Milliseconds since creation at the last disconnect, 0 if none yet
    pub fn last_disconnect_time(&self) -> u64 {
        self.last_disconnect_time
    }

    pub fn local_ip(&self) -> Option<IpAddr> {
        self.wifi.local_ip()
    }

    pub fn connectivity(&self) -> Connectivity {
        self.last_status
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn history(&self) -> &SignalHistory {
        &self.history
    }

    pub fn signal_history(&self) -> Vec<SignalSample> {
        self.history.to_vec()
    }

    pub fn clear_signal_history(&mut self) {
        self.history.clear();
    }

    pub fn signal_history_json(&self) -> String {
        report::history_json(self.history.iter())
    }

    pub fn to_json(&self) -> String {
        report::object_json(&self.snapshot)
    }

    pub fn connection_to_json(&self, info: &ConnectionInfo) -> String {
        report::connection_json(info)
    }

    pub fn wifi_mut(&mut self) -> &mut W {
        &mut self.wifi
    }

    pub fn client_mut(&mut self) -> &mut N {
        &mut self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::platform::{Encryption, HttpResponse};
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::net::Ipv4Addr;
    use std::rc::Rc;

    struct FakeWifi {
        rssi: i32,
        connected: bool,
        networks: Option<Vec<NetworkInfo>>,
    }

    impl FakeWifi {
        fn new(rssi: i32) -> Self {
            Self {
                rssi,
                connected: true,
                networks: Some(Vec::new()),
            }
        }
    }

    impl WifiStatus for FakeWifi {
        fn rssi(&self) -> i32 {
            self.rssi
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn local_ip(&self) -> Option<IpAddr> {
            self.connected.then(|| IpAddr::V4(Ipv4Addr::new(192, 168, 1, 42)))
        }

        fn scan(&mut self) -> Result<Vec<NetworkInfo>, PlatformError> {
            self.networks
                .clone()
                .ok_or_else(|| PlatformError::Scan("radio busy".into()))
        }
    }

    /// Connect outcomes cycle through `pattern`; GETs pop from `responses`
    #[derive(Default)]
    struct FakeNet {
        pattern: Vec<bool>,
        connects: usize,
        hosts: Vec<String>,
        responses: VecDeque<Result<HttpResponse, PlatformError>>,
    }

    impl FakeNet {
        fn reachable() -> Self {
            Self {
                pattern: vec![true],
                ..Self::default()
            }
        }
    }

    impl NetClient for FakeNet {
        fn tcp_connect(&mut self, host: &str, _port: u16, _timeout: Duration) -> Result<(), PlatformError> {
            let ok = self.pattern[self.connects % self.pattern.len()];
            self.connects += 1;
            self.hosts.push(host.to_string());
            if ok {
                Ok(())
            } else {
                Err(PlatformError::Connect("refused".into()))
            }
        }

        fn get(&mut self, _url: &str, _timeout: Duration) -> Result<HttpResponse, PlatformError> {
            self.responses
                .pop_front()
                .unwrap_or_else(|| Err(PlatformError::Connect("no response scripted".into())))
        }

        fn post(&mut self, _url: &str, _body: &[u8], _timeout: Duration) -> Result<HttpResponse, PlatformError> {
            Ok(HttpResponse::empty(200))
        }
    }

    fn quick_config() -> MonitorConfig {
        MonitorConfig {
            probe_delay: Duration::ZERO,
            ..MonitorConfig::default()
        }
    }

    fn monitor(rssi: i32, net: FakeNet) -> Monitor<FakeWifi, FakeNet> {
        let mut m = Monitor::with_config(FakeWifi::new(rssi), net, quick_config());
        m.begin("example.com");
        m
    }

    #[test]
    fn test_begin_resets_state() {
        let mut m = monitor(-60, FakeNet::reachable());
        m.update();
        m.wifi_mut().connected = false;
        m.update();
        assert_eq!(m.disconnect_count(), 1);
        assert_eq!(m.history().len(), 2);

        m.begin("example.org");

        assert_eq!(m.host(), "example.org");
        assert_eq!(m.disconnect_count(), 0);
        assert_eq!(m.last_disconnect_time(), 0);
        assert!(m.signal_history().is_empty());
        assert_eq!(m.latency(), 0);
        assert_eq!(m.rssi(), -60);
        assert_eq!(m.http_status_code(), 0);
    }

    #[test]
    fn test_update_pings_configured_host() {
        let mut m = monitor(-60, FakeNet::reachable());
        m.update();

        assert_eq!(m.client_mut().connects, DEFAULT_SAMPLE_SIZE);
        assert!(m.client_mut().hosts.iter().all(|h| h == "example.com"));
        assert_eq!(m.packet_loss(), 0);
        assert!(m.latency() >= 0);
    }

    #[test]
    fn test_update_records_packet_loss() {
        let mut net = FakeNet::default();
        net.pattern = vec![true, true, false, true, true, false, true, true, false, true];
        let mut m = monitor(-60, net);

        m.update();

        assert_eq!(m.packet_loss(), 30);
    }

    #[test]
    fn test_all_probes_failed() {
        let mut net = FakeNet::default();
        net.pattern = vec![false];
        let mut m = monitor(-60, net);

        m.update();

        assert_eq!(m.latency(), -1);
        assert_eq!(m.jitter(), 0.0);
        assert_eq!(m.packet_loss(), 100);
    }

    #[test]
    fn test_update_scores_signal_and_records_sample() {
        let mut m = monitor(-75, FakeNet::reachable());
        m.update();

        assert_eq!(m.rssi(), -75);
        assert_eq!(m.signal_score(), 50);

        let history = m.signal_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].rssi, -75);
        assert_eq!(history[0].signal_score, 50);
    }

    #[test]
    fn test_history_bounded_across_updates() {
        let config = MonitorConfig {
            sample_size: 1,
            history_capacity: 5,
            ..quick_config()
        };
        let mut m = Monitor::with_config(FakeWifi::new(-40), FakeNet::reachable(), config);
        m.begin("example.com");

        for rssi in [-40, -45, -55, -65, -70, -85] {
            m.wifi_mut().rssi = rssi;
            m.update();
        }

        let rssis: Vec<i32> = m.signal_history().iter().map(|s| s.rssi).collect();
        assert_eq!(rssis, vec![-45, -55, -65, -70, -85]);
    }

    #[test]
    fn test_disconnect_counted_once_per_transition() {
        let disconnects = Rc::new(Cell::new(0));
        let reconnects = Rc::new(Cell::new(0));

        let mut m = monitor(-60, FakeNet::reachable());
        let d = disconnects.clone();
        m.on_disconnect(move || d.set(d.get() + 1));
        let r = reconnects.clone();
        m.on_reconnect(move || r.set(r.get() + 1));

        m.update();
        assert_eq!(m.disconnect_count(), 0);

        m.wifi_mut().connected = false;
        m.update();
        m.update();
        m.update();
        assert_eq!(m.disconnect_count(), 1);
        assert_eq!(disconnects.get(), 1);
        assert_eq!(reconnects.get(), 0);
        assert_eq!(m.connectivity(), Connectivity::Disconnected);

        m.wifi_mut().connected = true;
        m.update();
        m.update();
        assert_eq!(reconnects.get(), 1);

        m.wifi_mut().connected = false;
        m.update();
        assert_eq!(m.disconnect_count(), 2);
        assert_eq!(disconnects.get(), 2);
    }

    #[test]
    fn test_disconnect_without_hooks() {
        let mut m = monitor(-60, FakeNet::reachable());
        m.wifi_mut().connected = false;
        m.update();
        assert_eq!(m.disconnect_count(), 1);
        assert!(m.last_disconnect_time() <= m.signal_history()[0].timestamp);
        assert_eq!(m.local_ip(), None);
    }

    #[test]
    fn test_monitors_are_independent() {
        let mut a = monitor(-60, FakeNet::reachable());
        let mut b = monitor(-60, FakeNet::reachable());

        a.wifi_mut().connected = false;
        a.update();
        b.update();

        assert_eq!(a.disconnect_count(), 1);
        assert_eq!(b.disconnect_count(), 0);
    }

    #[test]
    fn test_connection_updates_http_stats() {
        let mut net = FakeNet::reachable();
        net.responses.push_back(Ok(HttpResponse::redirect(301, "https://example.com/")));
        let mut m = monitor(-60, net);

        let info = m.test_connection("http://example.com/", DEFAULT_HTTP_TIMEOUT);

        assert!(info.success);
        assert!(info.redirected);
        assert_eq!(m.http_status_code(), 301);
        assert_eq!(m.http_response_time(), info.response_time);
    }

    #[test]
    fn test_session_failure_leaves_http_stats() {
        let mut net = FakeNet::reachable();
        net.responses.push_back(Ok(HttpResponse::empty(200)));
        net.responses.push_back(Err(PlatformError::Session("bad url".into())));
        let mut m = monitor(-60, net);

        m.test_connection("http://example.com/", DEFAULT_HTTP_TIMEOUT);
        let info = m.test_connection("::", DEFAULT_HTTP_TIMEOUT);

        assert_eq!(info.status_code, -1);
        assert_eq!(info.response_time, -1);
        assert_eq!(m.http_status_code(), 200);
    }

    #[test]
    fn test_scan_networks() {
        let mut m = monitor(-60, FakeNet::reachable());
        m.wifi_mut().networks = Some(vec![NetworkInfo {
            ssid: "home".to_string(),
            rssi: -48,
            channel: 6,
            encryption: Encryption::Secured,
        }]);

        let networks = m.scan_networks();
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].ssid, "home");

        m.wifi_mut().networks = None;
        assert!(m.scan_networks().is_empty());
    }

    #[test]
    fn test_clear_history() {
        let mut m = monitor(-60, FakeNet::reachable());
        m.update();
        m.record_signal_sample();
        assert_eq!(m.signal_history().len(), 2);

        m.clear_signal_history();
        assert!(m.signal_history().is_empty());
        assert_eq!(m.signal_history_json(), "[]");
    }

    #[test]
    fn test_snapshot_json() {
        let mut net = FakeNet::reachable();
        net.responses.push_back(Ok(HttpResponse::empty(404)));
        let mut m = monitor(-75, net);
        m.update();
        m.test_connection("http://example.com/", DEFAULT_HTTP_TIMEOUT);

        let value: serde_json::Value = serde_json::from_str(&m.to_json()).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        for key in ["latency", "jitter", "packetLoss", "signalScore", "rssi", "httpStatus", "httpResponseTime"] {
            assert!(keys.contains(&key), "missing {}", key);
        }
        assert_eq!(keys.len(), 7);
        assert_eq!(value["signalScore"], 50);
        assert_eq!(value["rssi"], -75);
        assert_eq!(value["httpStatus"], 404);
    }

    #[test]
    fn test_borrowed_client() {
        let mut shared = FakeNet::reachable();
        {
            let mut m = Monitor::with_config(FakeWifi::new(-60), &mut shared, quick_config());
            m.begin("example.com");
            m.update();
        }
        assert_eq!(shared.connects, DEFAULT_SAMPLE_SIZE);
    }

    #[test]
    fn test_set_client_swaps() {
        let mut m = monitor(-60, FakeNet::reachable());
        let mut failing = FakeNet::default();
        failing.pattern = vec![false];

        let previous = m.set_client(failing);
        assert_eq!(previous.connects, 0);

        m.update();
        assert_eq!(m.packet_loss(), 100);
    }

    #[test]
    fn test_zero_sample_size_clamped() {
        let config = MonitorConfig {
            sample_size: 0,
            ..quick_config()
        };
        let mut m = Monitor::with_config(FakeWifi::new(-60), FakeNet::reachable(), config);
        m.begin("example.com");
        m.update();
        assert_eq!(m.client_mut().connects, 1);
    }
}
