//! Configuration management

use anyhow::{Context, Result};
use monitor::MonitorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    /// Wireless interface to watch
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_probe_delay_ms")]
    pub probe_delay_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetsConfig {
    #[serde(default = "default_ping_host")]
    pub ping_host: String,
    #[serde(default = "default_ping_port")]
    pub ping_port: u16,
    /// Checked with an HTTP GET every `http_check_every` ticks when set
    #[serde(default)]
    pub http_url: Option<String>,
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
    #[serde(default = "default_http_check_every")]
    pub http_check_every: u64,
    #[serde(default = "default_captive_portal_url")]
    pub captive_portal_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_latency_threshold_ms")]
    pub latency_threshold_ms: i32,
    #[serde(default = "default_jitter_threshold_ms")]
    pub jitter_threshold_ms: f32,
    #[serde(default = "default_packet_loss_threshold_pct")]
    pub packet_loss_threshold_pct: u8,
    #[serde(default = "default_min_signal_score")]
    pub min_signal_score: u8,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Print the snapshot as JSON instead of a summary line
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_update_interval_ms() -> u64 {
    5000
}

fn default_interface() -> String {
    "wlan0".to_string()
}

fn default_sample_size() -> usize {
    monitor::DEFAULT_SAMPLE_SIZE
}

fn default_probe_delay_ms() -> u64 {
    monitor::PROBE_DELAY.as_millis() as u64
}

fn default_connect_timeout_ms() -> u64 {
    monitor::CONNECT_TIMEOUT.as_millis() as u64
}

fn default_history_size() -> usize {
    monitor::MAX_HISTORY_ENTRIES
}

fn default_ping_host() -> String {
    monitor::DEFAULT_HOST.to_string()
}

fn default_ping_port() -> u16 {
    monitor::PING_PORT
}

fn default_http_timeout_ms() -> u64 {
    monitor::DEFAULT_HTTP_TIMEOUT.as_millis() as u64
}

fn default_http_check_every() -> u64 {
    1
}

fn default_captive_portal_url() -> String {
    monitor::CAPTIVE_PORTAL_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_latency_threshold_ms() -> i32 {
    200
}

fn default_jitter_threshold_ms() -> f32 {
    30.0
}

fn default_packet_loss_threshold_pct() -> u8 {
    10
}

fn default_min_signal_score() -> u8 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval_ms(),
            interface: default_interface(),
            sample_size: default_sample_size(),
            probe_delay_ms: default_probe_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            history_size: default_history_size(),
        }
    }
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            ping_host: default_ping_host(),
            ping_port: default_ping_port(),
            http_url: None,
            http_timeout_ms: default_http_timeout_ms(),
            http_check_every: default_http_check_every(),
            captive_portal_url: default_captive_portal_url(),
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latency_threshold_ms: default_latency_threshold_ms(),
            jitter_threshold_ms: default_jitter_threshold_ms(),
            packet_loss_threshold_pct: default_packet_loss_threshold_pct(),
            min_signal_score: default_min_signal_score(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .with_context(|| "Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.general.update_interval_ms == 0 {
            anyhow::bail!("general.update_interval_ms must be greater than 0");
        }
        if self.general.sample_size == 0 {
            anyhow::bail!("general.sample_size must be at least 1");
        }
        if self.general.interface.is_empty() {
            anyhow::bail!("general.interface must not be empty");
        }
        if self.targets.ping_host.is_empty() {
            anyhow::bail!("targets.ping_host must not be empty");
        }
        if self.targets.http_check_every == 0 {
            anyhow::bail!("targets.http_check_every must be at least 1");
        }
        Ok(())
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            sample_size: self.general.sample_size,
            probe_delay: Duration::from_millis(self.general.probe_delay_ms),
            connect_timeout: Duration::from_millis(self.general.connect_timeout_ms),
            ping_port: self.targets.ping_port,
            history_capacity: self.general.history_size,
        }
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.general.update_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.targets.http_timeout_ms)
    }
}
