//! Output and display management

use crate::config::OutputConfig;
use anyhow::{Context, Result};
use monitor::{ConnectionInfo, NetworkInfo, SignalSample, Snapshot};
use std::path::Path;

pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn update(&self, snapshot: &Snapshot) -> Result<()> {
        if self.config.json {
            println!("{}", serde_json::to_string(snapshot)?);
        } else {
            println!("[{}] {}", timestamp(), summary_line(snapshot));
        }
        Ok(())
    }

    pub fn connection(&self, info: &ConnectionInfo) -> Result<()> {
        if self.config.json {
            println!("{}", serde_json::to_string(info)?);
        } else if info.success {
            println!(
                "[{}] {} -> {} in {}ms{}",
                timestamp(),
                info.url,
                info.status_code,
                info.response_time,
                if info.redirected {
                    format!(" (redirect: {})", info.redirect_location)
                } else {
                    String::new()
                }
            );
        } else {
            println!(
                "[{}] {} -> FAILED {} {}",
                timestamp(),
                info.url,
                info.status_code,
                info.error_message
            );
        }
        Ok(())
    }

    pub fn networks(&self, networks: &[NetworkInfo]) -> Result<()> {
        if self.config.json {
            println!("{}", serde_json::to_string(networks)?);
            return Ok(());
        }

        println!("{:<32} {:>6} {:>4}  {}", "SSID", "RSSI", "CH", "SECURITY");
        for n in networks {
            let ssid = if n.ssid.is_empty() { "<hidden>" } else { n.ssid.as_str() };
            println!("{:<32} {:>6} {:>4}  {}", ssid, n.rssi, n.channel, n.encryption);
        }
        Ok(())
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn summary_line(s: &Snapshot) -> String {
    let latency = if s.latency < 0 {
        "TIMEOUT".to_string()
    } else {
        format!("{}ms", s.latency)
    };

    format!(
        "rssi={}dBm score={} latency={} jitter={:.2}ms loss={}%",
        s.rssi, s.signal_score, latency, s.jitter, s.packet_loss
    )
}

/// Export signal history as CSV (`rssi,score,time`)
pub fn export_csv(samples: &[SignalSample], output_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("Failed to create {:?}", output_path))?;

    for sample in samples {
        writer.serialize(sample)?;
    }

    writer.flush()?;

    Ok(())
}
