//! Threshold alerts on the latest snapshot

use crate::config::AlertsConfig;
use monitor::Snapshot;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Every probe in the batch failed
    Unreachable,
    HighLatency { latency_ms: i32, threshold_ms: i32 },
    HighJitter { jitter_ms: f32, threshold_ms: f32 },
    PacketLoss { loss_pct: u8, threshold_pct: u8 },
    WeakSignal { score: u8, rssi: i32, min_score: u8 },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::Unreachable => write!(f, "UNREACHABLE: all probes failed"),
            Alert::HighLatency { latency_ms, threshold_ms } => write!(
                f,
                "HIGH LATENCY: {}ms (threshold: {}ms)",
                latency_ms, threshold_ms
            ),
            Alert::HighJitter { jitter_ms, threshold_ms } => write!(
                f,
                "HIGH JITTER: {:.2}ms (threshold: {:.2}ms)",
                jitter_ms, threshold_ms
            ),
            Alert::PacketLoss { loss_pct, threshold_pct } => write!(
                f,
                "PACKET LOSS: {}% (threshold: {}%)",
                loss_pct, threshold_pct
            ),
            Alert::WeakSignal { score, rssi, min_score } => write!(
                f,
                "WEAK SIGNAL: score {} at {}dBm (minimum: {})",
                score, rssi, min_score
            ),
        }
    }
}

pub struct AlertManager {
    config: AlertsConfig,
}

impl AlertManager {
    pub fn new(config: AlertsConfig) -> Self {
        Self { config }
    }

    /// Check the snapshot against thresholds, logging each alert raised
    pub fn check(&self, snapshot: &Snapshot) -> Vec<Alert> {
        if !self.config.enabled {
            return Vec::new();
        }

        let mut alerts = Vec::new();

        if snapshot.latency < 0 {
            alerts.push(Alert::Unreachable);
        } else if snapshot.latency > self.config.latency_threshold_ms {
            alerts.push(Alert::HighLatency {
                latency_ms: snapshot.latency,
                threshold_ms: self.config.latency_threshold_ms,
            });
        }

        if snapshot.jitter > self.config.jitter_threshold_ms {
            alerts.push(Alert::HighJitter {
                jitter_ms: snapshot.jitter,
                threshold_ms: self.config.jitter_threshold_ms,
            });
        }

        // Total loss is already reported as unreachable
        if snapshot.latency >= 0 && snapshot.packet_loss > self.config.packet_loss_threshold_pct {
            alerts.push(Alert::PacketLoss {
                loss_pct: snapshot.packet_loss,
                threshold_pct: self.config.packet_loss_threshold_pct,
            });
        }

        if snapshot.signal_score < self.config.min_signal_score {
            alerts.push(Alert::WeakSignal {
                score: snapshot.signal_score,
                rssi: snapshot.rssi,
                min_score: self.config.min_signal_score,
            });
        }

        for alert in &alerts {
            warn!("{}", alert);
        }

        alerts
    }
}
