//! TCP connect ping test

use crate::platform::NetClient;
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of one batch of connect probes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingStats {
    /// Average RTT of successful probes in ms, -1 when none succeeded
    pub latency: i32,
    /// Mean absolute difference between consecutive successful RTTs (ms)
    pub jitter: f32,
    /// Percentage of failed probes
    pub packet_loss: u8,
    pub successes: usize,
    pub sample_size: usize,
}

impl PingStats {
    /// Compute statistics from per-probe RTTs in probe order (`None` = failed).
    ///
    /// Failed probes are skipped entirely: the successful RTTs either side of a
    /// failure are treated as adjacent for jitter.
    pub fn from_rtts(rtts: &[Option<u64>]) -> Self {
        let sample_size = rtts.len();
        let successful: Vec<u64> = rtts.iter().flatten().copied().collect();
        let successes = successful.len();
        let failed = sample_size - successes;

        let packet_loss = if sample_size == 0 {
            0
        } else {
            (100 * failed / sample_size) as u8
        };

        let latency = if successes > 0 {
            (successful.iter().sum::<u64>() / successes as u64) as i32
        } else {
            -1
        };

        let jitter = if successes > 1 {
            let total: u64 = successful
                .windows(2)
                .map(|pair| pair[0].abs_diff(pair[1]))
                .sum();
            total as f32 / (successes - 1) as f32
        } else {
            0.0
        };

        Self {
            latency,
            jitter,
            packet_loss,
            successes,
            sample_size,
        }
    }
}

/// Run `count` sequential connect probes against `host:port`.
///
/// Returns the RTT of each probe in milliseconds, `None` for failures.
pub fn run_probes<N: NetClient + ?Sized>(
    client: &mut N,
    host: &str,
    port: u16,
    count: usize,
    connect_timeout: Duration,
    delay: Duration,
) -> Vec<Option<u64>> {
    let mut rtts = Vec::with_capacity(count);

    for i in 0..count {
        if i > 0 && !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let start = Instant::now();
        match client.tcp_connect(host, port, connect_timeout) {
            Ok(()) => {
                let rtt = start.elapsed().as_millis() as u64;
                debug!("Probe {}/{} {}:{} -> {}ms", i + 1, count, host, port, rtt);
                rtts.push(Some(rtt));
            }
            Err(e) => {
                debug!("Probe {}/{} {}:{} -> failed: {}", i + 1, count, host, port, e);
                rtts.push(None);
            }
        }
    }

    rtts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::platform::HttpResponse;

    struct ScriptedClient {
        outcomes: Vec<bool>,
        calls: Vec<(String, u16)>,
    }

    impl NetClient for ScriptedClient {
        fn tcp_connect(&mut self, host: &str, port: u16, _timeout: Duration) -> Result<(), PlatformError> {
            let ok = self.outcomes[self.calls.len()];
            self.calls.push((host.to_string(), port));
            if ok {
                Ok(())
            } else {
                Err(PlatformError::Connect("refused".into()))
            }
        }

        fn get(&mut self, _url: &str, _timeout: Duration) -> Result<HttpResponse, PlatformError> {
            unreachable!()
        }

        fn post(&mut self, _url: &str, _body: &[u8], _timeout: Duration) -> Result<HttpResponse, PlatformError> {
            unreachable!()
        }
    }

    #[test]
    fn test_failed_probe_excluded_from_jitter() {
        let stats = PingStats::from_rtts(&[Some(10), Some(12), Some(9), None, Some(15)]);

        // Only [10, 12, 9, 15] participate: |2| + |3| + |6| over 3 gaps
        assert_eq!(stats.successes, 4);
        assert_eq!(stats.latency, 11);
        assert!((stats.jitter - 11.0 / 3.0).abs() < 1e-4);
        assert_eq!(stats.packet_loss, 20);
    }

    #[test]
    fn test_packet_loss_three_of_ten() {
        let rtts = [
            Some(20), None, Some(22), Some(21), None,
            Some(20), Some(23), None, Some(20), Some(21),
        ];
        let stats = PingStats::from_rtts(&rtts);
        assert_eq!(stats.packet_loss, 30);
        assert_eq!(stats.sample_size, 10);
    }

    #[test]
    fn test_all_failed() {
        let stats = PingStats::from_rtts(&[None; 10]);
        assert_eq!(stats.latency, -1);
        assert_eq!(stats.jitter, 0.0);
        assert_eq!(stats.packet_loss, 100);
    }

    #[test]
    fn test_single_success_has_no_jitter() {
        let stats = PingStats::from_rtts(&[None, Some(42), None]);
        assert_eq!(stats.latency, 42);
        assert_eq!(stats.jitter, 0.0);
        assert_eq!(stats.packet_loss, 66);
    }

    #[test]
    fn test_latency_truncates() {
        let stats = PingStats::from_rtts(&[Some(10), Some(11)]);
        assert_eq!(stats.latency, 10);
        assert_eq!(stats.jitter, 1.0);
        assert_eq!(stats.packet_loss, 0);
    }

    #[test]
    fn test_run_probes_marks_failures() {
        let mut client = ScriptedClient {
            outcomes: vec![true, false, true],
            calls: Vec::new(),
        };

        let rtts = run_probes(&mut client, "example.com", 80, 3, Duration::from_secs(1), Duration::ZERO);

        assert_eq!(rtts.len(), 3);
        assert!(rtts[0].is_some());
        assert!(rtts[1].is_none());
        assert!(rtts[2].is_some());
        assert!(client.calls.iter().all(|(h, p)| h == "example.com" && *p == 80));
    }
}
