//! Signal scoring and bounded sample history

use serde::Serialize;
use std::collections::VecDeque;

/// Map RSSI (dBm) onto a 0-100 quality score.
///
/// -50 dBm and stronger is 100, -100 dBm and weaker is 0, linear in between.
pub fn signal_score(rssi: i32) -> u8 {
    if rssi >= -50 {
        100
    } else if rssi <= -100 {
        0
    } else {
        (2 * (rssi + 100)) as u8
    }
}

/// One recorded signal reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalSample {
    pub rssi: i32,
    #[serde(rename = "score")]
    pub signal_score: u8,
    /// Milliseconds since the monitor was created
    #[serde(rename = "time")]
    pub timestamp: u64,
}

/// FIFO of signal samples that never grows past its capacity
#[derive(Debug, Clone)]
pub struct SignalHistory {
    samples: VecDeque<SignalSample>,
    capacity: usize,
}

impl SignalHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full
    pub fn push(&mut self, sample: SignalSample) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &SignalSample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&SignalSample> {
        self.samples.back()
    }

    pub fn to_vec(&self) -> Vec<SignalSample> {
        self.samples.iter().copied().collect()
    }
}

impl Default for SignalHistory {
    fn default() -> Self {
        Self::new(crate::constants::MAX_HISTORY_ENTRIES)
    }
}
