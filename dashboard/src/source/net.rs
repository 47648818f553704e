use chrono::{
    DateTime,
    Utc,
};
use nanograph_config::NetDirection;
use std::sync::{
    Arc,
    Mutex,
    PoisonError,
};

/// Cumulative network counters at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetCounterSnapshot {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub captured_at: DateTime<Utc>,
}

/// Transfer rates between two snapshots, in KB/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetRates {
    pub sent_kbs: f64,
    pub recv_kbs: f64,
}

impl NetRates {
    pub fn get(&self, direction: NetDirection) -> f64 {
        match direction {
            NetDirection::Sent => self.sent_kbs,
            NetDirection::Received => self.recv_kbs,
        }
    }
}

impl NetCounterSnapshot {
    /// Rates since `previous`. `None` unless time moved forward.
    pub fn rates_since(&self, previous: &NetCounterSnapshot) -> Option<NetRates> {
        let elapsed = (self.captured_at - previous.captured_at).num_milliseconds() as f64 / 1_000.0;
        if elapsed <= 0.0 {
            return None;
        }
        let rate = |current: u64, before: u64| (current as f64 - before as f64) / elapsed / 1024.0;
        Some(NetRates {
            sent_kbs: rate(self.bytes_sent, previous.bytes_sent),
            recv_kbs: rate(self.bytes_recv, previous.bytes_recv),
        })
    }
}

/// The last snapshot taken, shared between the dashboard (which resets it
/// when the chart is cleared) and the polling task (which replaces it).
#[derive(Debug, Clone, Default)]
pub struct NetCounterCell(Arc<Mutex<Option<NetCounterSnapshot>>>);

impl NetCounterCell {
    pub fn get(&self) -> Option<NetCounterSnapshot> {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `next` and returns the snapshot it replaced.
    pub fn replace(&self, next: NetCounterSnapshot) -> Option<NetCounterSnapshot> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).replace(next)
    }

    pub fn reset(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}
