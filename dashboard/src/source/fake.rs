use super::{
    ApiFuture,
    PingResponse,
    ProcessStatsResponse,
    Stats,
    StatsApi,
};
use eyre::bail;
use serde_json::Value;
use std::{
    collections::VecDeque,
    sync::Mutex,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Calls {
    pub stats: usize,
    pub ping: usize,
    pub process_stats: usize,
    pub shutdown: usize,
}

#[derive(Debug, Default)]
struct State {
    stats: VecDeque<Value>,
    failing: bool,
    pinged_hosts: Vec<String>,
    calls: Calls,
}

/// In-memory stand-in for the stats service.
///
/// Queued `/stats` responses are served in order; the last one repeats.
#[derive(Debug, Default)]
pub(crate) struct FakeStatsApi {
    state: Mutex<State>,
}

impl FakeStatsApi {
    pub fn push_stats(&self, value: Value) {
        self.state.lock().unwrap().stats.push_back(value);
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls
    }

    pub fn pinged_hosts(&self) -> Vec<String> {
        self.state.lock().unwrap().pinged_hosts.clone()
    }

    pub fn latency_ms(&self) -> f64 {
        12.5
    }

    pub fn memory_mb(&self) -> f64 {
        256.0
    }

    fn next_stats(&self) -> eyre::Result<Stats> {
        let mut state = self.state.lock().unwrap();
        state.calls.stats += 1;
        if state.failing {
            bail!("connection refused");
        }
        let value = if state.stats.len() > 1 {
            state.stats.pop_front()
        } else {
            state.stats.front().cloned()
        };
        Ok(Stats::try_from(value.unwrap_or_else(|| Value::Object(Default::default())))?)
    }
}

impl StatsApi for FakeStatsApi {
    fn stats(&self) -> ApiFuture<'_, Stats> {
        Box::pin(async move { self.next_stats() })
    }

    fn ping<'a>(&'a self, host: &'a str) -> ApiFuture<'a, PingResponse> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.calls.ping += 1;
            state.pinged_hosts.push(host.to_string());
            if state.failing {
                bail!("host unreachable");
            }
            Ok(PingResponse {
                host: Some(host.to_string()),
                latency_ms: self.latency_ms(),
            })
        })
    }

    fn process_stats<'a>(&'a self, pid: &'a str, _include_children: bool) -> ApiFuture<'a, ProcessStatsResponse> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.calls.process_stats += 1;
            if state.failing {
                bail!("no such process");
            }
            Ok(ProcessStatsResponse {
                pid: pid.parse().ok(),
                memory_mb: self.memory_mb(),
            })
        })
    }

    fn shutdown(&self) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.calls.shutdown += 1;
            if state.failing {
                bail!("connection refused");
            }
            Ok(())
        })
    }
}
