use nanograph_config::MetricId;
use serde::Deserialize;
use serde_json::{
    Map,
    Value,
};

/// The `/stats` object. Kept as a map since the service reports whatever the
/// host platform offers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Stats(Map<String, Value>);

impl Stats {
    /// The numeric value for `metric`, trying each of its keys in order.
    /// Absent keys and non-numeric values yield `None`.
    pub fn value(&self, metric: MetricId) -> Option<f64> {
        metric.stats_keys().iter().find_map(|key| self.0.get(*key)?.as_f64())
    }

    /// Cumulative `(sent, received)` network byte counters.
    pub fn net_bytes(&self) -> Option<(u64, u64)> {
        Some((self.counter("net_bytes_sent")?, self.counter("net_bytes_recv")?))
    }

    fn counter(&self, key: &str) -> Option<u64> {
        let value = self.0.get(key)?;
        value
            .as_u64()
            .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
    }
}

impl TryFrom<Value> for Stats {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
    }
}

/// `/ping?host=`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PingResponse {
    #[serde(default)]
    pub host: Option<String>,
    pub latency_ms: f64,
}

/// `/process_stats?pid=&include_children=`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessStatsResponse {
    #[serde(default)]
    pub pid: Option<i64>,
    pub memory_mb: f64,
}
