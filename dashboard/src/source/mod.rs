//! Turns a metric selection into one numeric reading per tick.

#[cfg(test)]
pub(crate) mod fake;
mod http;
mod net;
mod payload;

use chrono::{
    DateTime,
    Utc,
};
pub use http::HttpStatsClient;
use nanograph_config::{
    MetricId,
    MetricKind,
    Settings,
    DEFAULT_PING_HOST,
};
pub use net::{
    NetCounterCell,
    NetCounterSnapshot,
    NetRates,
};
pub use payload::{
    PingResponse,
    ProcessStatsResponse,
    Stats,
};
use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
};

pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = eyre::Result<T>> + Send + 'a>>;

/// The local stats service.
pub trait StatsApi: Send + Sync + fmt::Debug {
    /// `GET /stats`
    fn stats(&self) -> ApiFuture<'_, Stats>;

    /// `GET /ping?host=`
    fn ping<'a>(&'a self, host: &'a str) -> ApiFuture<'a, PingResponse>;

    /// `GET /process_stats?pid=&include_children=`
    fn process_stats<'a>(&'a self, pid: &'a str, include_children: bool) -> ApiFuture<'a, ProcessStatsResponse>;

    /// `POST /shutdown`
    fn shutdown(&self) -> ApiFuture<'_, ()>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to fetch system stats: {0:#}")]
    Stats(eyre::Report),
    #[error("Failed to ping {host}: {report:#}")]
    Ping { host: String, report: eyre::Report },
    #[error("Failed to fetch stats for process {pid}: {report:#}")]
    Process { pid: String, report: eyre::Report },
}

impl SourceError {
    /// Losing `/stats` means the service is gone and polling stops. Ping and
    /// process lookups fail for reasons local to their target.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Stats(_))
    }
}

/// What to sample, captured when tracking starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRequest {
    pub stat: MetricId,
    pub ping_host: String,
    pub pid: String,
    pub include_children: bool,
}

impl From<&Settings> for MetricRequest {
    fn from(settings: &Settings) -> Self {
        Self {
            stat: settings.stat,
            ping_host: settings.ping_host.clone(),
            pid: settings.pid.clone(),
            include_children: settings.include_children,
        }
    }
}

impl MetricRequest {
    /// The host to ping, falling back to the default when left blank.
    pub fn ping_host(&self) -> &str {
        match self.ping_host.trim() {
            "" => DEFAULT_PING_HOST,
            host => host,
        }
    }

    pub fn pid(&self) -> Option<&str> {
        Some(self.pid.trim()).filter(|pid| !pid.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct MetricSource {
    api: Arc<dyn StatsApi>,
    net: NetCounterCell,
}

impl MetricSource {
    pub fn new(api: Arc<dyn StatsApi>, net: NetCounterCell) -> Self {
        Self { api, net }
    }

    /// Fetches one reading. `Ok(None)` means there is nothing to plot this
    /// tick, which is not an error.
    pub async fn sample(&self, request: &MetricRequest) -> Result<Option<f64>, SourceError> {
        self.sample_with_clock(request, Utc::now).await
    }

    pub async fn sample_with_clock(
        &self,
        request: &MetricRequest,
        now: impl FnOnce() -> DateTime<Utc> + Send,
    ) -> Result<Option<f64>, SourceError> {
        match request.stat.kind() {
            MetricKind::Ping => {
                let host = request.ping_host();
                let response = self.api.ping(host).await.map_err(|report| SourceError::Ping {
                    host: host.to_string(),
                    report,
                })?;
                Ok(Some(response.latency_ms))
            }

            MetricKind::Process => {
                let Some(pid) = request.pid() else {
                    debug!("No PID entered, skipping tick");
                    return Ok(None);
                };
                let response = self
                    .api
                    .process_stats(pid, request.include_children)
                    .await
                    .map_err(|report| SourceError::Process {
                        pid: pid.to_string(),
                        report,
                    })?;
                Ok(Some(response.memory_mb))
            }

            MetricKind::NetRate(direction) => {
                let stats = self.api.stats().await.map_err(SourceError::Stats)?;
                let Some((bytes_sent, bytes_recv)) = stats.net_bytes() else {
                    debug!("Stats carry no network counters");
                    return Ok(None);
                };
                let current = NetCounterSnapshot {
                    bytes_sent,
                    bytes_recv,
                    captured_at: now(),
                };
                let Some(previous) = self.net.replace(current) else {
                    trace!("Primed network counters");
                    return Ok(None);
                };
                Ok(current.rates_since(&previous).map(|rates| rates.get(direction)))
            }

            MetricKind::General => {
                let stats = self.api.stats().await.map_err(SourceError::Stats)?;
                let value = stats.value(request.stat);
                if value.is_none() {
                    trace!(stat = %request.stat, "Stat missing from response");
                }
                Ok(value)
            }
        }
    }
}
