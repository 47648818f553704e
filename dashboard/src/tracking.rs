use crate::source::{
    MetricRequest,
    MetricSource,
};
use chrono::{
    DateTime,
    Utc,
};
use std::time::Duration;
use tokio::{
    sync::mpsc::UnboundedSender,
    time::MissedTickBehavior,
};
use tokio_util::sync::{
    CancellationToken,
    DropGuard,
};

/// Sent from a polling task to whoever owns the chart.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEvent {
    Sample { run: u64, value: f64, at: DateTime<Utc> },
    /// The run ended on its own because the stats service failed.
    Halted { run: u64, reason: String },
}

impl TrackingEvent {
    pub fn run(&self) -> u64 {
        match self {
            TrackingEvent::Sample { run, .. } | TrackingEvent::Halted { run, .. } => *run,
        }
    }
}

#[derive(Debug)]
struct TrackingRun {
    id: u64,
    _guard: DropGuard,
}

/// Owns at most one polling task at a time.
///
/// Every [`start`](Self::start) opens a new run with a higher id than any
/// before it. Dropping the controller stops the current run.
#[derive(Debug, Default)]
pub struct TrackingController {
    current: Option<TrackingRun>,
    last_run: u64,
}

impl TrackingController {
    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_run(&self) -> Option<u64> {
        self.current.as_ref().map(|run| run.id)
    }

    /// Stops whatever is running and starts polling `request` every
    /// `interval`, the first tick firing right away.
    pub fn start(
        &mut self,
        source: MetricSource,
        request: MetricRequest,
        interval: Duration,
        events: UnboundedSender<TrackingEvent>,
    ) -> u64 {
        self.stop();

        self.last_run += 1;
        let id = self.last_run;
        let cancel = CancellationToken::new();
        tokio::spawn(poll(id, source, request, interval, events, cancel.clone()));
        self.current = Some(TrackingRun {
            id,
            _guard: cancel.drop_guard(),
        });
        id
    }

    /// Cancels the current run. No further tick starts, a fetch already in
    /// flight still reports its sample. Returns whether a run was active.
    pub fn stop(&mut self) -> bool {
        match self.current.take() {
            Some(run) => {
                debug!(run = run.id, "Stopping tracking");
                true
            }
            None => false,
        }
    }

    /// Marks `run` as ended by its task. Returns false for a run that is not
    /// the current one.
    pub fn halted(&mut self, run: u64) -> bool {
        if self.current_run() == Some(run) {
            self.current = None;
            true
        } else {
            false
        }
    }
}

async fn poll(
    run: u64,
    source: MetricSource,
    request: MetricRequest,
    interval: Duration,
    events: UnboundedSender<TrackingEvent>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(run, stat = %request.stat, interval_ms = interval.as_millis() as u64, "Tracking started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match source.sample(&request).await {
            Ok(Some(value)) => {
                let sample = TrackingEvent::Sample {
                    run,
                    value,
                    at: Utc::now(),
                };
                if events.send(sample).is_err() {
                    debug!(run, "Event receiver dropped");
                    break;
                }
            }
            Ok(None) => {}
            Err(err) if err.is_fatal() => {
                error!(run, error = %err, "Stopping tracking");
                let _ = events.send(TrackingEvent::Halted {
                    run,
                    reason: err.to_string(),
                });
                break;
            }
            Err(err) => warn!(run, error = %err, "Skipping tick"),
        }
    }

    debug!(run, "Tracking task finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{
        fake::FakeStatsApi,
        NetCounterCell,
    };
    use nanograph_config::{
        MetricId,
        Settings,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::mpsc::{
        self,
        UnboundedReceiver,
    };

    fn fixture() -> (Arc<FakeStatsApi>, MetricSource, MetricRequest) {
        let api = Arc::new(FakeStatsApi::default());
        api.push_stats(json!({ "cpu_percent": 42.0 }));
        let source = MetricSource::new(api.clone(), NetCounterCell::default());
        let request = MetricRequest {
            stat: MetricId::CpuPercent,
            ..MetricRequest::from(&Settings::default())
        };
        (api, source, request)
    }

    fn drain(rx: &mut UnboundedReceiver<TrackingEvent>) -> Vec<TrackingEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_fires_immediately_then_every_interval() {
        let (api, source, request) = fixture();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = TrackingController::default();

        let run = controller.start(source, request, Duration::from_secs(1), tx);
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert!(controller.stop());
        tokio::time::sleep(Duration::from_secs(5)).await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 4);
        assert!(events
            .iter()
            .all(|event| matches!(event, TrackingEvent::Sample { run: r, value, .. } if *r == run && *value == 42.0)));
        assert_eq!(api.calls().stats, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_leaves_a_single_active_run() {
        let (_api, source, request) = fixture();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = TrackingController::default();

        let first = controller.start(source.clone(), request.clone(), Duration::from_secs(1), tx.clone());
        let second = controller.start(source, request, Duration::from_secs(1), tx);
        assert!(second > first);
        assert_eq!(controller.current_run(), Some(second));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        controller.stop();

        let runs = drain(&mut rx).iter().map(TrackingEvent::run).collect::<Vec<_>>();
        assert_eq!(runs, vec![second; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn stats_failure_halts_the_run() {
        let (api, source, request) = fixture();
        api.set_failing(true);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = TrackingController::default();

        let run = controller.start(source, request, Duration::from_secs(1), tx);
        tokio::time::sleep(Duration::from_secs(3)).await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], TrackingEvent::Halted { run: r, .. } if *r == run));
        assert_eq!(api.calls().stats, 1);

        assert!(controller.halted(run));
        assert!(!controller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn halted_is_ignored_for_a_stale_run() {
        let (_api, source, request) = fixture();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut controller = TrackingController::default();

        let old = controller.start(source.clone(), request.clone(), Duration::from_secs(1), tx.clone());
        let new = controller.start(source, request, Duration::from_secs(1), tx);

        assert!(!controller.halted(old));
        assert_eq!(controller.current_run(), Some(new));
    }

    #[tokio::test(start_paused = true)]
    async fn ping_failures_only_skip_ticks() {
        let (api, source, _) = fixture();
        api.set_failing(true);
        let request = MetricRequest {
            stat: MetricId::PingLatencyMs,
            ..MetricRequest::from(&Settings::default())
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = TrackingController::default();

        controller.start(source, request, Duration::from_secs(1), tx);
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert!(controller.is_running());
        assert_eq!(drain(&mut rx), vec![]);
        assert_eq!(api.calls().ping, 3);
    }
}
