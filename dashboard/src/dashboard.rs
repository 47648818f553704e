use crate::{
    chart::{
        ChartModel,
        RgbColor,
        YBounds,
    },
    export::{
        self,
        ExportError,
        ExportFormat,
    },
    source::{
        MetricRequest,
        MetricSource,
        NetCounterCell,
        StatsApi,
    },
    tracking::{
        TrackingController,
        TrackingEvent,
    },
};
use chrono::Utc;
use nanograph_config::{
    MetricId,
    Mode,
    Settings,
    SettingsStore,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    future::Future,
    path::{
        Path,
        PathBuf,
    },
    sync::Arc,
    time::Duration,
};
use strum::Display;
use tokio::sync::mpsc::{
    self,
    UnboundedReceiver,
    UnboundedSender,
};

const TITLE: &str = "Nanograph";

/// Everything a user can ask the dashboard to do.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum Intent {
    SetMode(Mode),
    SelectMetric(MetricId),
    SetInterval(u64),
    SetPingHost(String),
    SetPid(String),
    SetIncludeChildren(bool),
    SetColor(String),
    /// Raw text from the value input. Anything that is not a number is dropped.
    AddValue(String),
    Undo,
    Restart,
    StartTracking,
    StopTracking,
    ToggleTracking,
    Export(ExportFormat),
}

/// Feedback for the user that does not belong in the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Info(message) | Notice::Error(message) => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

/// Which controls are offered right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub mode: Mode,
    pub mode_switch_enabled: bool,
    /// Metric, interval, host, PID and children inputs.
    pub selectors_enabled: bool,
    pub tracking: bool,
    pub manual_controls_visible: bool,
    pub auto_controls_visible: bool,
    pub ping_host_visible: bool,
    pub pid_visible: bool,
    /// A PID is needed but none was entered; ticks will plot nothing.
    pub pid_missing: bool,
}

/// The manual/automatic state machine. Owns the chart, the polling task and
/// the persisted settings, and keeps them consistent with each other.
#[derive(Debug)]
pub struct Dashboard {
    settings: Settings,
    store: SettingsStore,
    chart: ChartModel,
    tracking: TrackingController,
    net: NetCounterCell,
    api: Arc<dyn StatsApi>,
    events_tx: UnboundedSender<TrackingEvent>,
    export_dir: PathBuf,
}

impl Dashboard {
    /// Builds the dashboard from loaded settings and applies the stored mode.
    ///
    /// Samples from the polling task arrive on the returned receiver and are
    /// fed back through [`apply_tracking_event`](Self::apply_tracking_event).
    pub fn new(
        api: Arc<dyn StatsApi>,
        store: SettingsStore,
        mut settings: Settings,
        export_dir: PathBuf,
    ) -> (Self, UnboundedReceiver<TrackingEvent>) {
        let color = settings.color.parse::<RgbColor>().unwrap_or_else(|e| {
            warn!(color = %settings.color, error = %e, "Invalid stored color, using default");
            RgbColor::default()
        });
        settings.color = color.to_string();
        let mode = settings.mode;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut dashboard = Self {
            settings,
            store,
            chart: ChartModel::new(color),
            tracking: TrackingController::default(),
            net: NetCounterCell::default(),
            api,
            events_tx,
            export_dir,
        };
        dashboard.set_mode(mode);
        (dashboard, events_rx)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn chart(&self) -> &ChartModel {
        &self.chart
    }

    pub fn mode(&self) -> Mode {
        self.settings.mode
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.is_running()
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn title(&self) -> String {
        match self.settings.mode {
            Mode::Manual => format!("{TITLE} - {}", Mode::Manual.title()),
            Mode::Automatic => format!("{TITLE} - {}", self.settings.stat.label()),
        }
    }

    pub fn controls(&self) -> Controls {
        let tracking = self.tracking.is_running();
        let automatic = self.settings.mode == Mode::Automatic;
        let pid_visible = automatic && self.settings.stat.needs_pid();
        Controls {
            mode: self.settings.mode,
            mode_switch_enabled: !tracking && !self.chart.locks_mode_switch(),
            selectors_enabled: !tracking,
            tracking,
            manual_controls_visible: !automatic,
            auto_controls_visible: automatic,
            ping_host_visible: automatic && self.settings.stat.needs_ping_host(),
            pid_visible,
            pid_missing: pid_visible && self.settings.pid.trim().is_empty(),
        }
    }

    #[instrument(level = "debug", skip(self), fields(mode = %self.settings.mode))]
    pub fn dispatch(&mut self, intent: Intent) -> Option<Notice> {
        let controls = self.controls();
        match intent {
            Intent::SetMode(mode) => {
                if !controls.mode_switch_enabled {
                    debug!("Mode switch is locked");
                    return None;
                }
                self.set_mode(mode);
            }

            Intent::SelectMetric(stat) if controls.selectors_enabled => {
                self.settings.stat = stat;
                self.update_y_axis();
                self.persist();
            }
            Intent::SetInterval(interval) if controls.selectors_enabled && interval > 0 => {
                self.settings.interval = interval;
                self.persist();
            }
            Intent::SetPingHost(host) if controls.selectors_enabled => {
                self.settings.ping_host = host;
                self.persist();
            }
            Intent::SetPid(pid) if controls.selectors_enabled => {
                self.settings.pid = pid;
                self.persist();
            }
            Intent::SetIncludeChildren(include) if controls.selectors_enabled => {
                self.settings.include_children = include;
                self.persist();
            }
            Intent::SelectMetric(_)
            | Intent::SetInterval(_)
            | Intent::SetPingHost(_)
            | Intent::SetPid(_)
            | Intent::SetIncludeChildren(_) => {
                debug!("Ignoring input change");
            }

            Intent::SetColor(hex) => match hex.parse::<RgbColor>() {
                Ok(color) => {
                    self.chart.set_color(color);
                    self.settings.color = color.to_string();
                    self.persist();
                }
                Err(e) => return Some(Notice::Error(format!("{e}"))),
            },

            Intent::AddValue(text) if controls.manual_controls_visible => {
                let value = text.trim().parse::<f64>().unwrap_or(f64::NAN);
                if !self.chart.append(value, Utc::now(), self.settings.mode) {
                    debug!(input = %text, "Ignoring value");
                }
            }
            Intent::Undo if controls.manual_controls_visible => {
                self.chart.pop_last();
            }
            Intent::AddValue(_) | Intent::Undo => {}

            Intent::Restart => self.clear_chart(),

            Intent::StartTracking => return self.start_tracking(),
            Intent::StopTracking => {
                self.tracking.stop();
            }
            Intent::ToggleTracking if controls.tracking => {
                self.tracking.stop();
            }
            Intent::ToggleTracking => return self.start_tracking(),

            Intent::Export(format) => return Some(self.export(format)),
        }
        None
    }

    /// Folds an event from the polling task into the chart.
    pub fn apply_tracking_event(&mut self, event: TrackingEvent) -> Option<Notice> {
        match event {
            TrackingEvent::Sample { value, at, .. } => {
                self.chart.append(value, at, self.settings.mode);
                None
            }
            TrackingEvent::Halted { run, reason } => {
                if self.tracking.halted(run) {
                    Some(Notice::Error(format!("Tracking stopped. {reason}")))
                } else {
                    debug!(run, "Ignoring halt of a previous run");
                    None
                }
            }
        }
    }

    /// Stops polling. The returned future, when `stop_service` is set, asks
    /// the stats service to exit; it does not borrow the dashboard.
    pub fn shutdown(&mut self, stop_service: bool) -> impl Future<Output = ()> + Send + 'static {
        self.tracking.stop();
        let api = stop_service.then(|| self.api.clone());
        async move {
            let Some(api) = api else {
                return;
            };
            if let Err(e) = api.shutdown().await {
                debug!(error = %e, "Stats service did not acknowledge shutdown");
            }
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        self.clear_chart();
        self.tracking.stop();
        self.settings.mode = mode;
        match mode {
            Mode::Manual => self.chart.set_y_axis_bounds(None, None),
            Mode::Automatic => self.update_y_axis(),
        }
        self.persist();
        info!(title = %self.title(), "Mode set");
    }

    fn update_y_axis(&mut self) {
        let YBounds { min, max } = YBounds::for_metric(self.settings.mode, self.settings.stat);
        self.chart.set_y_axis_bounds(min, max);
        self.clear_chart();
    }

    fn clear_chart(&mut self) {
        self.chart.clear();
        self.net.reset();
    }

    fn start_tracking(&mut self) -> Option<Notice> {
        if self.settings.mode != Mode::Automatic {
            debug!("Tracking is only available in automatic mode");
            return None;
        }
        if self.controls().pid_missing {
            info!("No PID entered, nothing will be plotted until one is set");
        }

        self.clear_chart();
        let source = MetricSource::new(self.api.clone(), self.net.clone());
        let request = MetricRequest::from(&self.settings);
        let interval = Duration::from_millis(self.settings.interval);
        self.tracking.start(source, request, interval, self.events_tx.clone());
        None
    }

    fn export(&self, format: ExportFormat) -> Notice {
        match export::export(&self.chart, format, &self.export_dir, Utc::now()) {
            Ok(path) => Notice::Info(format!("Saved {format} to {}", path.display())),
            Err(e @ ExportError::NoData) => Notice::Error(e.to_string()),
            Err(e) => {
                error!(error = %e, %format, "Export failed");
                Notice::Error(e.to_string())
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.settings) {
            error!(?e, "Failed to save settings");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{
        fake::FakeStatsApi,
        NetCounterSnapshot,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use temp_dir::TempDir;

    struct Fixture {
        dir: TempDir,
        api: Arc<FakeStatsApi>,
        dashboard: Dashboard,
        events: UnboundedReceiver<TrackingEvent>,
    }

    impl Fixture {
        fn new(settings: Settings) -> Self {
            let dir = TempDir::new().unwrap();
            let api = Arc::new(FakeStatsApi::default());
            api.push_stats(json!({ "cpu_percent": 25.0, "net_bytes_sent": 0, "net_bytes_recv": 0 }));
            let store = SettingsStore::new(dir.path());
            let (dashboard, events) = Dashboard::new(api.clone(), store, settings, dir.child("exports"));
            Self {
                dir,
                api,
                dashboard,
                events,
            }
        }

        fn automatic() -> Self {
            Self::new(Settings {
                mode: Mode::Automatic,
                ..Settings::default()
            })
        }

        fn stored(&self) -> Settings {
            SettingsStore::new(self.dir.path()).load()
        }

        fn pump(&mut self) -> Vec<Notice> {
            let mut notices = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                notices.extend(self.dashboard.apply_tracking_event(event));
            }
            notices
        }
    }

    #[test]
    fn startup_applies_and_persists_the_stored_mode() {
        let fixture = Fixture::new(Settings {
            mode: Mode::Automatic,
            color: "not a color".to_string(),
            ..Settings::default()
        });
        let dashboard = &fixture.dashboard;

        assert_eq!(dashboard.title(), "Nanograph - cpu usage (%)");
        assert_eq!(dashboard.chart().y_bounds(), YBounds::PERCENTAGE);
        assert!(dashboard.controls().auto_controls_visible);

        let expected = Settings {
            mode: Mode::Automatic,
            ..Settings::default()
        };
        assert_eq!(fixture.stored(), expected);
    }

    #[test]
    fn manual_entries_lock_the_mode_switch_until_undone() {
        let mut fixture = Fixture::new(Settings::default());
        let dashboard = &mut fixture.dashboard;
        assert_eq!(dashboard.title(), "Nanograph - Manual");

        dashboard.dispatch(Intent::AddValue(" 3.5 ".to_string()));
        assert_eq!(dashboard.chart().len(), 1);
        assert!(!dashboard.controls().mode_switch_enabled);

        dashboard.dispatch(Intent::SetMode(Mode::Automatic));
        assert_eq!(dashboard.mode(), Mode::Manual);

        dashboard.dispatch(Intent::Undo);
        assert!(dashboard.chart().is_empty());
        assert!(dashboard.controls().mode_switch_enabled);

        dashboard.dispatch(Intent::SetMode(Mode::Automatic));
        assert_eq!(dashboard.mode(), Mode::Automatic);
        assert_eq!(fixture.stored().mode, Mode::Automatic);
    }

    #[test]
    fn restart_releases_the_lock() {
        let mut fixture = Fixture::new(Settings::default());
        let dashboard = &mut fixture.dashboard;

        dashboard.dispatch(Intent::AddValue("1".to_string()));
        dashboard.dispatch(Intent::AddValue("2".to_string()));
        dashboard.dispatch(Intent::Restart);

        assert!(dashboard.chart().is_empty());
        assert!(dashboard.controls().mode_switch_enabled);
    }

    #[test]
    fn unusable_input_is_dropped() {
        let mut fixture = Fixture::new(Settings::default());
        let dashboard = &mut fixture.dashboard;

        for text in ["", "abc", "-1", "NaN", "inf"] {
            assert_eq!(dashboard.dispatch(Intent::AddValue(text.to_string())), None);
        }

        assert!(dashboard.chart().is_empty());
        assert!(dashboard.controls().mode_switch_enabled);
    }

    #[test]
    fn manual_entry_is_not_offered_in_automatic_mode() {
        let mut fixture = Fixture::automatic();
        fixture.dashboard.dispatch(Intent::AddValue("5".to_string()));
        assert!(fixture.dashboard.chart().is_empty());
    }

    #[test]
    fn selecting_a_metric_rescales_and_clears() {
        let mut fixture = Fixture::automatic();
        let dashboard = &mut fixture.dashboard;
        dashboard.apply_tracking_event(TrackingEvent::Sample {
            run: 1,
            value: 50.0,
            at: Utc::now(),
        });
        assert_eq!(dashboard.chart().len(), 1);

        dashboard.dispatch(Intent::SelectMetric(MetricId::PingLatencyMs));

        assert!(dashboard.chart().is_empty());
        assert_eq!(dashboard.chart().y_bounds(), YBounds::AUTO);
        assert_eq!(dashboard.title(), "Nanograph - ping latency (ms)");
        assert!(dashboard.controls().ping_host_visible);
        assert!(!dashboard.controls().pid_visible);
        assert_eq!(fixture.stored().stat, MetricId::PingLatencyMs);
    }

    #[test]
    fn process_metric_without_pid_is_flagged() {
        let mut fixture = Fixture::automatic();
        fixture.dashboard.dispatch(Intent::SelectMetric(MetricId::ProcessRamMb));
        assert!(fixture.dashboard.controls().pid_missing);

        fixture.dashboard.dispatch(Intent::SetPid("4242".to_string()));
        assert!(!fixture.dashboard.controls().pid_missing);
        assert_eq!(fixture.stored().pid, "4242");
    }

    #[tokio::test(start_paused = true)]
    async fn tracking_plots_samples_and_disables_inputs() {
        let mut fixture = Fixture::automatic();

        fixture.dashboard.dispatch(Intent::StartTracking);
        let controls = fixture.dashboard.controls();
        assert!(controls.tracking);
        assert!(!controls.mode_switch_enabled);
        assert!(!controls.selectors_enabled);

        fixture.dashboard.dispatch(Intent::SelectMetric(MetricId::DiskPercent));
        fixture.dashboard.dispatch(Intent::SetInterval(5_000));
        assert_eq!(fixture.dashboard.settings().stat, MetricId::CpuPercent);
        assert_eq!(fixture.dashboard.settings().interval, 1_000);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(fixture.pump(), vec![]);
        assert_eq!(fixture.dashboard.chart().len(), 3);
        assert!(fixture.dashboard.chart().samples().iter().all(|s| s.value == 25.0));

        fixture.dashboard.dispatch(Intent::ToggleTracking);
        let controls = fixture.dashboard.controls();
        assert!(!controls.tracking);
        assert!(controls.mode_switch_enabled && controls.selectors_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn stats_failure_stops_tracking_with_a_notice() {
        let mut fixture = Fixture::automatic();
        fixture.api.set_failing(true);

        fixture.dashboard.dispatch(Intent::StartTracking);
        tokio::time::sleep(Duration::from_secs(3)).await;

        let notices = fixture.pump();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
        assert!(!fixture.dashboard.is_tracking());
        assert!(fixture.dashboard.controls().mode_switch_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn halt_of_an_earlier_run_is_ignored() {
        let mut fixture = Fixture::automatic();
        fixture.dashboard.dispatch(Intent::StartTracking);

        let notice = fixture.dashboard.apply_tracking_event(TrackingEvent::Halted {
            run: 0,
            reason: "gone".to_string(),
        });

        assert_eq!(notice, None);
        assert!(fixture.dashboard.is_tracking());
    }

    #[tokio::test(start_paused = true)]
    async fn mode_change_stops_tracking() {
        let mut fixture = Fixture::automatic();
        fixture.dashboard.dispatch(Intent::StartTracking);
        fixture.dashboard.set_mode(Mode::Manual);

        assert!(!fixture.dashboard.is_tracking());
        assert_eq!(fixture.dashboard.chart().y_bounds(), YBounds::AUTO);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_modes_drops_the_series_and_the_running_poll() {
        let mut fixture = Fixture::automatic();
        fixture.dashboard.dispatch(Intent::StartTracking);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        fixture.pump();
        assert_eq!(fixture.dashboard.chart().len(), 2);

        // refused while polling
        fixture.dashboard.dispatch(Intent::SetMode(Mode::Manual));
        assert_eq!(fixture.dashboard.mode(), Mode::Automatic);
        assert!(fixture.dashboard.is_tracking());

        fixture.dashboard.dispatch(Intent::StopTracking);
        fixture.dashboard.apply_tracking_event(TrackingEvent::Sample {
            run: 1,
            value: 30.0,
            at: Utc::now(),
        });
        fixture.dashboard.net.replace(NetCounterSnapshot {
            bytes_sent: 1_024,
            bytes_recv: 2_048,
            captured_at: Utc::now(),
        });
        assert_eq!(fixture.dashboard.chart().len(), 3);
        assert!(fixture.dashboard.controls().mode_switch_enabled);

        fixture.dashboard.dispatch(Intent::SetMode(Mode::Manual));

        assert_eq!(fixture.dashboard.mode(), Mode::Manual);
        assert!(fixture.dashboard.chart().is_empty());
        assert!(!fixture.dashboard.is_tracking());
        assert_eq!(fixture.dashboard.net.get(), None);
        assert!(fixture.dashboard.controls().mode_switch_enabled);
        assert_eq!(fixture.stored().mode, Mode::Manual);

        let calls = fixture.api.calls().stats;
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(fixture.api.calls().stats, calls);
        assert_eq!(fixture.pump(), vec![]);
        assert!(fixture.dashboard.chart().is_empty());
    }

    #[tokio::test]
    async fn restart_makes_the_next_net_rate_tick_prime() {
        let mut fixture = Fixture::new(Settings {
            mode: Mode::Automatic,
            stat: MetricId::NetSentKbs,
            ..Settings::default()
        });
        let start = Utc::now();
        fixture.dashboard.apply_tracking_event(TrackingEvent::Sample {
            run: 1,
            value: 4.0,
            at: start,
        });
        fixture.dashboard.net.replace(NetCounterSnapshot {
            bytes_sent: 0,
            bytes_recv: 0,
            captured_at: start - chrono::TimeDelta::seconds(1),
        });

        fixture.dashboard.dispatch(Intent::Restart);
        assert!(fixture.dashboard.chart().is_empty());
        assert_eq!(fixture.dashboard.net.get(), None);

        // the fixture's counters (all zero) are served first
        fixture.api.push_stats(json!({ "net_bytes_sent": 10_240, "net_bytes_recv": 0 }));
        let source = MetricSource::new(fixture.api.clone(), fixture.dashboard.net.clone());
        let request = MetricRequest::from(fixture.dashboard.settings());

        let first = source.sample_with_clock(&request, || start).await.unwrap();
        assert_eq!(first, None);
        assert_eq!(fixture.dashboard.net.get().map(|s| s.captured_at), Some(start));

        let later = start + chrono::TimeDelta::seconds(2);
        let second = source.sample_with_clock(&request, || later).await.unwrap();
        assert_eq!(second, Some(5.0));
    }

    #[test]
    fn start_tracking_requires_automatic_mode() {
        let mut fixture = Fixture::new(Settings::default());
        fixture.dashboard.dispatch(Intent::StartTracking);
        assert!(!fixture.dashboard.is_tracking());
    }

    #[test]
    fn exports_report_where_they_went() {
        let mut fixture = Fixture::new(Settings::default());

        let notice = fixture.dashboard.dispatch(Intent::Export(ExportFormat::Csv));
        assert_eq!(notice, Some(Notice::Error("No data to export.".to_string())));

        fixture.dashboard.dispatch(Intent::AddValue("7".to_string()));
        let notice = fixture.dashboard.dispatch(Intent::Export(ExportFormat::Json)).unwrap();
        assert!(!notice.is_error());
        assert!(notice.message().starts_with("Saved JSON to "));
        assert_eq!(std::fs::read_dir(fixture.dashboard.export_dir()).unwrap().count(), 1);
    }

    #[test]
    fn colors_are_validated_and_persisted() {
        let mut fixture = Fixture::new(Settings::default());

        let notice = fixture.dashboard.dispatch(Intent::SetColor("teal".to_string()));
        assert!(notice.is_some_and(|n| n.is_error()));

        assert_eq!(fixture.dashboard.dispatch(Intent::SetColor("#0088FF".to_string())), None);
        assert_eq!(fixture.dashboard.chart().color().to_string(), "#0088ff");
        assert_eq!(fixture.stored().color, "#0088ff");
    }

    #[tokio::test]
    async fn shutdown_notifies_the_service_only_when_asked() {
        let mut fixture = Fixture::new(Settings::default());

        fixture.dashboard.shutdown(false).await;
        assert_eq!(fixture.api.calls().shutdown, 0);

        fixture.dashboard.shutdown(true).await;
        assert_eq!(fixture.api.calls().shutdown, 1);
    }
}
