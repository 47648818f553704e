mod action;
mod app;
mod components;
mod keybindings;
mod layout;
mod theme;
#[allow(clippy::module_inception)]
mod tui;
mod widgets;

pub(crate) use action::Action;
use action::ActivateAction;
pub use app::App;
pub(crate) use app::FocusedTopLevelComponent;
use components::Component;
use nanograph_dashboard::Dashboard;
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
};
use theme::Theme;
use tui::Event;
pub use tui::Tui;

/// The dashboard is mutated by the app loop and read by every component
/// when drawing.
pub(crate) type SharedDashboard = Arc<Mutex<Dashboard>>;

pub(crate) fn lock(dashboard: &SharedDashboard) -> MutexGuard<'_, Dashboard> {
    dashboard.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
pub(crate) fn test_dashboard(data_dir: &std::path::Path) -> SharedDashboard {
    use nanograph_config::{
        Settings,
        SettingsStore,
    };
    use nanograph_dashboard::source::HttpStatsClient;

    // nothing listens here; tests never start tracking
    let url = "http://127.0.0.1:9/".parse().unwrap();
    let api = HttpStatsClient::new(url, std::time::Duration::from_millis(10)).unwrap();
    let (dashboard, _events) = Dashboard::new(
        Arc::new(api),
        SettingsStore::new(data_dir),
        Settings::default(),
        data_dir.to_path_buf(),
    );
    Arc::new(Mutex::new(dashboard))
}
