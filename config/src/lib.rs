#[macro_use]
extern crate tracing;

mod app_config;
mod args;
mod metric;
mod settings;

use app_config::AppConfig;
pub use app_config::{
    default_export_dir,
    get_config_dir,
    get_data_dir,
};
pub use args::Args;
pub use metric::{
    interval_label,
    MetricId,
    MetricIdIter,
    MetricKind,
    Mode,
    NetDirection,
    INTERVAL_PRESETS,
};
use serde::Deserialize;
pub use settings::{
    Settings,
    SettingsStore,
    DEFAULT_COLOR,
    DEFAULT_INTERVAL_MS,
    DEFAULT_PING_HOST,
    SETTINGS_KEY,
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

/// Application configuration: where the stats service lives and how the
/// dashboard talks to it. The per-user chart state lives in [`Settings`].
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub app_config: AppConfig,
    pub server_url: url::Url,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub shutdown_on_exit: bool,
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

fn default_request_timeout_ms() -> u64 {
    5_000
}

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    pub fn new(args: Args) -> Result<Self, config::ConfigError> {
        let data_dir = get_data_dir();
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.to_string_lossy().to_string())?
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?;

        builder = builder.add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        let config_files = [("config.yaml", config::FileFormat::Yaml)];

        for (file, format) in &config_files {
            let source = config::File::from(config_dir.join(file))
                .format(*format)
                .required(false);
            builder = builder.add_source(source);
        }

        builder = builder.add_source(args);

        let cfg: Self = builder.build()?.try_deserialize()?;

        Ok(cfg)
    }

    pub fn data_dir(&self) -> &Path {
        &self.app_config.data_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.app_config.config_dir
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(default_export_dir)
    }

    pub fn settings_store(&self) -> SettingsStore {
        SettingsStore::new(self.data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_points_at_the_local_stats_service() {
        let config = Config::default();
        assert_eq!(config.server_url.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert!(config.shutdown_on_exit);
        assert_eq!(config.export_dir, None);
    }

    #[test]
    fn args_take_precedence_over_defaults() {
        let args = Args {
            server_url: Some("http://10.0.0.2:8123".to_string()),
            request_timeout_ms: Some(250),
            keep_server: true,
            export_dir: Some("/tmp/graphs".to_string()),
            ..Args::default()
        };

        let config = Config::new(args).unwrap();

        assert_eq!(config.server_url.as_str(), "http://10.0.0.2:8123/");
        assert_eq!(config.request_timeout_ms, 250);
        assert!(!config.shutdown_on_exit);
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/graphs"));
    }
}
