use crate::{
    Args,
    MetricId,
    Mode,
};
use eyre::{
    Context as _,
    Result,
};
use serde::{
    de::DeserializeOwned,
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};
use std::{
    fs,
    io::ErrorKind,
    path::{
        Path,
        PathBuf,
    },
};

/// Name of the persisted settings record inside the data directory.
pub const SETTINGS_KEY: &str = "nanograph-settings";

pub const DEFAULT_PING_HOST: &str = "google.com";
pub const DEFAULT_COLOR: &str = "#28a745";
pub const DEFAULT_INTERVAL_MS: u64 = 1_000;

/// User-adjustable dashboard state that survives restarts.
///
/// Every field has a default so that records written by older versions, or
/// edited by hand, still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub mode: Mode,
    pub stat: MetricId,
    pub interval: u64,
    pub ping_host: String,
    pub pid: String,
    pub include_children: bool,
    pub color: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::Manual,
            stat: MetricId::CpuPercent,
            interval: DEFAULT_INTERVAL_MS,
            ping_host: DEFAULT_PING_HOST.to_string(),
            pid: String::new(),
            include_children: false,
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

impl Settings {
    /// Applies the per-launch overrides from the command line.
    /// Returns whether anything changed.
    #[instrument(level = "debug", skip(self, args))]
    pub fn update_from_args(&mut self, args: &Args) -> bool {
        let mut changed = false;
        if let Some(mode) = args.mode {
            if self.mode != mode {
                info!(old = %self.mode, new = %mode, "Updating mode from args");
                self.mode = mode;
                changed = true;
            }
        }
        if let Some(stat) = args.stat {
            if self.stat != stat {
                info!(old = %self.stat, new = %stat, "Updating stat from args");
                self.stat = stat;
                changed = true;
            }
        }
        if let Some(interval) = args.interval.filter(|ms| *ms > 0) {
            if self.interval != interval {
                info!(old = %self.interval, new = %interval, "Updating interval from args");
                self.interval = interval;
                changed = true;
            }
        }
        changed
    }
}

/// Reads and writes the [`Settings`] record as JSON.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{SETTINGS_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored settings. A missing record yields the defaults, and so
    /// does a record that is not a JSON object. Within an object each field is
    /// read on its own: a field with an unusable value falls back to its
    /// default and the rest of the record is kept.
    pub fn load(&self) -> Settings {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "No stored settings, using defaults");
                return Settings::default();
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Failed to read stored settings, using defaults");
                return Settings::default();
            }
        };

        let record = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(record)) => record,
            Ok(other) => {
                warn!(path = ?self.path, found = %other, "Stored settings are not an object, using defaults");
                return Settings::default();
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Stored settings are invalid, using defaults");
                return Settings::default();
            }
        };

        let defaults = Settings::default();
        let mut settings = Settings {
            mode: field(&record, "mode", defaults.mode),
            stat: field(&record, "stat", defaults.stat),
            interval: field(&record, "interval", defaults.interval),
            ping_host: field(&record, "pingHost", defaults.ping_host),
            pid: field(&record, "pid", defaults.pid),
            include_children: field(&record, "includeChildren", defaults.include_children),
            color: field(&record, "color", defaults.color),
        };
        if settings.interval == 0 {
            settings.interval = DEFAULT_INTERVAL_MS;
        }
        settings
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).wrap_err_with(|| format!("Failed to create settings directory {dir:?}"))?;
        }
        let content = serde_json::to_string(settings).context("Failed to serialize settings")?;
        fs::write(&self.path, content).wrap_err_with(|| format!("Failed to write settings to {:?}", self.path))
    }
}

fn field<T: DeserializeOwned>(record: &Map<String, Value>, key: &str, default: T) -> T {
    let Some(value) = record.get(key) else {
        return default;
    };
    serde_json::from_value(value.clone()).unwrap_or_else(|e| {
        warn!(key, %value, error = %e, "Ignoring invalid stored setting");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    #[test]
    fn save_then_load_reconstructs_the_record() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path());
        let settings = Settings {
            mode: Mode::Automatic,
            stat: MetricId::ProcessRamMb,
            interval: 5_000,
            ping_host: "example.org".to_string(),
            pid: "4242".to_string(),
            include_children: true,
            color: "#ff8800".to_string(),
        };

        store.save(&settings).unwrap();

        assert_eq!(store.load(), settings);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path());
        fs::write(store.path(), r#"{"mode":"automatic","pingHost":"1.1.1.1"}"#).unwrap();

        let expected = Settings {
            mode: Mode::Automatic,
            ping_host: "1.1.1.1".to_string(),
            ..Settings::default()
        };
        assert_eq!(store.load(), expected);
    }

    #[test]
    fn invalid_fields_fall_back_one_by_one() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path());
        fs::write(
            store.path(),
            r##"{"mode":"automatic","stat":"gpu_percent","pid":"4242","interval":"1000","color":"#0000ff"}"##,
        )
        .unwrap();

        let expected = Settings {
            mode: Mode::Automatic,
            pid: "4242".to_string(),
            color: "#0000ff".to_string(),
            ..Settings::default()
        };
        assert_eq!(store.load(), expected);
    }

    #[test]
    fn non_object_records_load_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path());
        fs::write(store.path(), r#"["automatic"]"#).unwrap();
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn missing_or_corrupt_records_load_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path());
        assert_eq!(store.load(), Settings::default());

        fs::write(store.path(), "{ not json").unwrap();
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn stored_record_uses_camel_case_keys() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "mode": "manual",
                "stat": "cpu_percent",
                "interval": 1000,
                "pingHost": "google.com",
                "pid": "",
                "includeChildren": false,
                "color": "#28a745",
            })
        );
    }

    #[test]
    fn args_override_mode_stat_and_interval() {
        let mut settings = Settings::default();
        let args = Args {
            mode: Some(Mode::Automatic),
            stat: Some(MetricId::NetSentKbs),
            interval: Some(0),
            ..Args::default()
        };

        assert!(settings.update_from_args(&args));
        assert_eq!(settings.mode, Mode::Automatic);
        assert_eq!(settings.stat, MetricId::NetSentKbs);
        assert_eq!(settings.interval, DEFAULT_INTERVAL_MS);
        assert!(!settings.update_from_args(&args));
    }
}
