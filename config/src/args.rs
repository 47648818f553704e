use crate::{
    MetricId,
    Mode,
};
use clap::Parser;

/// Nanograph: chart live system metrics in the terminal
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version = version(), about, long_about = None)]
pub struct Args {
    /// Base URL of the stats service.
    #[clap(long, value_name = "URL")]
    pub server_url: Option<String>,

    /// Timeout for a single request against the stats service.
    #[clap(long, value_name = "MILLIS")]
    pub request_timeout_ms: Option<u64>,

    /// Do not ask the stats service to shut down when the dashboard exits.
    #[clap(long = "keep-server", action)]
    pub keep_server: bool,

    /// Directory that exported charts are written to.
    #[clap(long, value_name = "DIR")]
    pub export_dir: Option<String>,

    /// Start in this mode, overriding the saved settings.
    #[clap(long, value_enum)]
    pub mode: Option<Mode>,

    /// Track this metric, overriding the saved settings.
    #[clap(long, value_enum)]
    pub stat: Option<MetricId>,

    /// Polling interval in milliseconds, overriding the saved settings.
    #[clap(long, value_name = "MILLIS")]
    pub interval: Option<u64>,

    /// Show trace level output in the log view.
    #[clap(long = "debug", action)]
    pub debug: bool,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(server_url) = &self.server_url {
                cache.insert("server_url".to_string(), server_url.clone().into());
            }
            if let Some(timeout) = self.request_timeout_ms {
                cache.insert("request_timeout_ms".to_string(), timeout.into());
            }
            if self.keep_server {
                cache.insert("shutdown_on_exit".to_string(), false.into());
            }
            if let Some(export_dir) = &self.export_dir {
                cache.insert("export_dir".to_string(), export_dir.clone().into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let author = clap::crate_authors!();
    let config_dir_path = crate::get_config_dir().display().to_string();
    let data_dir_path = crate::get_data_dir().display().to_string();

    format!(
        "{}

Authors: {author}

Config directory: {config_dir_path}
Data directory: {data_dir_path}",
        clap::crate_version!()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Source as _;
    use pretty_assertions::assert_eq;

    #[test]
    fn only_given_flags_become_config_values() {
        let args = Args::parse_from(["nanograph", "--server-url", "http://localhost:9000", "--keep-server"]);
        let values = args.collect().unwrap();

        let mut keys = values.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        assert_eq!(keys, vec!["server_url".to_string(), "shutdown_on_exit".to_string()]);
    }

    #[test]
    fn settings_overrides_parse() {
        let args = Args::parse_from(["nanograph", "--mode", "automatic", "--stat", "net_recv_kbs", "--interval", "500"]);
        assert_eq!(args.mode, Some(Mode::Automatic));
        assert_eq!(args.stat, Some(MetricId::NetRecvKbs));
        assert_eq!(args.interval, Some(500));
    }
}
