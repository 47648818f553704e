use serde::{
    Deserialize,
    Serialize,
};
use strum::{
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
};

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Manual,
    Automatic,
}

impl Mode {
    pub fn title(&self) -> &'static str {
        match self {
            Mode::Manual => "Manual",
            Mode::Automatic => "Automatic",
        }
    }
}

/// How the value for a metric is obtained from the stats service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A field of the `/stats` object.
    General,
    /// A rate derived from two consecutive `/stats` counter readings.
    NetRate(NetDirection),
    /// `/ping` latency for a host.
    Ping,
    /// `/process_stats` memory for a PID.
    Process,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetDirection {
    Sent,
    Received,
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum MetricId {
    #[default]
    CpuPercent,
    MemPercent,
    RamUsedMb,
    SwapPercent,
    DiskPercent,
    DiskUsedGb,
    DiskReadMbs,
    DiskWriteMbs,
    CpuTempC,
    CpuFreqMhz,
    BatteryPercent,
    NetSentKbs,
    NetRecvKbs,
    PingLatencyMs,
    ProcessRamMb,
}

impl MetricId {
    /// The identifier as it appears in settings and in the `/stats` payload.
    pub fn id(&self) -> &'static str {
        (*self).into()
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricId::CpuPercent => "cpu usage (%)",
            MetricId::MemPercent => "ram usage (%)",
            MetricId::RamUsedMb => "ram used (mb)",
            MetricId::SwapPercent => "swap usage (%)",
            MetricId::DiskPercent => "disk usage (%)",
            MetricId::DiskUsedGb => "disk used (gb)",
            MetricId::DiskReadMbs => "disk read (mb/s)",
            MetricId::DiskWriteMbs => "disk write (mb/s)",
            MetricId::CpuTempC => "cpu temperature (°c)",
            MetricId::CpuFreqMhz => "cpu frequency (mhz)",
            MetricId::BatteryPercent => "battery (%)",
            MetricId::NetSentKbs => "network upload (kb/s)",
            MetricId::NetRecvKbs => "network download (kb/s)",
            MetricId::PingLatencyMs => "ping latency (ms)",
            MetricId::ProcessRamMb => "process ram (mb)",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricId::NetSentKbs => MetricKind::NetRate(NetDirection::Sent),
            MetricId::NetRecvKbs => MetricKind::NetRate(NetDirection::Received),
            MetricId::PingLatencyMs => MetricKind::Ping,
            MetricId::ProcessRamMb => MetricKind::Process,
            _ => MetricKind::General,
        }
    }

    /// Keys to look up in the `/stats` object, in order of preference.
    ///
    /// The stats service reports memory usage as `ram_percent`.
    pub fn stats_keys(&self) -> &'static [&'static str] {
        match self {
            MetricId::MemPercent => &["mem_percent", "ram_percent"],
            MetricId::RamUsedMb => &["ram_used_mb"],
            MetricId::CpuPercent => &["cpu_percent"],
            MetricId::SwapPercent => &["swap_percent"],
            MetricId::DiskPercent => &["disk_percent"],
            MetricId::DiskUsedGb => &["disk_used_gb"],
            MetricId::DiskReadMbs => &["disk_read_mbs"],
            MetricId::DiskWriteMbs => &["disk_write_mbs"],
            MetricId::CpuTempC => &["cpu_temp_c"],
            MetricId::CpuFreqMhz => &["cpu_freq_mhz"],
            MetricId::BatteryPercent => &["battery_percent"],
            MetricId::NetSentKbs | MetricId::NetRecvKbs | MetricId::PingLatencyMs | MetricId::ProcessRamMb => &[],
        }
    }

    pub fn is_percentage(&self) -> bool {
        self.id().contains("percent")
    }

    pub fn needs_ping_host(&self) -> bool {
        self.kind() == MetricKind::Ping
    }

    pub fn needs_pid(&self) -> bool {
        self.kind() == MetricKind::Process
    }
}

/// Polling intervals offered by the interval picker, in milliseconds.
pub const INTERVAL_PRESETS: [u64; 7] = [500, 1_000, 2_000, 5_000, 10_000, 30_000, 60_000];

pub fn interval_label(millis: u64) -> String {
    match millis {
        1_000 => "every 1 second".to_string(),
        ms if ms % 60_000 == 0 && ms > 0 => match ms / 60_000 {
            1 => "every 1 minute".to_string(),
            n => format!("every {n} minutes"),
        },
        ms if ms % 1_000 == 0 => format!("every {} seconds", ms / 1_000),
        ms => format!("every {ms} ms"),
    }
}
