use chrono::{
    DateTime,
    Utc,
};
use eyre::{
    bail,
    Result,
};
use nanograph_config::{
    MetricId,
    Mode,
    DEFAULT_COLOR,
};
use std::{
    fmt,
    str::FromStr,
};

/// Value the stats service reports for "metric unavailable".
pub const SENTINEL: f64 = -1.0;

/// Whether a value may be plotted. NaN, the sentinel and infinities are not.
pub fn is_plottable(value: f64) -> bool {
    value.is_finite() && value != SENTINEL
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Optional fixed limits of the Y axis. A missing side scales with the data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct YBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl YBounds {
    pub const AUTO: YBounds = YBounds { min: None, max: None };
    pub const PERCENTAGE: YBounds = YBounds {
        min: Some(0.0),
        max: Some(100.0),
    };

    /// Percentages are pinned to `[0, 100]` while tracking; everything else,
    /// and every manual series, scales with the data.
    pub fn for_metric(mode: Mode, metric: MetricId) -> Self {
        match mode {
            Mode::Automatic if metric.is_percentage() => Self::PERCENTAGE,
            _ => Self::AUTO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for RgbColor {
    fn default() -> Self {
        DEFAULT_COLOR.parse().unwrap_or(RgbColor { r: 0x28, g: 0xa7, b: 0x45 })
    }
}

impl FromStr for RgbColor {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("Expected a color like #28a745, got {s:?}");
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// The plotted series plus the presentation state that goes with it.
#[derive(Debug, Clone, Default)]
pub struct ChartModel {
    samples: Vec<Sample>,
    color: RgbColor,
    y_bounds: YBounds,
    manual_entry_lock: bool,
}

impl ChartModel {
    pub fn new(color: RgbColor) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn color(&self) -> RgbColor {
        self.color
    }

    pub fn y_bounds(&self) -> YBounds {
        self.y_bounds
    }

    /// Set once a value has been entered by hand and held until the series is
    /// empty again. While set, switching modes is not offered.
    pub fn locks_mode_switch(&self) -> bool {
        self.manual_entry_lock
    }

    /// Appends a value, unless it is NaN or the sentinel. Returns whether the
    /// value was added.
    pub fn append(&mut self, value: f64, at: DateTime<Utc>, mode: Mode) -> bool {
        if !is_plottable(value) {
            trace!(value, "Rejecting unplottable value");
            return false;
        }
        let timestamp = match self.samples.last() {
            Some(last) if last.timestamp > at => last.timestamp,
            _ => at,
        };
        self.samples.push(Sample { timestamp, value });
        if mode == Mode::Manual {
            self.manual_entry_lock = true;
        }
        true
    }

    pub fn pop_last(&mut self) -> Option<Sample> {
        let sample = self.samples.pop();
        if self.samples.is_empty() {
            self.manual_entry_lock = false;
        }
        sample
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.manual_entry_lock = false;
    }

    pub fn set_color(&mut self, color: RgbColor) {
        self.color = color;
    }

    pub fn set_y_axis_bounds(&mut self, min: Option<f64>, max: Option<f64>) {
        self.y_bounds = YBounds { min, max };
    }

    /// The Y range to draw: fixed bounds where set, otherwise the data range
    /// padded by a tenth on each side.
    pub fn y_range(&self) -> [f64; 2] {
        let (data_min, data_max) = self
            .samples
            .iter()
            .map(|s| s.value)
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            })
            .unwrap_or((0.0, 1.0));

        let range = data_max - data_min;
        let (auto_min, auto_max) = if range < 0.001 {
            (data_min - 0.5, data_max + 0.5)
        } else {
            (data_min - range * 0.1, data_max + range * 0.1)
        };

        let min = self.y_bounds.min.unwrap_or(auto_min);
        let max = self.y_bounds.max.unwrap_or(auto_max);
        if max > min {
            [min, max]
        } else {
            [min, min + 1.0]
        }
    }

    /// First and last timestamp of the series.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.samples.first()?.timestamp, self.samples.last()?.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn unplottable_values_leave_the_series_unchanged() {
        let mut chart = ChartModel::default();
        chart.append(3.0, at(0), Mode::Automatic);

        for value in [f64::NAN, SENTINEL, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(!chart.append(value, at(1), Mode::Automatic));
            assert_eq!(chart.len(), 1);
        }
    }

    #[test]
    fn pop_last_undoes_append() {
        let mut chart = ChartModel::default();
        chart.append(1.0, at(0), Mode::Manual);
        chart.append(2.0, at(1), Mode::Manual);
        let before = chart.samples().to_vec();

        for value in [0.0, -0.5, 1e9, -1.5] {
            assert!(chart.append(value, at(2), Mode::Manual));
            let popped = chart.pop_last().unwrap();
            assert_eq!(popped.value, value);
            assert_eq!(chart.samples(), before.as_slice());
        }
    }

    #[test]
    fn timestamps_never_go_backwards() {
        let mut chart = ChartModel::default();
        chart.append(1.0, at(10), Mode::Automatic);
        chart.append(2.0, at(5), Mode::Automatic);

        assert_eq!(chart.samples()[1].timestamp, at(10));
        assert_eq!(chart.time_span(), Some((at(10), at(10))));
    }

    #[test]
    fn manual_entry_locks_until_the_series_is_empty() {
        let mut chart = ChartModel::default();
        chart.append(1.0, at(0), Mode::Automatic);
        assert!(!chart.locks_mode_switch());

        chart.append(2.0, at(1), Mode::Manual);
        assert!(chart.locks_mode_switch());

        chart.pop_last();
        assert!(chart.locks_mode_switch(), "one sample left");
        chart.pop_last();
        assert!(!chart.locks_mode_switch());

        chart.append(2.0, at(1), Mode::Manual);
        chart.clear();
        assert!(!chart.locks_mode_switch());
        assert!(chart.is_empty());
    }

    #[test]
    fn percentage_metrics_are_pinned_only_while_tracking() {
        assert_eq!(YBounds::for_metric(Mode::Automatic, MetricId::CpuPercent), YBounds::PERCENTAGE);
        assert_eq!(YBounds::for_metric(Mode::Automatic, MetricId::NetSentKbs), YBounds::AUTO);
        assert_eq!(YBounds::for_metric(Mode::Manual, MetricId::CpuPercent), YBounds::AUTO);
    }

    #[test]
    fn y_range_pads_data_unless_bounds_are_fixed() {
        let mut chart = ChartModel::default();
        let [lo, hi] = chart.y_range();
        assert!(lo < 0.0 && hi > 1.0);

        chart.append(10.0, at(0), Mode::Automatic);
        chart.append(20.0, at(1), Mode::Automatic);
        assert_eq!(chart.y_range(), [9.0, 21.0]);

        chart.set_y_axis_bounds(Some(0.0), Some(100.0));
        assert_eq!(chart.y_range(), [0.0, 100.0]);

        chart.set_y_axis_bounds(Some(0.0), None);
        assert_eq!(chart.y_range(), [0.0, 21.0]);
    }

    #[test]
    fn colors_parse_and_print_as_hex() {
        let color: RgbColor = "#FF8000".parse().unwrap();
        assert_eq!(color, RgbColor { r: 255, g: 128, b: 0 });
        assert_eq!(color.to_string(), "#ff8000");
        assert_eq!(RgbColor::default().to_string(), DEFAULT_COLOR);

        assert!("#12345".parse::<RgbColor>().is_err());
        assert!("#zzzzzz".parse::<RgbColor>().is_err());
    }

    #[test]
    fn time_span_covers_first_to_last() {
        let mut chart = ChartModel::default();
        assert_eq!(chart.time_span(), None);
        chart.append(1.0, at(0), Mode::Automatic);
        chart.append(1.0, at(0) + TimeDelta::seconds(3), Mode::Automatic);
        assert_eq!(chart.time_span(), Some((at(0), at(3))));
    }
}
