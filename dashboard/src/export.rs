use crate::chart::{
    ChartModel,
    Sample,
};
use chrono::{
    DateTime,
    Local,
    SecondsFormat,
    TimeDelta,
    Utc,
};
use eyre::{
    eyre,
    Context as _,
    Result,
};
use plotters::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fs,
    ops::Range,
    path::{
        Path,
        PathBuf,
    },
};
use strum::{
    Display,
    EnumIter,
};

pub const PNG_WIDTH: u32 = 1200;
pub const PNG_HEIGHT: u32 = 600;

const BACKGROUND: RGBColor = RGBColor(0x12, 0x12, 0x12);
const GRID: RGBColor = RGBColor(0x33, 0x33, 0x33);
const LABEL: RGBColor = RGBColor(0xbb, 0xbb, 0xbb);
const FILL_OPACITY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
pub enum ExportFormat {
    #[strum(to_string = "PNG")]
    Png,
    #[strum(to_string = "CSV")]
    Csv,
    #[strum(to_string = "JSON")]
    Json,
}

impl ExportFormat {
    pub fn file_name(&self, now: DateTime<Utc>) -> String {
        let stamp = now.format("%Y-%m-%d_%H-%M-%S");
        match self {
            ExportFormat::Png => format!("graph_{stamp}.png"),
            ExportFormat::Csv => format!("graph_data_{stamp}.csv"),
            ExportFormat::Json => format!("graph_data_{stamp}.json"),
        }
    }

    /// An image of an empty chart is still a chart; data files are not.
    fn requires_data(&self) -> bool {
        !matches!(self, ExportFormat::Png)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No data to export.")]
    NoData,
    #[error("Export failed: {0:#}")]
    Failed(eyre::Report),
}

/// Writes the chart to `dir` and returns the path of the new file.
pub fn export(chart: &ChartModel, format: ExportFormat, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf, ExportError> {
    if format.requires_data() && chart.is_empty() {
        return Err(ExportError::NoData);
    }

    let path = dir.join(format.file_name(now));
    write(chart, format, dir, &path, now).map_err(ExportError::Failed)?;
    info!(%format, path = ?path, samples = chart.len(), "Exported chart");
    Ok(path)
}

fn write(chart: &ChartModel, format: ExportFormat, dir: &Path, path: &Path, now: DateTime<Utc>) -> Result<()> {
    fs::create_dir_all(dir).wrap_err_with(|| format!("Failed to create export directory {dir:?}"))?;
    match format {
        ExportFormat::Png => render_png(chart, path, now),
        ExportFormat::Csv => {
            let content = to_csv(chart.samples())?;
            fs::write(path, content).wrap_err_with(|| format!("Failed to write {path:?}"))
        }
        ExportFormat::Json => {
            let content = to_json(chart.samples())?;
            fs::write(path, content).wrap_err_with(|| format!("Failed to write {path:?}"))
        }
    }
}

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `timestamp,value` rows, CRLF terminated.
pub fn to_csv(samples: &[Sample]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(["timestamp", "value"])?;
    for sample in samples {
        writer.write_record([iso_timestamp(sample.timestamp), sample.value.to_string()])?;
    }
    writer
        .into_inner()
        .map_err(|e| eyre!("Failed to flush CSV: {}", e.error()))
}

#[derive(Debug, Serialize)]
struct ExportRow {
    timestamp: String,
    value: f64,
}

pub fn to_json(samples: &[Sample]) -> Result<String> {
    let rows = samples
        .iter()
        .map(|sample| ExportRow {
            timestamp: iso_timestamp(sample.timestamp),
            value: sample.value,
        })
        .collect::<Vec<_>>();
    serde_json::to_string_pretty(&rows).context("Failed to serialize samples")
}

/// Draws the series as a time line chart with a translucent fill under the
/// curve. An empty chart gets the last minute before `now` as its time axis.
pub fn render_png(chart: &ChartModel, path: &Path, now: DateTime<Utc>) -> Result<()> {
    let root = BitMapBackend::new(path, (PNG_WIDTH, PNG_HEIGHT)).into_drawing_area();
    root.fill(&BACKGROUND)?;

    let [y_min, y_max] = chart.y_range();
    let mut plot = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(time_range(chart, now), y_min..y_max)?;

    plot.configure_mesh()
        .bold_line_style(GRID)
        .light_line_style(BACKGROUND)
        .axis_style(LABEL)
        .label_style(("sans-serif", 14, &LABEL))
        .x_labels(8)
        .y_labels(6)
        .x_label_formatter(&|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
        .draw()?;

    let color = chart.color();
    let series = RGBColor(color.r, color.g, color.b);
    let points = chart.samples().iter().map(|sample| (sample.timestamp, sample.value));

    plot.draw_series(AreaSeries::new(points.clone(), y_min, series.mix(FILL_OPACITY)))?;
    plot.draw_series(LineSeries::new(points.clone(), series.stroke_width(2)))?;
    plot.draw_series(points.map(|point| Circle::new(point, 3, series.filled())))?;

    root.present().wrap_err_with(|| format!("Failed to write {path:?}"))?;
    Ok(())
}

/// First to last sample, at least one second wide.
fn time_range(chart: &ChartModel, now: DateTime<Utc>) -> Range<DateTime<Utc>> {
    match chart.time_span() {
        Some((first, last)) => first..last.max(first + TimeDelta::seconds(1)),
        None => now - TimeDelta::minutes(1)..now,
    }
}
