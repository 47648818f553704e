use crate::tui::{
    layout::header_controls_and_chart,
    lock,
    Action,
    ActivateAction,
    Component,
    SharedDashboard,
    Theme,
};
use chrono::{
    DateTime,
    Local,
    TimeDelta,
    Utc,
};
use color_eyre::Result;
use nanograph_config::Mode;
use nanograph_dashboard::chart::{
    ChartModel,
    Sample,
};
use ratatui::{
    prelude::*,
    widgets::*,
};

/// The time series plot on the right of the dashboard screen.
#[derive(Debug)]
pub struct ChartView {
    visible: bool,
    dashboard: SharedDashboard,
}

impl ChartView {
    pub fn new(dashboard: SharedDashboard) -> Self {
        Self {
            visible: true,
            dashboard,
        }
    }
}

/// Seconds since the first sample against the value.
fn points(samples: &[Sample]) -> Vec<(f64, f64)> {
    let Some(first) = samples.first() else {
        return Vec::new();
    };
    samples
        .iter()
        .map(|sample| {
            let offset = (sample.timestamp - first.timestamp).num_milliseconds() as f64 / 1_000.0;
            (offset, sample.value)
        })
        .collect()
}

/// At least a ten second window so a handful of points does not fill the
/// whole width.
fn x_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    let last = points.last().map(|(x, _)| *x).unwrap_or(0.0);
    [0.0, last.max(10.0)]
}

fn time_label(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

fn value_label(value: f64) -> String {
    if value.abs() >= 100.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn placeholder(mode: Mode, tracking: bool) -> &'static str {
    match (mode, tracking) {
        (Mode::Manual, _) => "Add a value to start the chart",
        (Mode::Automatic, false) => "Start tracking to poll the stats service",
        (Mode::Automatic, true) => "Waiting for the first reading...",
    }
}

fn x_labels(chart: &ChartModel, x_max: f64) -> Vec<Line<'static>> {
    let Some((first, _)) = chart.time_span() else {
        return Vec::new();
    };
    // the window can extend past the last sample
    let right = first + TimeDelta::milliseconds((x_max * 1_000.0) as i64);
    let middle = first + (right - first) / 2;
    vec![
        Line::from(time_label(first)),
        Line::from(time_label(middle)).centered(),
        Line::from(time_label(right)).right_aligned(),
    ]
}

impl Component for ChartView {
    fn is_visible(&self) -> bool {
        self.visible
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if let Action::Activate(screen) = action {
            self.visible = screen == ActivateAction::Dashboard;
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame<'_>, area: Rect) -> Result<()> {
        let theme = Theme::default();
        let [_, _, area] = header_controls_and_chart(area)?;
        let dashboard = lock(&self.dashboard);
        let chart = dashboard.chart();

        let title = match chart.last() {
            Some(sample) => format!(" {}  {} ", dashboard.title(), value_label(sample.value)),
            None => format!(" {} ", dashboard.title()),
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if chart.is_empty() {
            let text = Paragraph::new(placeholder(dashboard.mode(), dashboard.is_tracking()))
                .style(theme.text_disabled)
                .centered()
                .block(block);
            frame.render_widget(text, area);
            return Ok(());
        }

        let data = points(chart.samples());
        let x_bounds = x_bounds(&data);
        let [y_min, y_max] = chart.y_range();
        let series = Theme::series(chart.color());

        let datasets = vec![Dataset::default()
            .name(format!("{} points", data.len()))
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(series))
            .data(&data)];

        let widget = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .style(theme.text_disabled)
                    .bounds(x_bounds)
                    .labels(x_labels(chart, x_bounds[1])),
            )
            .y_axis(
                Axis::default()
                    .style(theme.text_disabled)
                    .bounds([y_min, y_max])
                    .labels(vec![
                        Line::from(value_label(y_min)),
                        Line::from(value_label((y_min + y_max) / 2.0)),
                        Line::from(value_label(y_max)),
                    ]),
            )
            .legend_position(Some(LegendPosition::TopRight));

        frame.render_widget(widget, area);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(millis: i64, value: f64) -> Sample {
        Sample {
            timestamp: DateTime::from_timestamp_millis(1_700_000_000_000 + millis).unwrap(),
            value,
        }
    }

    #[test]
    fn points_are_offsets_from_the_first_sample() {
        let samples = [sample(0, 1.0), sample(1_500, 2.0), sample(4_000, 3.0)];
        assert_eq!(points(&samples), vec![(0.0, 1.0), (1.5, 2.0), (4.0, 3.0)]);
        assert!(points(&[]).is_empty());
    }

    #[test]
    fn short_series_get_a_minimum_window() {
        assert_eq!(x_bounds(&[(0.0, 1.0), (2.0, 1.0)]), [0.0, 10.0]);
        assert_eq!(x_bounds(&[(0.0, 1.0), (42.0, 1.0)]), [0.0, 42.0]);
        assert_eq!(x_bounds(&[]), [0.0, 10.0]);
    }

    #[test]
    fn value_labels_drop_decimals_for_large_numbers() {
        assert_eq!(value_label(12.346), "12.35");
        assert_eq!(value_label(2048.4), "2048");
    }

    #[test]
    fn placeholder_depends_on_mode() {
        assert_eq!(placeholder(Mode::Manual, false), "Add a value to start the chart");
        assert_ne!(placeholder(Mode::Automatic, true), placeholder(Mode::Automatic, false));
    }
}
