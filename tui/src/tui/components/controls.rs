use crate::tui::{
    keybindings::{
        KeyBindings,
        Keymap,
    },
    layout::header_controls_and_chart,
    lock,
    widgets::{
        self,
        RowState,
    },
    Action,
    ActivateAction,
    Component,
    FocusedTopLevelComponent,
    SharedDashboard,
    Theme,
};
use color_eyre::Result;
use crossterm::event::{
    KeyCode,
    KeyEvent,
};
use eyre::OptionExt as _;
use nanograph_config::{
    interval_label,
    Config,
    MetricId,
    Mode,
    Settings,
    DEFAULT_COLOR,
    DEFAULT_PING_HOST,
    INTERVAL_PRESETS,
};
use nanograph_dashboard::{
    chart::RgbColor,
    export::ExportFormat,
    Controls,
    Intent,
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use strum::{
    Display,
    IntoEnumIterator as _,
};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum SelectedField {
    #[default]
    Mode,
    Value,
    Undo,
    Metric,
    Interval,
    PingHost,
    Pid,
    IncludeChildren,
    Tracking,
    Color,
    Restart,
    Export,
}

impl SelectedField {
    /// The rows offered for the current dashboard state, top to bottom.
    fn visible(controls: &Controls) -> Vec<SelectedField> {
        let mut fields = vec![SelectedField::Mode];
        if controls.manual_controls_visible {
            fields.extend([SelectedField::Value, SelectedField::Undo]);
        }
        if controls.auto_controls_visible {
            fields.extend([SelectedField::Metric, SelectedField::Interval]);
            if controls.ping_host_visible {
                fields.push(SelectedField::PingHost);
            }
            if controls.pid_visible {
                fields.extend([SelectedField::Pid, SelectedField::IncludeChildren]);
            }
            fields.push(SelectedField::Tracking);
        }
        fields.extend([SelectedField::Color, SelectedField::Restart, SelectedField::Export]);
        fields
    }

    fn label(&self) -> &'static str {
        match self {
            SelectedField::Mode => "Mode:",
            SelectedField::Value => "Add value:",
            SelectedField::Undo => "Undo",
            SelectedField::Metric => "Metric:",
            SelectedField::Interval => "Interval:",
            SelectedField::PingHost => "Ping host:",
            SelectedField::Pid => "PID:",
            SelectedField::IncludeChildren => "Children:",
            SelectedField::Tracking => "Tracking",
            SelectedField::Color => "Color:",
            SelectedField::Restart => "Restart",
            SelectedField::Export => "Export",
        }
    }

    fn is_enabled(&self, controls: &Controls) -> bool {
        match self {
            SelectedField::Mode => controls.mode_switch_enabled,
            SelectedField::Metric
            | SelectedField::Interval
            | SelectedField::PingHost
            | SelectedField::Pid
            | SelectedField::IncludeChildren => controls.selectors_enabled,
            _ => true,
        }
    }

    fn is_button(&self) -> bool {
        matches!(
            self,
            SelectedField::Undo | SelectedField::Tracking | SelectedField::Restart | SelectedField::Export
        )
    }

    fn selected_help(&self) -> &'static str {
        match self {
            SelectedField::Mode => " <enter> to switch between manual and automatic ",
            SelectedField::Value => " Type a number and press <enter> to plot it ",
            SelectedField::Undo => " Remove the last point ",
            SelectedField::Metric => " <enter> to pick what to track ",
            SelectedField::Interval => " <enter> to pick how often to poll ",
            SelectedField::PingHost => " Host to ping. <del> resets it ",
            SelectedField::Pid => " Process to watch. <del> clears it ",
            SelectedField::IncludeChildren => " Count child processes too? <enter> to toggle ",
            SelectedField::Tracking => " Start or stop polling the stats service ",
            SelectedField::Color => " Series color as #rrggbb. <del> resets it ",
            SelectedField::Restart => " Clear the chart ",
            SelectedField::Export => " <enter> to save the series as PNG, CSV or JSON ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display, serde::Serialize, serde::Deserialize)]
pub(crate) enum ControlsAction {
    MoveUp,
    MoveDown,
    Select,
    DeleteSelectedField,
}

#[derive(Debug)]
enum Editing {
    Text {
        field: SelectedField,
        input: widgets::TextInput,
    },
    Metric(widgets::ListInput<MetricId>),
    Interval(widgets::ListInput<u64>),
    Export(widgets::ListInput<ExportFormat>),
}

impl Editing {
    fn draw(&mut self, frame: &mut Frame<'_>, area: Rect) -> Result<()> {
        match self {
            Editing::Text { input, .. } => input.draw(frame, area),
            Editing::Metric(list) => list.draw(frame, area),
            Editing::Interval(list) => list.draw(frame, area),
            Editing::Export(list) => list.draw(frame, area),
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        match self {
            Editing::Text { input, .. } => input.handle_key_event(key),
            Editing::Metric(list) => list.handle_key_event(key),
            Editing::Interval(list) => list.handle_key_event(key),
            Editing::Export(list) => list.handle_key_event(key),
        }
    }

    fn finish(self) -> Option<Intent> {
        match self {
            Editing::Text { field, input } => {
                let content = input.finish();
                match field {
                    SelectedField::Value => Some(Intent::AddValue(content)),
                    SelectedField::PingHost => Some(Intent::SetPingHost(content.trim().to_string())),
                    SelectedField::Pid => Some(Intent::SetPid(content.trim().to_string())),
                    SelectedField::Color => Some(Intent::SetColor(content.trim().to_string())),
                    _ => None,
                }
            }
            Editing::Metric(list) => list.finish().map(Intent::SelectMetric),
            Editing::Interval(list) => list.finish().map(Intent::SetInterval),
            Editing::Export(list) => list.finish().map(Intent::Export),
        }
    }
}

// -=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-=-

/// The form on the left of the dashboard screen.
#[derive(Debug)]
pub struct ControlsForm {
    focused: bool,
    visible: bool,
    command_tx: Option<UnboundedSender<Action>>,
    keymap: Keymap,
    dashboard: SharedDashboard,
    selected: SelectedField,
    editing: Option<Editing>,
}

impl ControlsForm {
    pub fn new(dashboard: SharedDashboard) -> Self {
        Self {
            focused: true,
            visible: true,
            command_tx: None,
            keymap: Keymap::default(),
            dashboard,
            selected: SelectedField::Mode,
            editing: None,
        }
    }

    fn snapshot(&self) -> (Controls, Settings, RgbColor) {
        let dashboard = lock(&self.dashboard);
        (dashboard.controls(), dashboard.settings().clone(), dashboard.chart().color())
    }

    /// The selected row, or the first one if it is no longer offered.
    fn selected_index(&self, fields: &[SelectedField]) -> usize {
        fields.iter().position(|field| *field == self.selected).unwrap_or(0)
    }

    fn select(&mut self) -> Option<Action> {
        let (controls, settings, color) = self.snapshot();
        let fields = SelectedField::visible(&controls);
        let field = fields[self.selected_index(&fields)];
        if !field.is_enabled(&controls) {
            debug!(?field, "Field is disabled");
            return None;
        }

        let editing = match field {
            SelectedField::Mode => {
                let mode = match controls.mode {
                    Mode::Manual => Mode::Automatic,
                    Mode::Automatic => Mode::Manual,
                };
                return Some(Action::Dispatch(Intent::SetMode(mode)));
            }
            SelectedField::Undo => return Some(Action::Dispatch(Intent::Undo)),
            SelectedField::IncludeChildren => {
                return Some(Action::Dispatch(Intent::SetIncludeChildren(!settings.include_children)))
            }
            SelectedField::Tracking => return Some(Action::Dispatch(Intent::ToggleTracking)),
            SelectedField::Restart => return Some(Action::Dispatch(Intent::Restart)),

            SelectedField::Value => Editing::Text {
                field,
                input: widgets::TextInput::new("Add value", "a number, e.g. 42.5", ""),
            },
            SelectedField::PingHost => Editing::Text {
                field,
                input: widgets::TextInput::new("Ping host", DEFAULT_PING_HOST, &settings.ping_host),
            },
            SelectedField::Pid => Editing::Text {
                field,
                input: widgets::TextInput::new("Process ID", "e.g. 1234", &settings.pid),
            },
            SelectedField::Color => Editing::Text {
                field,
                input: widgets::TextInput::new("Series color", DEFAULT_COLOR, color),
            },
            SelectedField::Metric => Editing::Metric(widgets::ListInput::with_current(
                "Metric",
                MetricId::iter().map(|metric| (metric.label(), metric)),
                &settings.stat,
            )),
            SelectedField::Interval => Editing::Interval(widgets::ListInput::with_current(
                "Interval",
                INTERVAL_PRESETS.iter().map(|ms| (interval_label(*ms), *ms)),
                &settings.interval,
            )),
            SelectedField::Export => Editing::Export(widgets::ListInput::with_current(
                "Export as",
                ExportFormat::iter().map(|format| (format.to_string(), format)),
                &ExportFormat::Png,
            )),
        };

        self.editing = Some(editing);
        Some(Action::UpdateGlobalKeybindings(Keymap::default()))
    }

    fn delete_selected(&self) -> Option<Action> {
        let intent = match self.selected {
            SelectedField::PingHost => Intent::SetPingHost(DEFAULT_PING_HOST.to_string()),
            SelectedField::Pid => Intent::SetPid(String::new()),
            SelectedField::Color => Intent::SetColor(DEFAULT_COLOR.to_string()),
            _ => return None,
        };
        Some(Action::Dispatch(intent))
    }

    fn move_selection(&mut self, up: bool) {
        let (controls, ..) = self.snapshot();
        let fields = SelectedField::visible(&controls);
        let index = self.selected_index(&fields);
        let index = if up {
            index.saturating_sub(1)
        } else {
            (index + 1).min(fields.len() - 1)
        };
        self.selected = fields[index];
    }

    fn row_value(&self, field: SelectedField, controls: &Controls, settings: &Settings) -> String {
        match field {
            SelectedField::Mode => {
                let locked = if controls.mode_switch_enabled { "" } else { " (locked)" };
                format!("{}{locked}", controls.mode.title())
            }
            SelectedField::Value => "<enter>".to_string(),
            SelectedField::Metric => settings.stat.label().to_string(),
            SelectedField::Interval => interval_label(settings.interval),
            SelectedField::PingHost => settings.ping_host.clone(),
            SelectedField::Pid if controls.pid_missing => "enter a PID".to_string(),
            SelectedField::Pid => settings.pid.clone(),
            SelectedField::Tracking if controls.tracking => "Stop tracking".to_string(),
            SelectedField::Tracking => "Start tracking".to_string(),
            SelectedField::Export => "Export...".to_string(),
            other => other.label().to_string(),
        }
    }
}

impl Component for ControlsForm {
    fn is_visible(&self) -> bool {
        self.visible
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) -> Result<()> {
        self.command_tx = Some(tx);
        Ok(())
    }

    fn register_config_handler(&mut self, _config: Config, keybindings: KeyBindings) -> Result<()> {
        self.keymap = keybindings
            .get(&FocusedTopLevelComponent::Dashboard)
            .cloned()
            .ok_or_eyre("No keymap found for Dashboard")?;
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let Some(mut editing) = self.editing.take() {
            match key.code {
                KeyCode::Enter => {
                    if let Some(intent) = editing.finish() {
                        if let Some(tx) = &self.command_tx {
                            tx.send(Action::Dispatch(intent))?;
                        }
                    }
                    return Ok(Some(Action::Activate(ActivateAction::Dashboard)));
                }
                KeyCode::Esc => {
                    return Ok(Some(Action::Activate(ActivateAction::Dashboard)));
                }
                _ => {}
            }

            editing.handle_key_event(key);
            self.editing = Some(editing);
            return Ok(None);
        }

        let action = match key.code {
            KeyCode::Delete | KeyCode::Backspace => Some(ControlsAction::DeleteSelectedField),
            KeyCode::Up => Some(ControlsAction::MoveUp),
            KeyCode::Down => Some(ControlsAction::MoveDown),
            KeyCode::Enter => Some(ControlsAction::Select),
            _ => None,
        };

        Ok(action.map(Action::ControlsAction))
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let action = match action {
            Action::Activate(ActivateAction::Dashboard) => {
                self.focused = true;
                self.visible = true;
                // a notice was dismissed while an editor is still open
                if self.editing.is_some() {
                    return Ok(Some(Action::UpdateGlobalKeybindings(Keymap::default())));
                }
                return Ok(Some(Action::UpdateGlobalKeybindings(self.keymap.clone())));
            }
            Action::Activate(_) => {
                self.focused = false;
                self.visible = false;
                return Ok(None);
            }
            Action::ShowNotice(_) => {
                self.focused = false;
                return Ok(None);
            }
            Action::ControlsAction(action) => action,
            _ => return Ok(None),
        };

        if self.editing.is_some() {
            return Ok(None);
        }

        let next = match action {
            ControlsAction::MoveUp => {
                self.move_selection(true);
                None
            }
            ControlsAction::MoveDown => {
                self.move_selection(false);
                None
            }
            ControlsAction::Select => self.select(),
            ControlsAction::DeleteSelectedField => self.delete_selected(),
        };
        Ok(next)
    }

    fn draw(&mut self, frame: &mut Frame<'_>, area: Rect) -> Result<()> {
        let theme = Theme::default();
        let [_, area, _] = header_controls_and_chart(area)?;
        let (controls, settings, color) = self.snapshot();
        let fields = SelectedField::visible(&controls);
        let selected = fields[self.selected_index(&fields)];

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border(self.focused))
            .title(format!("{} controls", controls.mode.title()))
            .title_bottom(Line::from(selected.selected_help()).centered());
        frame.render_widget(&block, area);
        let area = block.inner(area);

        let constraints = fields
            .iter()
            .map(|field| Constraint::Length(if field.is_button() { 3 } else { 1 }));
        let rows = Layout::vertical(constraints).split(area);

        let label_width = fields.iter().map(|field| field.label().len()).max().unwrap_or(0) + 1;

        for (field, row) in fields.iter().zip(rows.iter()) {
            let is_selected = self.focused && *field == selected;
            let enabled = field.is_enabled(&controls);
            let mut state = RowState::new(is_selected, enabled);
            if *field == SelectedField::Pid && controls.pid_missing && !is_selected {
                state = RowState::Hint;
            }

            match field {
                SelectedField::IncludeChildren => frame.render_widget(
                    widgets::label_and_bool(field.label(), settings.include_children, label_width, state, &theme),
                    *row,
                ),
                SelectedField::Color => frame.render_widget(
                    widgets::label_and_swatch(field.label(), color, label_width, state, &theme),
                    *row,
                ),
                field if field.is_button() => frame.render_widget(
                    widgets::button(self.row_value(*field, &controls, &settings), is_selected, enabled, &theme),
                    *row,
                ),
                field => frame.render_widget(
                    widgets::label_and_text(
                        field.label(),
                        self.row_value(*field, &controls, &settings),
                        label_width,
                        state,
                        &theme,
                    ),
                    *row,
                ),
            }
        }

        if let Some(editing) = &mut self.editing {
            editing.draw(frame, area)?;
        }

        Ok(())
    }
}
