use crate::{
    logging::log_path,
    tui::{
        keybindings::{
            KeyBindings,
            Keymap,
        },
        layout::header_and_main_area,
        Action,
        ActivateAction,
        Component,
        FocusedTopLevelComponent,
    },
};
use color_eyre::Result;
use crossterm::event::{
    KeyCode,
    KeyEvent,
};
use derive_more::Debug;
use eyre::OptionExt as _;
use nanograph_config::Config;
use ratatui::{
    layout::Rect,
    style::{
        Color,
        Style,
    },
    widgets::Widget as _,
    Frame,
};
use strum::Display;
use tui_logger::{
    LevelFilter,
    TuiLoggerLevelOutput,
    TuiLoggerSmartWidget,
    TuiWidgetEvent,
    TuiWidgetState,
};

const TRACKING_TARGET: &str = "nanograph_dashboard::tracking";
const SOURCE_TARGETS: [&str; 2] = ["nanograph_dashboard::source", "nanograph_dashboard::source::http"];
const CHART_TARGET: &str = "nanograph_dashboard::chart";
const HTTP_TARGETS: [&str; 3] = [
    "hyper_util::client::legacy::pool",
    "hyper_util::client::legacy::connect::http",
    "reqwest::connect",
];

/// How much of the log the view shows. `v` steps through the presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LogFilter {
    /// Warnings and errors, plus mode and tracking changes.
    #[strum(to_string = "quiet")]
    Quiet,
    /// Everything the dashboard does except per-sample chatter.
    #[strum(to_string = "normal")]
    Normal,
    /// Every sample and HTTP connection.
    #[strum(to_string = "verbose")]
    Verbose,
}

impl LogFilter {
    fn next(self) -> Self {
        match self {
            LogFilter::Quiet => LogFilter::Normal,
            LogFilter::Normal => LogFilter::Verbose,
            LogFilter::Verbose => LogFilter::Quiet,
        }
    }

    /// The level for messages from `target`.
    pub fn level_for(self, target: &str) -> LevelFilter {
        let tracking = target == TRACKING_TARGET;
        let sampling = target == CHART_TARGET || SOURCE_TARGETS.contains(&target);
        let http = HTTP_TARGETS.contains(&target);
        match self {
            LogFilter::Quiet if tracking => LevelFilter::Info,
            LogFilter::Quiet => LevelFilter::Warn,
            LogFilter::Normal if tracking => LevelFilter::Debug,
            LogFilter::Normal if http => LevelFilter::Warn,
            LogFilter::Normal => LevelFilter::Info,
            LogFilter::Verbose if http => LevelFilter::Debug,
            LogFilter::Verbose if sampling || tracking => LevelFilter::Trace,
            LogFilter::Verbose => LevelFilter::Debug,
        }
    }

    fn widget_state(self) -> TuiWidgetState {
        let targets = [TRACKING_TARGET, CHART_TARGET]
            .into_iter()
            .chain(SOURCE_TARGETS)
            .chain(HTTP_TARGETS);
        targets.fold(
            TuiWidgetState::new().set_default_display_level(self.level_for("")),
            |state, target| state.set_level_for_target(target, self.level_for(target)),
        )
    }
}

/// Smart widget commands kept on the log view. Everything else goes to the
/// global keymap.
fn widget_event(code: KeyCode) -> Option<TuiWidgetEvent> {
    let event = match code {
        KeyCode::PageUp => TuiWidgetEvent::PrevPageKey,
        KeyCode::PageDown => TuiWidgetEvent::NextPageKey,
        KeyCode::Esc => TuiWidgetEvent::EscapeKey,
        KeyCode::Up => TuiWidgetEvent::UpKey,
        KeyCode::Down => TuiWidgetEvent::DownKey,
        KeyCode::Left => TuiWidgetEvent::LeftKey,
        KeyCode::Right => TuiWidgetEvent::RightKey,
        KeyCode::Char('+') => TuiWidgetEvent::PlusKey,
        KeyCode::Char('-') => TuiWidgetEvent::MinusKey,
        KeyCode::Char('h') => TuiWidgetEvent::HideKey,
        KeyCode::Char('f') => TuiWidgetEvent::FocusKey,
        _ => return None,
    };
    Some(event)
}

/// The log viewer tab: the tracing output of this session, also written to
/// the log file named in the title.
#[derive(Debug)]
pub struct Logs {
    active: bool,
    /// False while a notice covers the screen.
    focused: bool,
    filter: LogFilter,
    #[debug(skip)]
    state: TuiWidgetState,
    title: String,
    keymap: Keymap,
}

impl Logs {
    pub fn new(debug: bool) -> Self {
        let filter = if debug { LogFilter::Verbose } else { LogFilter::Normal };
        let mut logs = Self {
            active: false,
            focused: false,
            filter,
            state: TuiWidgetState::new(),
            title: String::new(),
            keymap: Keymap::default(),
        };
        logs.set_filter(filter);
        logs
    }

    pub fn filter(&self) -> LogFilter {
        self.filter
    }

    fn set_filter(&mut self, filter: LogFilter) {
        self.filter = filter;
        self.state = filter.widget_state();
        self.title = format!("Log ({filter}, v to change) {}", log_path().display());
    }
}

impl Component for Logs {
    fn is_visible(&self) -> bool {
        self.active
    }

    fn is_focused(&self) -> bool {
        self.active && self.focused
    }

    fn register_config_handler(&mut self, _config: Config, keybindings: KeyBindings) -> Result<()> {
        self.keymap = keybindings
            .get(&FocusedTopLevelComponent::Logs)
            .cloned()
            .ok_or_eyre("No keymap found for Logs")?;
        Ok(())
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::Activate(ActivateAction::Logs) => {
                self.active = true;
                self.focused = true;
                return Ok(Some(Action::UpdateGlobalKeybindings(self.keymap.clone())));
            }
            Action::Activate(_) => {
                self.active = false;
            }
            Action::ShowNotice(_) => {
                self.focused = false;
            }
            _ => {}
        }
        Ok(None)
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.code == KeyCode::Char('v') {
            self.set_filter(self.filter.next());
            debug!(filter = %self.filter, "Log filter changed");
        } else if let Some(event) = widget_event(key.code) {
            self.state.transition(event);
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame<'_>, area: Rect) -> Result<()> {
        let [_header_area, area] = header_and_main_area(area)?;

        TuiLoggerSmartWidget::default()
            .style_error(Style::default().fg(Color::Red))
            .style_warn(Style::default().fg(Color::Yellow))
            .style_info(Style::default().fg(Color::Cyan))
            .style_debug(Style::default().fg(Color::Green))
            .style_trace(Style::default().fg(Color::DarkGray))
            .output_separator(' ')
            .output_timestamp(Some("%H:%M:%S".to_string()))
            .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
            .output_target(false)
            .output_file(false)
            .output_line(false)
            .title_log(self.title.as_str())
            .title_target("Sources")
            .state(&self.state)
            .render(area, frame.buffer_mut());

        Ok(())
    }
}
