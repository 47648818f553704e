use crate::tui::{
    layout,
    lock,
    Action,
    ActivateAction,
    Component,
    SharedDashboard,
    Theme,
};
use eyre::Result;
use ratatui::{
    layout::{
        Constraint,
        Layout,
    },
    style::{
        Color,
        Modifier,
        Style,
    },
    text::Line,
    widgets::{
        Block,
        Borders,
        Tabs,
    },
};

#[derive(Debug)]
pub struct NavTabs {
    screen: ActivateAction,
    dashboard: SharedDashboard,
}

impl NavTabs {
    pub fn new(dashboard: SharedDashboard) -> Self {
        Self {
            screen: ActivateAction::Dashboard,
            dashboard,
        }
    }
}

impl Component for NavTabs {
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if let Action::Activate(screen) = action {
            self.screen = screen;
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut ratatui::Frame, area: ratatui::prelude::Rect) -> Result<()> {
        let theme = Theme::default();
        let [header_area, _main_area] = layout::header_and_main_area(area)?;
        let [tabs_area, status_area] = Layout::horizontal([Constraint::Min(0), Constraint::Length(24)]).areas(header_area);

        let selected_tab = match self.screen {
            ActivateAction::Dashboard => 0,
            ActivateAction::Logs => 1,
        };

        let tabs = Tabs::new(vec!["Dashboard [1]", "Logs [2]"])
            .select(selected_tab)
            .style(Style::default().fg(Color::Gray))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .block(Block::new().borders(Borders::BOTTOM))
            .divider(" | ");
        frame.render_widget(tabs, tabs_area);

        let (status, style) = if lock(&self.dashboard).is_tracking() {
            ("● tracking", theme.notice_info)
        } else {
            ("○ idle", theme.text_disabled)
        };
        let status = Line::styled(status, style).right_aligned();
        frame.render_widget(
            ratatui::widgets::Paragraph::new(status).block(Block::new().borders(Borders::BOTTOM)),
            status_area,
        );

        Ok(())
    }
}
