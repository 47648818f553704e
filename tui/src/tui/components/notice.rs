use crate::tui::{
    keybindings::Keymap,
    layout,
    Action,
    ActivateAction,
    Component,
    Theme,
};
use color_eyre::Result;
use crossterm::event::KeyEvent;
use nanograph_dashboard::Notice;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::collections::VecDeque;

/// Modal message box. Takes all keys while shown; any key dismisses the
/// oldest notice.
#[derive(Debug)]
pub struct NoticePopup {
    pending: VecDeque<Notice>,
    screen: ActivateAction,
}

impl Default for NoticePopup {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            screen: ActivateAction::Dashboard,
        }
    }
}

impl Component for NoticePopup {
    fn is_visible(&self) -> bool {
        !self.pending.is_empty()
    }

    fn is_focused(&self) -> bool {
        !self.pending.is_empty()
    }

    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(Some(Action::DismissNotice))
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::Activate(screen) => {
                self.screen = screen;
            }
            Action::ShowNotice(notice) => {
                match &notice {
                    Notice::Error(message) => warn!("{message}"),
                    Notice::Info(message) => info!("{message}"),
                }
                self.pending.push_back(notice);
                return Ok(Some(Action::UpdateGlobalKeybindings(Keymap::default())));
            }
            Action::DismissNotice => {
                self.pending.pop_front();
                if self.pending.is_empty() {
                    return Ok(Some(Action::Activate(self.screen)));
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame<'_>, _area: Rect) -> Result<()> {
        let Some(notice) = self.pending.front() else {
            return Ok(());
        };
        let theme = Theme::default();
        let (title, style) = if notice.is_error() {
            (" Error ", theme.notice_error)
        } else {
            (" Notice ", theme.notice_info)
        };

        let width = (notice.message().chars().count() as u16 + 4).clamp(30, 80);
        let lines = (notice.message().chars().count() as u16 / (width - 4)) + 1;
        let area = layout::center(frame.area(), Constraint::Length(width), Constraint::Length(lines + 3));

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(style)
            .title(title)
            .title_bottom(Line::from(" press any key ").centered());
        let text = Paragraph::new(notice.message().to_string())
            .wrap(Wrap { trim: true })
            .block(block);

        frame.render_widget(Clear, area);
        frame.render_widget(text, area);
        Ok(())
    }
}
