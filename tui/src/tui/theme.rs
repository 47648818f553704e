use nanograph_dashboard::chart::RgbColor;
use ratatui::style::{
    Color,
    Style,
};

#[derive(Clone, Copy, Debug)]
pub(super) struct Theme {
    pub(super) default: Style,
    pub(super) text_default: Style,
    pub(super) text_selected: Style,
    pub(super) text_disabled: Style,
    pub(super) text_hint: Style,
    pub(super) border_focused: Style,
    pub(super) border_unfocused: Style,
    pub(super) notice_info: Style,
    pub(super) notice_error: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            default: Style::default().bg(Color::Black).fg(Color::Gray),
            text_default: Style::default(),
            text_selected: Style::default().fg(Color::Yellow),
            text_disabled: Style::default().fg(Color::DarkGray),
            text_hint: Style::default().fg(Color::LightRed),
            border_focused: Style::default().fg(Color::White),
            border_unfocused: Style::default().fg(Color::DarkGray),
            notice_info: Style::default().fg(Color::Cyan),
            notice_error: Style::default().fg(Color::Red),
        }
    }
}

impl Theme {
    pub(super) fn border(&self, focused: bool) -> Style {
        if focused {
            self.border_focused
        } else {
            self.border_unfocused
        }
    }

    pub(super) fn series(color: RgbColor) -> Color {
        Color::Rgb(color.r, color.g, color.b)
    }
}
