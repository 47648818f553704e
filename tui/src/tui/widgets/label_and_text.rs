use crate::tui::theme::Theme;
use nanograph_dashboard::chart::RgbColor;
use ratatui::{
    prelude::*,
    widgets::*,
};

/// How a form row's value is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RowState {
    Normal,
    Selected,
    Disabled,
    /// Needs the user's attention, e.g. a required input left blank.
    Hint,
}

impl RowState {
    pub(crate) fn new(selected: bool, enabled: bool) -> Self {
        match (enabled, selected) {
            (false, _) => RowState::Disabled,
            (true, true) => RowState::Selected,
            (true, false) => RowState::Normal,
        }
    }

    fn style(&self, theme: &Theme) -> Style {
        match self {
            RowState::Normal => theme.text_default,
            RowState::Selected => theme.text_selected,
            RowState::Disabled => theme.text_disabled,
            RowState::Hint => theme.text_hint,
        }
    }
}

fn label_span(label: impl ToString, label_width: usize) -> Span<'static> {
    Span::raw(format!("{:width$}", label.to_string(), width = label_width))
}

pub(crate) fn label_and_text<'a>(
    label: impl ToString,
    content: impl ToString,
    label_width: usize,
    state: RowState,
    theme: &Theme,
) -> Paragraph<'a> {
    Paragraph::new(Line::from(vec![
        label_span(label, label_width),
        Span::styled(content.to_string(), state.style(theme)),
    ]))
}

pub(crate) fn label_and_bool<'a>(
    label: impl ToString,
    content: bool,
    label_width: usize,
    state: RowState,
    theme: &Theme,
) -> Paragraph<'a> {
    let content = if content { "[x]" } else { "[ ]" };
    label_and_text(label, content, label_width, state, theme)
}

/// The color's hex code followed by a sample of it.
pub(crate) fn label_and_swatch<'a>(
    label: impl ToString,
    color: RgbColor,
    label_width: usize,
    state: RowState,
    theme: &Theme,
) -> Paragraph<'a> {
    Paragraph::new(Line::from(vec![
        label_span(label, label_width),
        Span::styled(color.to_string(), state.style(theme)),
        Span::raw(" "),
        Span::styled("■■■", Style::default().fg(Theme::series(color))),
    ]))
}
