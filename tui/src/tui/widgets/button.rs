use crate::tui::theme::Theme;
use ratatui::{
    layout::Alignment,
    widgets::*,
};

pub(crate) fn button<'a>(label: impl ToString, selected: bool, enabled: bool, theme: &Theme) -> Paragraph<'a> {
    let style = match (enabled, selected) {
        (false, _) => theme.text_disabled,
        (true, true) => theme.text_selected,
        (true, false) => theme.border_unfocused,
    };

    Paragraph::new(label.to_string())
        .alignment(Alignment::Center)
        .style(style)
        .block(
            Block::new()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(style)
                .padding(Padding::horizontal(1)),
        )
}
