use crate::tui::layout;
use crossterm::event::{
    KeyCode,
    KeyEvent,
    KeyModifiers,
};
use eyre::Result;
use ratatui::{
    layout::{
        Constraint,
        Rect,
    },
    style::Style,
    widgets::{
        Block,
        Borders,
        Clear,
    },
    Frame,
};
use tui_textarea::TextArea;

/// Single line editor shown as a popup. The caller owns Enter and Esc.
#[derive(Debug)]
pub(crate) struct TextInput {
    editor: TextArea<'static>,
}

impl TextInput {
    pub(crate) fn new(title: &'static str, placeholder: &'static str, content: impl ToString) -> Self {
        let mut editor = TextArea::new(vec![content.to_string()]);
        editor.set_cursor_line_style(Style::default());
        editor.set_placeholder_text(placeholder);
        editor.set_block(Block::default().borders(Borders::ALL).title(title));
        editor.select_all();
        Self { editor }
    }

    pub(crate) fn draw(&mut self, frame: &mut Frame<'_>, _area: Rect) -> Result<()> {
        let area = layout::center(frame.area(), Constraint::Max(60), Constraint::Length(3));
        frame.render_widget(Clear, area);
        frame.render_widget(&self.editor, area);
        Ok(())
    }

    pub(crate) fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        // newlines would end up in hostnames and pids
        if key.code == KeyCode::Enter || (key.code == KeyCode::Char('m') && key.modifiers == KeyModifiers::CONTROL) {
            return false;
        }
        self.editor.input(key)
    }

    pub(crate) fn finish(self) -> String {
        self.editor.into_lines().concat()
    }
}
