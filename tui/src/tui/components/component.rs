use crate::tui::{
    keybindings::KeyBindings,
    Action,
    Event,
};
use color_eyre::Result;
use crossterm::event::KeyEvent;
use nanograph_config::Config;
use ratatui::{
    layout::{
        Rect,
        Size,
    },
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

/// A piece of the UI that reacts to events and actions and draws itself.
///
/// Components are driven by the [`App`](crate::App) loop: events go to
/// focused components, actions go to all of them, and visible components are
/// drawn every frame.
pub trait Component: std::fmt::Debug {
    /// Called once before the loop starts. Components that send actions on
    /// their own (outside of `update`) keep the sender.
    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) -> Result<()> {
        let _ = tx;
        Ok(())
    }

    fn register_config_handler(&mut self, config: Config, keybindings: KeyBindings) -> Result<()> {
        let _ = (config, keybindings);
        Ok(())
    }

    fn init(&mut self, area: Size) -> Result<()> {
        let _ = area;
        Ok(())
    }

    fn handle_events(&mut self, event: Option<Event>) -> Result<Option<Action>> {
        match event {
            Some(Event::Key(key_event)) => self.handle_key_event(key_event),
            _ => Ok(None),
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let _ = key;
        Ok(None)
    }

    /// Reacts to an action. The returned action is queued for all components.
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let _ = action;
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame<'_>, area: Rect) -> Result<()>;

    fn is_visible(&self) -> bool {
        true
    }

    fn is_focused(&self) -> bool {
        false
    }
}
