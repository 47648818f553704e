use super::{
    Action,
    ActivateAction,
    FocusedTopLevelComponent,
};
use crossterm::event::{
    KeyCode,
    KeyEvent,
    KeyModifiers,
};
use derive_more::{
    Deref,
    DerefMut,
};
use nanograph_dashboard::{
    export::ExportFormat,
    Intent,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;

/// Key sequences and the action each one triggers.
#[derive(Clone, Debug, Default, Deref, DerefMut, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keymap(pub HashMap<Vec<KeyEvent>, Action>);

impl Keymap {
    fn bind(mut self, code: KeyCode, modifiers: KeyModifiers, action: Action) -> Self {
        self.0.insert(vec![KeyEvent::new(code, modifiers)], action);
        self
    }

    fn key(self, c: char, action: Action) -> Self {
        self.bind(KeyCode::Char(c), KeyModifiers::NONE, action)
    }

    fn ctrl(self, c: char, action: Action) -> Self {
        self.bind(KeyCode::Char(c), KeyModifiers::CONTROL, action)
    }

    /// Bindings that apply on every screen.
    fn navigation() -> Self {
        Self::default()
            .key('q', Action::Quit)
            .ctrl('c', Action::Quit)
            .ctrl('z', Action::Suspend)
            .key('1', Action::Activate(ActivateAction::Dashboard))
            .key('2', Action::Activate(ActivateAction::Logs))
    }
}

#[derive(Clone, Debug, Deref, DerefMut)]
pub struct KeyBindings(pub HashMap<FocusedTopLevelComponent, Keymap>);

impl Default for KeyBindings {
    fn default() -> Self {
        let dashboard = Keymap::navigation()
            .key('t', Action::Dispatch(Intent::ToggleTracking))
            .key('r', Action::Dispatch(Intent::Restart))
            .key('u', Action::Dispatch(Intent::Undo))
            .key('p', Action::Dispatch(Intent::Export(ExportFormat::Png)))
            .key('c', Action::Dispatch(Intent::Export(ExportFormat::Csv)))
            .key('j', Action::Dispatch(Intent::Export(ExportFormat::Json)));

        Self(HashMap::from([
            (FocusedTopLevelComponent::Dashboard, dashboard),
            (FocusedTopLevelComponent::Logs, Keymap::navigation()),
        ]))
    }
}
