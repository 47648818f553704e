use super::components::controls;
use crate::tui::keybindings::Keymap;
use nanograph_dashboard::{
    Intent,
    Notice,
};
use serde::{
    Deserialize,
    Serialize,
};
use serde_yml::with::singleton_map_recursive;
use strum::Display;

#[derive(Display, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Action {
    Tick,
    Render,
    Resize(u16, u16),
    Suspend,
    Resume,
    Quit,
    ClearScreen,
    UpdateGlobalKeybindings(Keymap),

    Activate(ActivateAction),

    #[allow(clippy::enum_variant_names)]
    #[serde(with = "singleton_map_recursive")]
    #[allow(private_interfaces)]
    ControlsAction(controls::ControlsAction),

    /// Forwarded to the dashboard by the app loop.
    #[serde(with = "singleton_map_recursive")]
    Dispatch(Intent),

    #[serde(with = "singleton_map_recursive")]
    ShowNotice(Notice),
    DismissNotice,
}

#[derive(Display, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivateAction {
    Dashboard,
    Logs,
}
