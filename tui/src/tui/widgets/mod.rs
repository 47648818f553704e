mod button;
mod label_and_text;
mod list_input;
mod text_input;

pub(crate) use button::button;
pub(crate) use label_and_text::{
    label_and_bool,
    label_and_swatch,
    label_and_text,
    RowState,
};
pub(crate) use list_input::ListInput;
pub(crate) use text_input::TextInput;
