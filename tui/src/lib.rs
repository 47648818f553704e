#[macro_use]
extern crate tracing;

mod errors;
pub mod logging;
mod tui;

pub use errors::init_errors;
pub use tui::{
    App,
    Tui,
};
