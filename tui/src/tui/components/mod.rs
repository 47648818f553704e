pub mod chart_view;
#[allow(clippy::module_inception)]
mod component;
pub(crate) mod controls;
pub mod logs;
pub mod nav_tabs;
pub mod notice;

pub use component::Component;
