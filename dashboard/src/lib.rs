//! Headless core of the Nanograph dashboard.
//!
//! - [`source`]: talks to the stats service and turns responses into chart values
//! - [`chart`]: the plotted series and its presentation state
//! - [`tracking`]: the timer driven polling loop
//! - [`export`]: PNG, CSV and JSON snapshots of the series
//! - [`Dashboard`]: the manual/automatic state machine tying the above together
//!
//! Nothing in here touches the terminal, so every flow can be driven from tests.

#[macro_use]
extern crate tracing;

pub mod chart;
mod dashboard;
pub mod export;
pub mod source;
pub mod tracking;

pub use dashboard::{
    Controls,
    Dashboard,
    Intent,
    Notice,
};
