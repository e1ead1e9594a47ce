//! Shared helpers: tracing setup and duration formatting.

mod logging;
mod time;

pub use logging::init_tracing;
pub use time::format_duration;
