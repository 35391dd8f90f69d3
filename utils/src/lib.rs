//! Shared utilities for the stakepool workspace.

pub mod logging;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use time::{format_days, format_duration};
