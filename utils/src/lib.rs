//! Shared utilities for the Phillet wallet client.

pub mod logging;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use time::format_remaining;
