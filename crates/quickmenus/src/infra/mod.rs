//! Infrastructure adapters for configuration and logging.

pub mod config;
pub mod logging;
