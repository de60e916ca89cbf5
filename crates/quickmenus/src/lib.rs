pub mod app;
pub mod cli;
pub mod domain;
pub mod host;
pub mod infra;

pub use app::plugin::QuickMenus;
pub use domain::errors::{QuickMenusError, Result};

/// Install the default stderr subscriber for embedding hosts that do not configure tracing.
pub fn init() {
    infra::logging::init(0);
}
