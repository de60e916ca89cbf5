//! Domain-specific errors.

use thiserror::Error;

use crate::domain::model::RadialPosition;

/// Convenience alias for results carrying a [`QuickMenusError`].
pub type Result<T, E = QuickMenusError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum QuickMenusError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("radial position {0} is already used by another set")]
    PositionConflict(RadialPosition),
    #[error("set index {index} out of range for collection of {len} sets")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("invalid node reference '{0}'")]
    InvalidReference(String),
    #[error("menu kind '{0}' does not declare a popup id")]
    MissingContract(String),
    #[error("persistence failure")]
    Persistence(#[source] anyhow::Error),
    #[error("host call failed")]
    Host(#[source] anyhow::Error),
}

impl QuickMenusError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
