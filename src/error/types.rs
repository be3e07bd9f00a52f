use thiserror::Error;

use crate::config::SettingsError;
use crate::logging::LoggingError;
use crate::nav::ViewId;
use crate::store::StoreError;

/// Unified result type for the shell crate.
pub type Result<T> = std::result::Result<T, ShellError>;

/// Errors surfaced by navigation, bootstrap and the terminal host.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("view `{0}` is not registered")]
    UnknownView(ViewId),
    #[error("view `{0}` registered twice")]
    DuplicateView(ViewId),
    #[error("no view is active")]
    NoActiveView,
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("terminal backend error: {0}")]
    Backend(String),
    #[error("window destroyed: {0}")]
    Destroyed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
