use thiserror::Error;

pub use bridge_traits::error::{FsError, Result};

/// Errors raised while building configuration or wiring logging.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

/// Predicate form of [`FsError::is_not_found`].
pub fn is_not_found_error(err: &FsError) -> bool {
    err.is_not_found()
}

/// Predicate form of [`FsError::is_already_exists`].
pub fn is_already_exists_error(err: &FsError) -> bool {
    err.is_already_exists()
}

pub(crate) fn invalid_input(message: impl Into<String>) -> FsError {
    FsError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        message.into(),
    ))
}
