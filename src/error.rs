//! Error types shared across the engine.
//!
//! Streaming threads never surface these to callers; they are logged and the
//! session ends. The public facade maps them to `bool` results.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// File or directory access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The MPEG decoder could not be created or rejected a frame.
    #[error("decode error: {0}")]
    Decode(String),

    /// Settings failed to load or validate.
    #[error("configuration error: {0}")]
    Config(String),

    /// The key/value store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// A track, story, chapter or playlist was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation does not apply in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl From<::config::ConfigError> for Error {
    fn from(e: ::config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
