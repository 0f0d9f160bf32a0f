//! Unified error type.

use thiserror::Error;

/// An error produced by a handler.
///
/// The chain never wraps or converts these: whatever a handler fails with is
/// what the caller of [`Road::request`](crate::Road::request) receives, so
/// `downcast_ref` recovers the original type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by byway's own fallible operations.
///
/// Routing outcomes (404, 405) are expressed as [`Response`](crate::Response)
/// values, not as `Error`s. This type surfaces misuse (bad templates, bad
/// urls) and failures while loading configuration or route files.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid route template `{template}`: {reason}")]
    InvalidTemplate {
        template: String,
        reason: &'static str,
    },

    #[error("path variable `{0}` is already bound")]
    DuplicateArg(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] http::uri::InvalidUri),

    #[error("invalid method `{0}`")]
    InvalidMethod(String),

    #[error("no handler registered as `{0}`")]
    UnknownHandler(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),
}
