//! Error types for routing, dispatch, and the HTTP transport.

use thiserror::Error;

use crate::parser::{Error as ParserError, Method};

/// Boxed error returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while routing or serving a request.
#[derive(Debug, Error)]
pub enum Error {
    /// No route is registered for the request method.
    ///
    /// Clients see a 404 for this, not a 405.
    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),

    /// The method has routes but none for this exact path.
    #[error("path {0} not found")]
    PathNotFound(String),

    /// A handler returned a failure.
    #[error("{0}")]
    Handler(BoxError),

    /// JSON serialization of a response value failed.
    #[error("JSON encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Error parsing an HTTP request head.
    #[error("Parse error: {0}")]
    Parse(#[from] ParserError),

    /// The request head did not fit in the read buffer.
    #[error("Request head exceeds {0} bytes")]
    HeaderTooLarge(usize),

    /// The request uses a transfer coding this server does not decode.
    #[error("Unsupported Transfer-Encoding: {0}")]
    UnsupportedTransferEncoding(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
