//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur while parsing an HTTP request head.
#[derive(Debug, Error)]
pub enum Error {
    /// The method token contains characters outside the token alphabet.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The request target is neither origin-form nor an http(s) URI, or it
    /// holds a broken percent escape.
    #[error("Invalid HTTP path: {0}")]
    InvalidPath(String),

    /// The request line is malformed (wrong format or missing components).
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The HTTP version in the request is not supported.
    #[error("Invalid HTTP version: {0}")]
    InvalidVersion(String),

    /// A required header is missing from the request.
    #[error("Required header is missing: {0}")]
    MissingHeader(String),

    /// A header line has no colon or an empty name.
    #[error("Invalid header format: {0}")]
    InvalidHeaderFormat(String),

    /// The Content-Length header is not a decimal byte count.
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// The request is empty.
    #[error("Empty request")]
    EmptyRequest,
}
