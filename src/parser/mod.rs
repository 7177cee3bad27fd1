//! HTTP request head parser.
//!
//! Turns the bytes of a request line and header block into an [`HttpRequest`].
//! Bodies are not parsed here; the server streams them to handlers.

mod request;
mod method;
mod version;
mod error;
mod tests;

// Re-export public items
pub use request::HttpRequest;
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

pub use request::{head_len, parse_request};
