//! Routing, dispatch, and the HTTP transport.
//!
//! A [`Router`] maps exact (method, path) pairs to handlers. [`HttpServer`]
//! accepts connections, wraps each request in a [`Request`] view and a
//! [`Response`] sink, and hands them to the router.

mod response;
mod request;
mod config;
mod error;
mod handler;
mod router;
mod http_server;

// Re-export public items
pub use response::{Response, StatusCode};
pub use request::{Body, Request};
pub use config::ServerConfig;
pub use error::{BoxError, Error};
pub use handler::{Handler, HandlerFuture};
pub use router::Router;
pub use http_server::HttpServer;
