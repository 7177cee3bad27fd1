//! A minimal HTTP routing shim.
//!
//! Handlers are registered against an exact HTTP method and path. Each
//! incoming request is wrapped in a [`Request`] view and a [`Response`] sink
//! and dispatched to the matching handler.
//!
//! # Features
//!
//! - Exact, case-sensitive method + path routing; the last registration wins
//! - Query-string and urlencoded form accessors
//! - Plain-text, HTML and JSON response helpers
//! - A small tokio HTTP/1 server with a connection limit and graceful shutdown
//!
//! Unmatched requests get a `404` with a plain-text body naming the path,
//! whether the method or the path is unknown. A handler returning `Err` turns
//! into a `500` carrying the error message.
//!
//! # Examples
//!
//! ```no_run
//! use bottle_rs::{HttpServer, Router, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bottle_rs::ServerError> {
//!     let mut app = Router::new();
//!
//!     app.get("/hello", |req, res| Box::pin(async move {
//!         let mut name = req.query("name");
//!         if name.is_empty() {
//!             name = "World".to_string();
//!         }
//!         res.html(&format!("<h1>Hello, {name}!</h1>")).await?;
//!         Ok(())
//!     }));
//!
//!     HttpServer::new(ServerConfig::default(), app).start().await
//! }
//! ```
//!
//! ## Parsing a request head
//!
//! ```
//! use bottle_rs::{parse_request, Method};
//!
//! let head = parse_request(b"GET /hello?name=Go HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
//! assert_eq!(head.method, Method::GET);
//! assert_eq!(head.path, "/hello");
//! assert_eq!(head.query_param("name").as_deref(), Some("Go"));
//! ```
//!
//! See `demos/hello.rs` for a runnable server.

pub mod parser;

pub mod server;

// Re-export commonly used items for convenience
pub use parser::{Error as ParserError, HttpRequest, HttpVersion, Method, parse_request};
pub use server::{
    Body, BoxError, Error as ServerError, Handler, HandlerFuture, HttpServer, Request, Response, Router, ServerConfig,
    StatusCode,
};
