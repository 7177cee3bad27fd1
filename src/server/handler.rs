//! Request handlers.

use std::future::Future;
use std::pin::Pin;

use crate::server::error::BoxError;
use crate::server::request::Request;
use crate::server::response::Response;

/// Type alias for the boxed future a handler returns.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>;

/// Produces a response for a matched request.
///
/// Closures of the form `|req, res| Box::pin(async move { ... })` implement
/// this trait.
pub trait Handler: Send + Sync + 'static {
    /// Handle one request, writing through `res`.
    fn call<'a>(&'a self, req: &'a mut Request, res: &'a mut Response) -> HandlerFuture<'a>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response) -> HandlerFuture<'a> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, req: &'a mut Request, res: &'a mut Response) -> HandlerFuture<'a> {
        (self)(req, res)
    }
}
