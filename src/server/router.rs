//! Route table and dispatch.

use std::collections::HashMap;

use log::{debug, warn};

use crate::parser::Method;
use crate::server::error::Error;
use crate::server::handler::{Handler, HandlerFuture};
use crate::server::request::Request;
use crate::server::response::{Response, StatusCode};

/// Maps exact (method, path) pairs to handlers.
///
/// Routes are registered through `&mut Router` before serving starts. The
/// server then owns the router behind an `Arc`, so the table cannot change
/// while requests are being dispatched.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, HashMap<String, Box<dyn Handler>>>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure for `method` and the exact `path`.
    ///
    /// A later registration for the same pair replaces the earlier one.
    pub fn handle<F>(&mut self, method: Method, path: impl Into<String>, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.add_route(method, path, handler)
    }

    /// Register a closure for `GET` requests to `path`.
    pub fn get<F>(&mut self, path: impl Into<String>, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.handle(Method::GET, path, handler)
    }

    /// Register a closure for `POST` requests to `path`.
    pub fn post<F>(&mut self, path: impl Into<String>, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Request, &'a mut Response) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.handle(Method::POST, path, handler)
    }

    /// Register any [`Handler`] implementation for `method` and the exact `path`.
    pub fn add_route(&mut self, method: Method, path: impl Into<String>, handler: impl Handler) -> &mut Self {
        let path = path.into();
        let replaced = self
            .routes
            .entry(method.clone())
            .or_default()
            .insert(path.clone(), Box::new(handler));

        if replaced.is_some() {
            debug!("Replaced handler for {method} {path}");
        }
        self
    }

    /// Registered (method, path) pairs, in no particular order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes
            .iter()
            .flat_map(|(method, paths)| paths.keys().map(move |path| (method, path.as_str())))
    }

    /// Look up the handler for an exact method and path.
    pub fn find_handler(&self, method: &Method, path: &str) -> Result<&dyn Handler, Error> {
        let method_routes = self
            .routes
            .get(method)
            .ok_or_else(|| Error::MethodNotAllowed(method.clone()))?;

        method_routes
            .get(path)
            .map(|handler| &**handler)
            .ok_or_else(|| Error::PathNotFound(path.to_string()))
    }

    /// Route one request and run its handler.
    ///
    /// A missing route produces a 404 and a failing handler a 500, both with
    /// a plain-text body. A successful handler's response is left as written.
    pub async fn dispatch(&self, req: &mut Request, res: &mut Response) -> Result<(), Error> {
        let handler = match self.find_handler(req.method(), req.path()) {
            Ok(handler) => handler,
            Err(e) => {
                debug!("No route for {} {}: {e}", req.method(), req.path());
                let body = format!("404 Not Found: {}\n", req.path());
                res.fail(StatusCode::NOT_FOUND, &body).await?;
                return Ok(());
            }
        };

        if let Err(e) = handler.call(req, res).await {
            let e = Error::Handler(e);
            warn!("Handler for {} {} failed: {e}", req.method(), req.path());
            let body = format!("Internal Server Error: {e}\n");
            res.fail(StatusCode::INTERNAL_SERVER_ERROR, &body).await?;
        }

        Ok(())
    }
}
