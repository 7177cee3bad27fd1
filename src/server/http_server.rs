//! HTTP server implementation.

use std::future::Future;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::parser::{head_len, parse_request, Method};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::request::{Body, Request};
use crate::server::response::{Response, StatusCode};
use crate::server::router::Router;

/// An HTTP server dispatching every request through a [`Router`].
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    router: Arc<Router>,
}

impl HttpServer {
    /// Create a server; the router is frozen from here on.
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// The route table being served.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Log the registered endpoints.
    fn display_server_info(&self) {
        let mut routes: Vec<String> = self
            .router
            .routes()
            .map(|(method, path)| format!("{method} {path}"))
            .collect();
        routes.sort();

        info!("Registered endpoints:");
        for route in routes {
            info!("  {route}");
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        Ok(listener)
    }

    /// Forward the first completion of `signal` to the accept loop.
    fn setup_shutdown_handler<F>(signal: F, shutdown_tx: mpsc::Sender<()>, tasks: &mut JoinSet<()>) -> tokio::task::AbortHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tasks.spawn(async move {
            signal.await;
            let _ = shutdown_tx.send(()).await;
        })
    }

    /// Handle a new connection.
    async fn handle_new_connection(
        socket: TcpStream,
        addr: SocketAddr,
        semaphore: Arc<Semaphore>,
        router: Arc<Router>,
        read_buffer_size: usize,
        tasks: &mut JoinSet<()>,
    ) {
        // Try to acquire a permit from the semaphore
        let permit = match semaphore.try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                let mut response = Response::new(socket);
                if let Err(e) = Self::reject(
                    &mut response,
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Server is at capacity, please try again later",
                )
                .await
                {
                    debug!("Failed to reject connection from {addr}: {e}");
                }
                return;
            }
        };

        tasks.spawn(async move {
            // The permit is dropped when the task completes, releasing the semaphore slot
            let _permit = permit;

            match Self::handle_connection(socket, &router, read_buffer_size).await {
                Ok(()) => {}
                Err(e @ Error::Io(_)) => error!("Error handling connection from {addr}: {e}"),
                Err(e) => warn!("Rejected request from {addr}: {e}"),
            }
        });
    }

    /// Log a failed accept and back off before retrying.
    async fn handle_connection_error(e: std::io::Error) {
        error!("Error accepting connection: {e}");
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }

    /// Perform graceful shutdown.
    async fn perform_shutdown(tasks: &mut JoinSet<()>, timeout: std::time::Duration) {
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let drained = tokio::time::timeout(timeout, async {
            while let Some(res) = tasks.join_next().await {
                match res {
                    Err(e) if !e.is_cancelled() => error!("Task failed during shutdown: {e}"),
                    _ => {}
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("Shutdown timeout elapsed, aborting {len} connections", len = tasks.len());
            tasks.abort_all();
        }

        info!("Server shutdown complete");
    }

    /// Bind the configured address and serve until Ctrl+C.
    pub async fn start(&self) -> Result<(), Error> {
        let listener = self.setup_listener().await?;

        self.serve_with_shutdown(listener, async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
                Err(e) => {
                    error!("Error setting up Ctrl+C handler: {e}");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
    }

    /// Serve connections from `listener` until `signal` completes.
    pub async fn serve_with_shutdown<F>(&self, listener: TcpListener, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.display_server_info();
        info!("Server listening on http://{addr}", addr = listener.local_addr()?);

        // Create a semaphore to limit concurrent connections
        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        // Use JoinSet to keep track of all spawned tasks
        let mut tasks = JoinSet::new();
        let shutdown_handler = Self::setup_shutdown_handler(signal, shutdown_tx, &mut tasks);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutting down server...");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            Self::handle_new_connection(
                                socket,
                                addr,
                                semaphore.clone(),
                                self.router.clone(),
                                self.config.read_buffer_size,
                                &mut tasks,
                            ).await;
                        }
                        Err(e) => Self::handle_connection_error(e).await,
                    }
                }
            }

            // Reap finished connection tasks
            while let Some(res) = tasks.try_join_next() {
                if let Err(e) = res {
                    error!("Connection task failed: {e}");
                }
            }
        }

        shutdown_handler.abort();
        Self::perform_shutdown(&mut tasks, self.config.shutdown_timeout).await;

        Ok(())
    }

    /// Handle a single connection: read one request, dispatch it, close.
    ///
    /// Failures that happen before dispatch (oversized or malformed heads,
    /// unsupported transfer codings) are answered here and returned as errors.
    /// Routing failures are answered by the router and are not errors.
    pub async fn handle_connection<S>(socket: S, router: &Router, read_buffer_size: usize) -> Result<(), Error>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (mut reader, writer) = tokio::io::split(socket);
        let mut response = Response::new(writer);

        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            if let Some(len) = head_len(&buf) {
                break Some(len);
            }
            if buf.len() >= read_buffer_size {
                break None;
            }

            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                if buf.is_empty() {
                    return Ok(()); // Connection closed
                }
                // Let the parser judge a head cut short by EOF
                break Some(buf.len());
            }
            buf.extend_from_slice(&chunk[..n]);
        };

        let head_end = match head_end {
            Some(len) if len <= read_buffer_size => len,
            _ => {
                Self::reject(&mut response, StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE, "Request header fields too large").await?;
                return Err(Error::HeaderTooLarge(read_buffer_size));
            }
        };

        let head = match parse_request(&buf[..head_end]) {
            Ok(head) => head,
            Err(e) => {
                Self::reject(&mut response, StatusCode::BAD_REQUEST, &format!("Error parsing request: {e}")).await?;
                return Err(Error::Parse(e));
            }
        };

        if let Some(coding) = head.get_header("Transfer-Encoding") {
            let coding = coding.to_string();
            Self::reject(&mut response, StatusCode::NOT_IMPLEMENTED, &format!("Unsupported Transfer-Encoding: {coding}")).await?;
            return Err(Error::UnsupportedTransferEncoding(coding));
        }

        let content_length = match head.content_length() {
            Ok(length) => length.unwrap_or(0),
            Err(e) => {
                Self::reject(&mut response, StatusCode::BAD_REQUEST, &format!("Error parsing request: {e}")).await?;
                return Err(Error::Parse(e));
            }
        };

        // Bytes read past the head belong to the body, up to Content-Length
        let mut buffered = buf.split_off(head_end);
        buffered.truncate(usize::try_from(content_length).unwrap_or(usize::MAX));
        let remaining = content_length - buffered.len() as u64;
        if remaining > 0 && head.expects_continue() {
            response.send_continue().await?;
        }
        let body = Body::new(Cursor::new(buffered).chain(reader.take(remaining)));

        response.set_head_only(head.method == Method::HEAD);
        let mut request = Request::new(head, body);

        router.dispatch(&mut request, &mut response).await?;
        debug!(
            "{method} {path} -> {status}",
            method = request.method(),
            path = request.path(),
            status = response.status().as_u16()
        );

        response.finish().await?;
        Ok(())
    }

    /// Answer with a plain-text error and close.
    async fn reject(response: &mut Response, status: StatusCode, message: &str) -> Result<(), Error> {
        response.fail(status, message).await?;
        response.finish().await?;
        Ok(())
    }
}
