//! Response sink and status codes.

use std::fmt::{self, Write as _};
use std::io;

use log::warn;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::server::error::Error;

const CONTENT_TYPE: &str = "Content-Type";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// An HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const ACCEPTED: StatusCode = StatusCode(202);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const MOVED_PERMANENTLY: StatusCode = StatusCode(301);
    pub const FOUND: StatusCode = StatusCode(302);
    pub const SEE_OTHER: StatusCode = StatusCode(303);
    pub const NOT_MODIFIED: StatusCode = StatusCode(304);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const PAYLOAD_TOO_LARGE: StatusCode = StatusCode(413);
    pub const REQUEST_HEADER_FIELDS_TOO_LARGE: StatusCode = StatusCode(431);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const NOT_IMPLEMENTED: StatusCode = StatusCode(501);
    pub const BAD_GATEWAY: StatusCode = StatusCode(502);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

    /// A status code from its numeric value, if it has three digits.
    pub fn from_u16(code: u16) -> Option<Self> {
        (100..=999).contains(&code).then_some(StatusCode(code))
    }

    /// The numeric value.
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Get the reason phrase for this status code.
    ///
    /// Codes without a registered phrase get an empty one.
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            413 => "Payload Too Large",
            431 => "Request Header Fields Too Large",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            _ => "",
        }
    }

    /// Whether a response with this status may carry a body.
    pub fn allows_body(&self) -> bool {
        !(self.0 < 200 || self.0 == 204 || self.0 == 304)
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::OK
    }
}

impl From<StatusCode> for u16 {
    fn from(status: StatusCode) -> u16 {
        status.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// Per-request response sink over the connection's write half.
///
/// The status line and headers are written the first time [`set_status`]
/// or a body write happens; after that the head is committed and header
/// changes no longer reach the wire. Bodies are delimited by closing the
/// connection.
///
/// [`set_status`]: Response::set_status
pub struct Response {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    headers: Vec<(String, String)>,
    status: StatusCode,
    committed: Option<StatusCode>,
    head_only: bool,
}

impl Response {
    /// Create a response sink writing to `writer`.
    pub fn new(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        let headers = vec![
            ("Server".to_string(), "bottle-rs".to_string()),
            ("Connection".to_string(), "close".to_string()),
        ];

        Self {
            writer: Box::new(writer),
            headers,
            status: StatusCode::OK,
            committed: None,
            head_only: false,
        }
    }

    /// Discard body bytes, as required when answering a HEAD request.
    pub fn set_head_only(&mut self, head_only: bool) {
        self.head_only = head_only;
    }

    /// The last status recorded, 200 until [`set_status`](Response::set_status) is called.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Whether the status line and headers have been written.
    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    /// Get the first value of a header. Header names are case-insensitive.
    pub fn header<'a>(&'a self, name: &str) -> Option<&'a str> {
        self.header_values(name).next()
    }

    /// Every value of a header, in the order they were added.
    pub fn header_values<'a: 'n, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a str> + 'n {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All headers that will be (or were) sent, in wire order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Add or replace a header, dropping any earlier values.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Add a header value, keeping any existing ones (e.g. `Set-Cookie`).
    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Remove every value of a header, returning the first.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let pos = self.headers.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        let (_, first) = self.headers.remove(pos);
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        Some(first)
    }

    /// Record `status` and write the response head immediately.
    ///
    /// Once the head is committed the status is still recorded, but nothing
    /// more is written.
    pub async fn set_status(&mut self, status: StatusCode) -> io::Result<()> {
        self.status = status;
        if let Some(sent) = self.committed {
            warn!("Superfluous set_status({}) after {} was already sent", status.as_u16(), sent.as_u16());
            return Ok(());
        }
        self.commit().await
    }

    /// Write raw bytes to the body, committing the head first if needed.
    pub async fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.committed.is_none() {
            self.commit().await?;
        }
        if !self.body_allowed() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("response status {} does not allow a body", self.status.as_u16()),
            ));
        }
        if !self.head_only {
            self.writer.write_all(data).await?;
        }
        Ok(data.len())
    }

    /// Write a plain-text body.
    ///
    /// Sets `Content-Type: text/plain; charset=utf-8` unless a content type is
    /// already set.
    pub async fn text(&mut self, body: impl AsRef<str>) -> io::Result<usize> {
        if self.header(CONTENT_TYPE).is_none() {
            self.set_header(CONTENT_TYPE, TEXT_PLAIN);
        }
        self.write(body.as_ref().as_bytes()).await
    }

    /// Write an HTML body with `Content-Type: text/html; charset=utf-8`.
    pub async fn html(&mut self, html: &str) -> io::Result<usize> {
        self.set_header(CONTENT_TYPE, TEXT_HTML);
        self.write(html.as_bytes()).await
    }

    /// Serialize `value` as the body with `Content-Type: application/json`.
    ///
    /// Nothing is written when serialization fails.
    pub async fn json<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.set_header(CONTENT_TYPE, APPLICATION_JSON);
        let mut body = serde_json::to_vec(value)?;
        body.push(b'\n');
        self.write(&body).await?;
        Ok(())
    }

    /// Commit an empty 200 response if nothing was written, then flush and
    /// close the write half.
    pub async fn finish(&mut self) -> io::Result<()> {
        if self.committed.is_none() {
            self.commit().await?;
        }
        self.writer.flush().await?;
        self.writer.shutdown().await
    }

    /// Send the interim `100 Continue` a client asked for with `Expect`.
    pub(crate) async fn send_continue(&mut self) -> io::Result<()> {
        if self.committed.is_some() {
            return Ok(());
        }
        self.writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await?;
        self.writer.flush().await
    }

    /// Write a plain-text failure response.
    pub(crate) async fn fail(&mut self, status: StatusCode, message: &str) -> io::Result<()> {
        if self.header(CONTENT_TYPE).is_none() {
            self.set_header(CONTENT_TYPE, TEXT_PLAIN);
        }
        self.set_status(status).await?;
        if self.body_allowed() {
            self.write(message.as_bytes()).await?;
        }
        Ok(())
    }

    fn body_allowed(&self) -> bool {
        self.committed.map_or(true, |sent| sent.allows_body())
    }

    async fn commit(&mut self) -> io::Result<()> {
        let head = self.head_bytes();
        self.committed = Some(self.status);
        self.writer.write_all(&head).await
    }

    fn head_bytes(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status.as_u16(), self.status.reason_phrase());
        for (name, value) in &self.headers {
            // Writing into a String cannot fail
            let _ = write!(head, "{name}: {value}\r\n");
        }
        head.push_str("\r\n");
        head.into_bytes()
    }
}
