//! Request view handed to handlers.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::task::{Context, Poll};

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use url::form_urlencoded;

use crate::parser::{HttpRequest, HttpVersion, Method};

/// Largest urlencoded form body read by [`Request::form_value`].
const MAX_FORM_BODY: u64 = 10 << 20;

/// A request body stream.
///
/// Reads end at the declared `Content-Length`. Dropping the body releases
/// the underlying stream.
#[derive(Default)]
pub struct Body {
    reader: Option<Box<dyn AsyncRead + Send + Unpin>>,
}

impl Body {
    /// A body that reads from `reader`.
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            reader: Some(Box::new(reader)),
        }
    }

    /// A body that yields no bytes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A body backed by an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(Cursor::new(bytes.into()))
    }

    /// Read the rest of the body into memory.
    pub async fn to_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.read_to_end(&mut bytes).await?;
        Ok(bytes)
    }
}

impl AsyncRead for Body {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.get_mut().reader.as_mut() {
            Some(reader) => Pin::new(reader).poll_read(cx, buf),
            None => Poll::Ready(Ok(())),
        }
    }
}

/// Per-request view over the parsed head and the body stream.
pub struct Request {
    head: HttpRequest,
    body: Body,
    form: Option<Vec<(String, String)>>,
}

impl Request {
    /// Wrap a parsed request head and its body.
    pub fn new(head: HttpRequest, body: Body) -> Self {
        Self {
            head,
            body,
            form: None,
        }
    }

    /// The parsed request head.
    pub fn head(&self) -> &HttpRequest {
        &self.head
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    /// The percent-decoded request path without its query string.
    pub fn path(&self) -> &str {
        &self.head.path
    }

    /// The raw query string, without the leading `?`.
    pub fn raw_query(&self) -> &str {
        &self.head.query
    }

    pub fn version(&self) -> HttpVersion {
        self.head.version
    }

    /// Get a header value. Header names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.get_header(name)
    }

    /// The first value of `key` in the query string, or an empty string.
    ///
    /// For `/hello?name=World`, `query("name")` returns `"World"`.
    pub fn query(&self, key: &str) -> String {
        self.head.query_param(key).unwrap_or_default()
    }

    /// The first value of `key` in the submitted form, or an empty string.
    ///
    /// The form is parsed on first use. For `POST`, `PUT` and `PATCH` requests
    /// with an `application/x-www-form-urlencoded` body, the body is consumed
    /// and its values take precedence over the query string.
    pub async fn form_value(&mut self, key: &str) -> String {
        if self.form.is_none() {
            let form = self.parse_form().await;
            self.form = Some(form);
        }

        self.form
            .as_ref()
            .and_then(|pairs| pairs.iter().find(|(k, _)| k == key))
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }

    /// Take the body stream.
    ///
    /// The stream is handed out once; later calls get an empty body.
    pub fn body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }

    async fn parse_form(&mut self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if self.has_form_body() {
            match self.read_form_body().await {
                Ok(bytes) => pairs.extend(form_urlencoded::parse(&bytes).into_owned()),
                Err(e) => debug!("Ignoring form body of {} {}: {e}", self.head.method, self.head.path),
            }
        }

        pairs.extend(self.head.query_pairs().into_owned());
        pairs
    }

    fn has_form_body(&self) -> bool {
        matches!(self.head.method, Method::POST | Method::PUT | Method::PATCH)
            && self
                .head
                .media_type()
                .is_some_and(|media_type| media_type.eq_ignore_ascii_case("application/x-www-form-urlencoded"))
    }

    async fn read_form_body(&mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.body().take(MAX_FORM_BODY + 1).read_to_end(&mut bytes).await?;
        if bytes.len() as u64 > MAX_FORM_BODY {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "form body too large"));
        }
        Ok(bytes)
    }
}
