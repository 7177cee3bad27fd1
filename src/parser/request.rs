//! HTTP request head parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use url::{form_urlencoded, Url};

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// The head of an HTTP request: request line and header block.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target exactly as sent, including any query string
    pub target: String,
    /// The percent-decoded path, without the query string
    pub path: String,
    /// The raw query string, without the leading `?`
    pub query: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers
    pub headers: HashMap<String, String>,
}

impl HttpRequest {
    /// Create a request head, splitting `target` into path and query.
    ///
    /// The path is percent-decoded; the query is kept raw. Absolute-form
    /// targets (`http://host/path?query`) contribute only their path and query.
    pub fn new(method: Method, target: impl Into<String>, version: HttpVersion, headers: HashMap<String, String>) -> Self {
        let target = target.into();
        let absolute = is_absolute_form(&target).then(|| Url::parse(&target).ok()).flatten();
        let (path, query) = match absolute {
            Some(url) => (decode_path(url.path()), url.query().unwrap_or_default().to_string()),
            None => match target.split_once('?') {
                Some((path, query)) => (decode_path(path), query.to_string()),
                None => (decode_path(&target), String::new()),
            },
        };

        Self {
            method,
            target,
            path,
            query,
            version,
            headers,
        }
    }

    /// Get a header value.
    ///
    /// Header names are case-insensitive.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find_map(|(k, v)| k.eq_ignore_ascii_case(name).then_some(v.as_str()))
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// The declared body length, if any.
    pub fn content_length(&self) -> Result<Option<u64>, Error> {
        match self.get_header("Content-Length") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| Error::InvalidContentLength(value.to_string())),
            None => Ok(None),
        }
    }

    /// The media type of the Content-Type header, without parameters.
    pub fn media_type(&self) -> Option<&str> {
        self.get_header("Content-Type")
            .map(|value| value.split(';').next().unwrap_or_default().trim())
    }

    /// Decoded query parameters in the order they appear.
    pub fn query_pairs(&self) -> form_urlencoded::Parse<'_> {
        form_urlencoded::parse(self.query.as_bytes())
    }

    /// Whether the client waits for `100 Continue` before sending the body.
    pub fn expects_continue(&self) -> bool {
        self.version == HttpVersion::Http11
            && self
                .get_header("Expect")
                .is_some_and(|value| value.eq_ignore_ascii_case("100-continue"))
    }

    /// The first value of a query parameter, if it exists.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Whether `target` is an `http` or `https` absolute URI.
fn is_absolute_form(target: &str) -> bool {
    target
        .split_once("://")
        .is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
}

fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// Every `%` must start a two-digit hex escape.
fn has_valid_escapes(path: &str) -> bool {
    let bytes = path.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            match bytes.get(i + 1..i + 3) {
                Some(hex) if hex.iter().all(u8::is_ascii_hexdigit) => i += 3,
                _ => return false,
            }
        } else {
            i += 1;
        }
    }
    true
}

/// Length of the request head in `input`, including the blank line that
/// terminates it, or `None` while the head is incomplete.
pub fn head_len(input: &[u8]) -> Option<usize> {
    input
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

/// Parse an HTTP request head from a byte slice.
///
/// Parsing stops at the first empty line; anything after it is body and is
/// left to the caller.
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    let input_str = std::str::from_utf8(input)
        .map_err(|_| Error::MalformedRequestLine("Invalid UTF-8".to_string()))?;

    let mut lines = input_str.lines();

    let request_line = match lines.next() {
        Some(line) if !line.trim().is_empty() => line,
        _ => return Err(Error::EmptyRequest),
    };

    // Split the request line into method, target, and version
    let parts: Vec<&str> = request_line.split(' ').collect();
    if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    let method = Method::from_str(parts[0])?;

    let target = parts[1];
    let origin_form = target.starts_with('/');
    let absolute_form = is_absolute_form(target) && Url::parse(target).is_ok();
    if !(origin_form || absolute_form || (target == "*" && method == Method::OPTIONS)) {
        return Err(Error::InvalidPath(target.to_string()));
    }
    let raw_path = target.split('?').next().unwrap_or_default();
    if !has_valid_escapes(raw_path) {
        return Err(Error::InvalidPath(target.to_string()));
    }

    let version = HttpVersion::from_str(parts[2])?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }

        // Obsolete line folding is rejected along with lines lacking a colon
        let (name, value) = match line.split_once(':') {
            Some((name, value)) if !name.is_empty() && !name.starts_with([' ', '\t']) => (name, value),
            _ => return Err(Error::InvalidHeaderFormat(line.to_string())),
        };

        headers.insert(name.trim().to_string(), value.trim().to_string());
    }

    let request = HttpRequest::new(method, target, version, headers);

    if request.version.requires_host() && !request.has_header("Host") {
        return Err(Error::MissingHeader("Host".to_string()));
    }

    Ok(request)
}
