//! Tests for the HTTP parser.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::parser::{head_len, parse_request, Error, HttpRequest, HttpVersion, Method};

    #[test]
    fn test_parse_simple_get_request() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.method, Method::GET);
        assert_eq!(result.path, "/index.html");
        assert_eq!(result.target, "/index.html");
        assert_eq!(result.query, "");
        assert_eq!(result.version, HttpVersion::Http11);
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
    }

    #[test]
    fn test_case_insensitive_headers() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert!(result.has_header("host"));
        assert!(result.has_header("HOST"));
        assert_eq!(result.get_header("hOsT"), Some("example.com"));
        assert!(result.get_header("X-Missing").is_none());
    }

    #[test]
    fn test_missing_host_header() {
        let request = b"GET /index.html HTTP/1.1\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::MissingHeader(ref h)) if h == "Host"));
    }

    #[test]
    fn test_http10_without_host() {
        let request = b"GET /index.html HTTP/1.0\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.version, HttpVersion::Http10);
        assert!(result.headers.is_empty());
    }

    #[test]
    fn test_standard_and_extension_methods() {
        let methods = vec![
            ("GET", Method::GET),
            ("POST", Method::POST),
            ("PUT", Method::PUT),
            ("DELETE", Method::DELETE),
            ("HEAD", Method::HEAD),
            ("OPTIONS", Method::OPTIONS),
            ("PATCH", Method::PATCH),
            ("CONNECT", Method::CONNECT),
            ("TRACE", Method::TRACE),
            ("PURGE", Method::Extension("PURGE".to_string())),
        ];

        for (name, expected) in methods {
            let raw = format!("{name} /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n");
            let result = parse_request(raw.as_bytes()).unwrap();
            assert_eq!(result.method, expected);
            assert_eq!(result.method.to_string(), name);
        }
    }

    #[test]
    fn test_method_matching_is_case_sensitive() {
        let method: Method = "get".parse().unwrap();
        assert_eq!(method, Method::Extension("get".to_string()));
        assert_ne!(method, Method::GET);
    }

    #[test]
    fn test_invalid_method() {
        let request = b"GE(T /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidMethod(ref m)) if m == "GE(T"));
    }

    #[test]
    fn test_invalid_http_version() {
        let request = b"GET /index.html HTTP/9.9\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidVersion(ref v)) if v == "HTTP/9.9"));
    }

    #[test]
    fn test_invalid_header_format() {
        let request = b"GET /index.html HTTP/1.1\r\nInvalidHeader\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidHeaderFormat(ref line)) if line == "InvalidHeader"));
    }

    #[test]
    fn test_folded_header_rejected() {
        let request = b"GET / HTTP/1.1\r\nHost: example.com\r\n X-Folded: yes\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidHeaderFormat(_))));
    }

    #[test]
    fn test_empty_request() {
        assert!(matches!(parse_request(b""), Err(Error::EmptyRequest)));
        assert!(matches!(parse_request(b"\r\n\r\n"), Err(Error::EmptyRequest)));
    }

    #[test]
    fn test_incomplete_request_line() {
        let result = parse_request(b"GET\r\n");
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[test]
    fn test_request_line_with_extra_whitespace() {
        let request = b"GET  /index.html  HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::MalformedRequestLine(_))));
    }

    #[test]
    fn test_target_form_is_checked() {
        let request = b"GET index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidPath(ref p)) if p == "index.html"));

        let request = b"GET ftp://example.com/file HTTP/1.1\r\nHost: example.com\r\n\r\n";
        assert!(matches!(parse_request(request), Err(Error::InvalidPath(_))));

        let asterisk = parse_request(b"OPTIONS * HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
        assert_eq!(asterisk.path, "*");
    }

    #[test]
    fn test_absolute_form_target() {
        let request = b"GET http://example.com/hello?name=Go HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.target, "http://example.com/hello?name=Go");
        assert_eq!(result.path, "/hello");
        assert_eq!(result.query, "name=Go");

        let result = parse_request(b"GET HTTPS://example.com HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
        assert_eq!(result.path, "/");
        assert_eq!(result.query, "");
    }

    #[test]
    fn test_path_is_percent_decoded() {
        let request = b"GET /hello%20world/caf%C3%A9?q=a%20b HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.target, "/hello%20world/caf%C3%A9?q=a%20b");
        assert_eq!(result.path, "/hello world/caf\u{e9}");
        // The query stays raw until it is parsed into pairs
        assert_eq!(result.query, "q=a%20b");
        assert_eq!(result.query_param("q").as_deref(), Some("a b"));
    }

    #[test]
    fn test_broken_path_escape_rejected() {
        for target in ["/bad%zz", "/bad%2", "/trailing%"] {
            let request = format!("GET {target} HTTP/1.1\r\nHost: example.com\r\n\r\n");
            let result = parse_request(request.as_bytes());
            assert!(matches!(result, Err(Error::InvalidPath(ref p)) if p == target), "{target}");
        }

        // Escapes are only checked in the path
        let result = parse_request(b"GET /ok?x=%zz HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap();
        assert_eq!(result.path, "/ok");
    }

    #[test]
    fn test_expects_continue() {
        let request = b"POST /upload HTTP/1.1\r\nHost: example.com\r\nExpect: 100-Continue\r\n\r\n";
        assert!(parse_request(request).unwrap().expects_continue());

        let request = b"POST /upload HTTP/1.0\r\nExpect: 100-continue\r\n\r\n";
        assert!(!parse_request(request).unwrap().expects_continue());

        let request = b"POST /upload HTTP/1.1\r\nHost: example.com\r\n\r\n";
        assert!(!parse_request(request).unwrap().expects_continue());
    }

    #[test]
    fn test_headers_with_multiple_colons() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nX-Test: value:with:colons\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.headers.get("X-Test").unwrap(), "value:with:colons");
    }

    #[test]
    fn test_headers_with_trailing_whitespace() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com  \r\nUser-Agent:  test  \r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.headers.get("Host").unwrap(), "example.com");
        assert_eq!(result.headers.get("User-Agent").unwrap(), "test");
    }

    #[test]
    fn test_mixed_line_endings() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\nUser-Agent: test\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.headers.get("User-Agent").unwrap(), "test");
    }

    #[test]
    fn test_duplicate_headers() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nX-Test: value1\r\nX-Test: value2\r\n\r\n";
        let result = parse_request(request).unwrap();
        // The second value should overwrite the first
        assert_eq!(result.headers.get("X-Test").unwrap(), "value2");
    }

    #[test]
    fn test_malformed_utf8_in_request() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nX-Test: \xFF\xFF\xFF\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::MalformedRequestLine(ref s)) if s == "Invalid UTF-8"));
    }

    #[test]
    fn test_path_and_query_are_split() {
        let request = b"GET /search?q=test&page=1 HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.target, "/search?q=test&page=1");
        assert_eq!(result.path, "/search");
        assert_eq!(result.query, "q=test&page=1");
        assert_eq!(result.query_param("q").as_deref(), Some("test"));
        assert_eq!(result.query_param("page").as_deref(), Some("1"));
        assert_eq!(result.query_param("missing"), None);
    }

    #[test]
    fn test_query_parameters_are_decoded() {
        let request = b"GET /search?q=test%20query&who=a+b&filter=name:john HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.query_param("q").as_deref(), Some("test query"));
        assert_eq!(result.query_param("who").as_deref(), Some("a b"));
        assert_eq!(result.query_param("filter").as_deref(), Some("name:john"));
    }

    #[test]
    fn test_query_parameters_first_value_wins() {
        let request = b"GET /search?tag=a&tag=b&flag&empty= HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.query_param("tag").as_deref(), Some("a"));
        assert_eq!(result.query_param("flag").as_deref(), Some(""));
        assert_eq!(result.query_param("empty").as_deref(), Some(""));
        assert_eq!(result.query_pairs().count(), 4);
    }

    #[test]
    fn test_content_length_and_media_type() {
        let mut headers = HashMap::new();
        headers.insert("Host".to_string(), "example.com".to_string());
        headers.insert("content-length".to_string(), "43".to_string());
        headers.insert("Content-Type".to_string(), "application/x-www-form-urlencoded; charset=utf-8".to_string());

        let request = HttpRequest::new(Method::POST, "/submit", HttpVersion::Http11, headers.clone());
        assert_eq!(request.content_length().unwrap(), Some(43));
        assert_eq!(request.media_type(), Some("application/x-www-form-urlencoded"));

        headers.insert("content-length".to_string(), "forty".to_string());
        let bad = HttpRequest::new(Method::POST, "/submit", HttpVersion::Http11, headers);
        assert!(matches!(bad.content_length(), Err(Error::InvalidContentLength(ref v)) if v == "forty"));

        let none = HttpRequest::new(Method::GET, "/", HttpVersion::Http10, HashMap::new());
        assert_eq!(none.content_length().unwrap(), None);
        assert_eq!(none.media_type(), None);
    }

    #[test]
    fn test_head_len() {
        let raw = b"POST /submit HTTP/1.1\r\nHost: example.com\r\n\r\nname=bottle";
        let len = head_len(raw).unwrap();
        assert_eq!(&raw[len..], b"name=bottle");
        assert_eq!(head_len(b"GET / HTTP/1.1\r\nHost: exa"), None);
    }

    #[test]
    fn test_parse_stops_at_blank_line() {
        let request = b"POST /api/users?role=admin HTTP/1.1\r\n\
            Host: example.com\r\n\
            Content-Type: application/json\r\n\
            Content-Length: 15\r\n\
            \r\n\
            {\"key\":\"value\"}";

        let result = parse_request(request).unwrap();
        assert_eq!(result.method, Method::POST);
        assert_eq!(result.path, "/api/users");
        assert_eq!(result.query_param("role").as_deref(), Some("admin"));
        assert_eq!(result.headers.len(), 3);
    }
}
