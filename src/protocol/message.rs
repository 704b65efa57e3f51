//! HTTP/1.1 message text carried inside batch parts.
//!
//! Each request part embeds a complete HTTP/1.1 request and each response part a
//! complete HTTP/1.1 response. This module writes the former and reads the latter.
//!
//! # Request Layout
//!
//! ```text
//! PATCH http://host/person/alice HTTP/1.1\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 30\r\n
//! \r\n
//! {"favorite_food":"panang curry"}
//! ```

use crate::error::{BatchError, Result};
use crate::protocol::constants::{headers, media_types, CRLF, HEADER_END, HTTP_VERSION};
use crate::protocol::headers::parse_header_block;
use crate::protocol::HeaderList;
use crate::types::{PendingRequest, RequestBody, RequestTarget};
use bytes::{BufMut, Bytes, BytesMut};

/// Position of the first `\r\n\r\n` in `data`, pointing at its first byte.
pub fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(HEADER_END.len())
        .position(|w| w == HEADER_END)
}

/// Split `data` at its first blank line into `(head, body)`.
///
/// The separator belongs to neither half.
pub fn split_head(data: &[u8]) -> Option<(&[u8], &[u8])> {
    find_header_end(data).map(|pos| (&data[..pos], &data[pos + HEADER_END.len()..]))
}

/// Resolve the bytes and final header list of a sub-request.
///
/// JSON bodies are serialized and get `Content-Type` and `Content-Length` set
/// (replacing caller values). Non-empty raw bodies get a `Content-Length` only when
/// the caller did not provide one.
pub fn normalize_body(request: &PendingRequest) -> Result<(HeaderList, Bytes)> {
    let mut header_list = request.headers.clone();
    let body = match &request.body {
        RequestBody::Empty => Bytes::new(),
        RequestBody::Raw(bytes) => {
            if !bytes.is_empty() && !header_list.contains(headers::CONTENT_LENGTH) {
                header_list.insert(headers::CONTENT_LENGTH, bytes.len().to_string());
            }
            bytes.clone()
        }
        RequestBody::Json(value) => {
            let json = Bytes::from(serde_json::to_vec(value)?);
            header_list.insert(headers::CONTENT_TYPE, media_types::APPLICATION_JSON);
            header_list.insert(headers::CONTENT_LENGTH, json.len().to_string());
            json
        }
    };
    Ok((header_list, body))
}

/// Write `request` as raw HTTP/1.1 request text.
pub fn write_request(request: &PendingRequest, target: RequestTarget) -> Result<Bytes> {
    let (header_list, body) = normalize_body(request)?;
    header_list.validate()?;

    let target = match target {
        RequestTarget::Absolute => request.url.as_str().to_string(),
        RequestTarget::Origin => request.path_and_query(),
    };

    let mut out = BytesMut::with_capacity(256 + body.len());
    out.put_slice(format!("{} {} {}", request.method, target, HTTP_VERSION).as_bytes());
    out.put_slice(CRLF.as_bytes());
    for (name, value) in header_list.iter() {
        out.put_slice(format!("{}: {}", name, value).as_bytes());
        out.put_slice(CRLF.as_bytes());
    }
    out.put_slice(CRLF.as_bytes());
    out.put_slice(&body);
    Ok(out.freeze())
}

/// Parse an `HTTP-version CODE REASON` status line into `(code, reason)`.
///
/// # Errors
///
/// Returns [`BatchError::MalformedResponse`] unless the line has three
/// space-separated tokens with a numeric code.
pub fn parse_status_line(line: &str) -> Result<(u16, String)> {
    let mut tokens = line.trim().splitn(3, ' ');
    let (version, code, reason) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(version), Some(code), Some(reason)) => (version, code, reason.trim()),
        _ => {
            return Err(BatchError::malformed(format!(
                "Invalid status line: '{}'",
                line
            )))
        }
    };
    if !version.starts_with("HTTP/") {
        return Err(BatchError::malformed(format!(
            "Invalid HTTP version in status line: '{}'",
            line
        )));
    }
    let code = code
        .parse::<u16>()
        .map_err(|_| BatchError::malformed(format!("Invalid status code: '{}'", code)))?;
    Ok((code, reason.to_string()))
}

/// A raw HTTP/1.1 response split into its components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMessage {
    /// Status code
    pub status: u16,
    /// Reason phrase
    pub reason: String,
    /// Response headers
    pub headers: HeaderList,
    /// Response body, without the framing CRLF
    pub body: Bytes,
}

/// Parse the HTTP/1.1 response embedded in a batch part.
///
/// Multipart framing puts a CRLF before each delimiter, so one trailing CRLF is
/// removed from the body.
pub fn parse_response(payload: &[u8]) -> Result<ResponseMessage> {
    let (head, content) = split_head(payload).ok_or_else(|| {
        BatchError::malformed("Embedded response has no header/body separator")
    })?;
    let head = std::str::from_utf8(head)
        .map_err(|_| BatchError::malformed("Embedded response head is not valid UTF-8"))?;

    let (status_line, header_block) = head.split_once(CRLF).unwrap_or((head, ""));
    let (status, reason) = parse_status_line(status_line)?;

    let body = content.strip_suffix(CRLF.as_bytes()).unwrap_or(content);

    Ok(ResponseMessage {
        status,
        reason,
        headers: parse_header_block(header_block),
        body: Bytes::copy_from_slice(body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;
    use url::Url;

    fn request(method: Method, url: &str) -> PendingRequest {
        PendingRequest::new(method, Url::parse(url).unwrap())
    }

    #[test]
    fn test_find_header_end_first_occurrence() {
        let data = b"A: 1\r\n\r\nbody\r\n\r\nmore";
        assert_eq!(find_header_end(data), Some(4));
        assert_eq!(find_header_end(b"no separator"), None);
    }

    #[test]
    fn test_write_request_without_body() {
        let mut req = request(Method::GET, "http://host/people?limit=2");
        req.headers.insert("Accept", "application/json");
        let text = write_request(&req, RequestTarget::Absolute).unwrap();
        assert_eq!(
            &text[..],
            b"GET http://host/people?limit=2 HTTP/1.1\r\nAccept: application/json\r\n\r\n"
        );
    }

    #[test]
    fn test_write_request_origin_form() {
        let req = request(Method::DELETE, "http://host/people/bob?hard=true");
        let text = write_request(&req, RequestTarget::Origin).unwrap();
        assert!(text.starts_with(b"DELETE /people/bob?hard=true HTTP/1.1\r\n"));
    }

    #[test]
    fn test_json_body_sets_type_and_length() {
        let mut req = request(Method::PATCH, "http://host/r/alice")
            .with_body(json!({"favorite_food": "x"}));
        req.headers.insert("content-type", "text/plain");
        req.headers.insert("X-Trace", "1");

        let (header_list, body) = normalize_body(&req).unwrap();
        assert_eq!(&body[..], br#"{"favorite_food":"x"}"#);
        assert_eq!(header_list.get("Content-Type"), Some("application/json"));
        assert_eq!(
            header_list.get("Content-Length"),
            Some(body.len().to_string().as_str())
        );
        // the replaced header keeps its slot
        assert_eq!(header_list.iter().next().unwrap().1, "application/json");
    }

    #[test]
    fn test_raw_body_keeps_caller_length() {
        let mut req = request(Method::POST, "http://host/upload").with_body("hello");
        let (header_list, _) = normalize_body(&req).unwrap();
        assert_eq!(header_list.get("Content-Length"), Some("5"));

        req.headers.insert("Content-Length", "5");
        req.headers.insert("Content-Type", "text/plain");
        let (header_list, body) = normalize_body(&req).unwrap();
        assert_eq!(header_list.len(), 2);
        assert_eq!(header_list.get("Content-Type"), Some("text/plain"));
        assert_eq!(&body[..], b"hello");
    }

    #[test]
    fn test_write_request_rejects_header_injection() {
        let mut req = request(Method::GET, "http://host/");
        req.headers.insert("X-Evil", "a\r\nHost: elsewhere");
        assert!(matches!(
            write_request(&req, RequestTarget::Absolute),
            Err(BatchError::HeaderParse(_))
        ));
    }

    #[test]
    fn test_parse_status_line() {
        assert_eq!(parse_status_line("HTTP/1.1 200 OK").unwrap(), (200, "OK".into()));
        assert_eq!(
            parse_status_line("HTTP/1.1 404 Not Found").unwrap(),
            (404, "Not Found".into())
        );
        assert!(parse_status_line("HTTP/1.1 200").is_err());
        assert!(parse_status_line("HTTP/1.1 abc OK").is_err());
        assert!(parse_status_line("garbage").is_err());
    }

    #[test]
    fn test_parse_response() {
        let payload =
            b"HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nLocation: /r/1\r\n\r\n{\"id\":1}\r\n";
        let msg = parse_response(payload).unwrap();
        assert_eq!(msg.status, 201);
        assert_eq!(msg.reason, "Created");
        assert_eq!(msg.headers.get("location"), Some("/r/1"));
        assert_eq!(&msg.body[..], b"{\"id\":1}");
    }

    #[test]
    fn test_parse_response_status_line_only() {
        let msg = parse_response(b"HTTP/1.1 204 No Content\r\n\r\n").unwrap();
        assert_eq!(msg.status, 204);
        assert!(msg.headers.is_empty());
        assert!(msg.body.is_empty());
    }

    #[test]
    fn test_parse_response_strips_single_crlf() {
        let msg = parse_response(b"HTTP/1.1 200 OK\r\n\r\nline\r\n\r\n").unwrap();
        assert_eq!(&msg.body[..], b"line\r\n");
    }

    #[test]
    fn test_parse_response_without_separator() {
        let err = parse_response(b"HTTP/1.1 200 OK\r\nContent-Length: 0").unwrap_err();
        assert!(err.is_protocol_violation());
    }
}
