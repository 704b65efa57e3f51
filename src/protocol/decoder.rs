//! Batch response decoder.
//!
//! Unpacks a multipart MIME batch response into an ordered list of
//! [`DecodedPart`]s, one per part, in the order they appear in the body.
//!
//! # Decoding Flow
//!
//! 1. Extract `boundary` from the outer `Content-Type`
//! 2. Split the body on `--{boundary}`, dropping the preamble and everything
//!    after the close delimiter `--{boundary}--`
//! 3. Split each part into MIME headers and payload at the first blank line
//! 4. Read `Content-ID` from the MIME headers
//! 5. Parse the payload as an HTTP/1.1 response
//!
//! The decoder does not check the order of parts against anything. Pairing parts
//! with requests is left to the caller.

use crate::error::{BatchError, Result};
use crate::protocol::constants::headers;
use crate::protocol::headers::{parse_boundary, parse_header_block};
use crate::protocol::message::{parse_response, split_head};
use crate::protocol::HeaderList;
use crate::types::DecodedPart;

/// Decoder for multipart batch responses.
///
/// # Examples
///
/// ```
/// use http_batch::protocol::{BatchDecoder, HeaderList};
///
/// let mut headers = HeaderList::new();
/// headers.insert("Content-Type", r#"multipart/mixed; boundary="abc123""#);
/// let body = b"--abc123\r\n\
/// Content-Type: application/http\r\n\
/// Content-ID: <response-1>\r\n\
/// \r\n\
/// HTTP/1.1 200 OK\r\n\
/// Content-Type: text/plain\r\n\
/// \r\n\
/// hi\r\n\
/// --abc123--\r\n";
///
/// let parts = BatchDecoder::new().decode(&headers, body).unwrap();
/// assert_eq!(parts.len(), 1);
/// assert_eq!(parts[0].status, 200);
/// assert_eq!(parts[0].content_id.as_deref(), Some("<response-1>"));
/// assert_eq!(&parts[0].body[..], b"hi");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchDecoder;

impl BatchDecoder {
    /// Create a decoder.
    pub fn new() -> Self {
        BatchDecoder
    }

    /// Decode a batch response given its headers and raw body.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::MalformedResponse`] if the Content-Type is missing or
    /// has no boundary, if the boundary never occurs in the body, if a part or its
    /// payload has no header/body separator, or if a status line is unparsable.
    pub fn decode(&self, response_headers: &HeaderList, body: &[u8]) -> Result<Vec<DecodedPart>> {
        let content_type = response_headers
            .get(headers::CONTENT_TYPE)
            .ok_or_else(|| BatchError::malformed("Batch response has no Content-Type"))?;
        self.decode_with_content_type(content_type, body)
    }

    /// Decode a batch response given only its Content-Type value.
    pub fn decode_with_content_type(
        &self,
        content_type: &str,
        body: &[u8],
    ) -> Result<Vec<DecodedPart>> {
        let boundary = parse_boundary(content_type)?;
        let delimiter = format!("--{}", boundary);

        let segments = split_on(body, delimiter.as_bytes());
        if segments.len() < 2 {
            return Err(BatchError::malformed(format!(
                "Boundary '{}' does not occur in the response body",
                boundary
            )));
        }

        // Parts run up to the close delimiter (`--boundary--`). Anything after it
        // is epilogue, even if it repeats the delimiter. Without a close
        // delimiter the trailing segment is treated as epilogue.
        let after_first = &segments[1..];
        let end = after_first
            .iter()
            .position(|segment| segment.starts_with(b"--"))
            .unwrap_or(after_first.len() - 1);

        let parts = after_first[..end]
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                decode_part(segment).map_err(|e| match e {
                    BatchError::MalformedResponse(msg) => {
                        BatchError::malformed(format!("part {}: {}", index, msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "decoded {} parts from {} byte batch response",
            parts.len(),
            body.len()
        );

        Ok(parts)
    }
}

/// Split `data` on every occurrence of `delimiter`.
///
/// Always yields at least one segment; `n` occurrences give `n + 1` segments.
fn split_on<'a>(data: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while pos + delimiter.len() <= data.len() {
        if &data[pos..pos + delimiter.len()] == delimiter {
            segments.push(&data[start..pos]);
            pos += delimiter.len();
            start = pos;
        } else {
            pos += 1;
        }
    }
    segments.push(&data[start..]);
    segments
}

/// Decode one boundary-delimited segment.
fn decode_part(segment: &[u8]) -> Result<DecodedPart> {
    let (mime_head, payload) = split_head(segment)
        .ok_or_else(|| BatchError::malformed("MIME part has no header/body separator"))?;

    let mime_headers = parse_header_block(&String::from_utf8_lossy(mime_head));
    let content_id = mime_headers
        .get(headers::CONTENT_ID)
        .map(str::trim)
        .map(str::to_string);

    let response = parse_response(payload)?;

    Ok(DecodedPart {
        status: response.status,
        reason: response.reason,
        headers: response.headers,
        body: response.body,
        content_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multipart_headers(content_type: &str) -> HeaderList {
        let mut headers = HeaderList::new();
        headers.insert("Content-Type", content_type);
        headers
    }

    fn response_body(boundary: &str, parts: &[(&str, &str)]) -> Vec<u8> {
        let mut out = String::from("preamble text\r\n");
        for (content_id, payload) in parts {
            out.push_str(&format!("--{}\r\nContent-Type: application/http\r\n", boundary));
            if !content_id.is_empty() {
                out.push_str(&format!("Content-ID: {}\r\n", content_id));
            }
            out.push_str("\r\n");
            out.push_str(payload);
            out.push_str("\r\n");
        }
        out.push_str(&format!("--{}--\r\nepilogue", boundary));
        out.into_bytes()
    }

    #[test]
    fn test_split_on() {
        assert_eq!(split_on(b"a--xb--xc", b"--x"), vec![&b"a"[..], &b"b"[..], &b"c"[..]]);
        assert_eq!(split_on(b"abc", b"--x"), vec![&b"abc"[..]]);
        assert_eq!(split_on(b"--x", b"--x"), vec![&b""[..], &b""[..]]);
    }

    #[test]
    fn test_decode_two_parts_in_order() {
        let body = response_body(
            "abc123",
            &[
                ("<response-2>", "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"name\":\"alice\"}"),
                ("<response-1>", "HTTP/1.1 404 Not Found\r\n\r\nmissing"),
            ],
        );
        let headers = multipart_headers(r#"multipart/mixed; boundary="abc123""#);
        let parts = BatchDecoder::new().decode(&headers, &body).unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].status, 200);
        assert_eq!(parts[0].reason, "OK");
        assert_eq!(parts[0].headers.get("content-type"), Some("application/json"));
        assert_eq!(&parts[0].body[..], br#"{"name":"alice"}"#);
        assert_eq!(parts[0].content_id.as_deref(), Some("<response-2>"));

        assert_eq!(parts[1].status, 404);
        assert_eq!(parts[1].reason, "Not Found");
        assert_eq!(&parts[1].body[..], b"missing");
        assert!(!parts[1].is_success());
    }

    #[test]
    fn test_content_id_is_optional_and_case_insensitive() {
        let body = b"--b\r\ncontent-id:   77  \r\n\r\nHTTP/1.1 200 OK\r\n\r\n\r\n--b\r\n\r\nHTTP/1.1 204 No Content\r\n\r\n\r\n--b--";
        let parts = BatchDecoder::new()
            .decode_with_content_type("multipart/mixed; boundary=b", body)
            .unwrap();
        assert_eq!(parts[0].content_id.as_deref(), Some("77"));
        assert_eq!(parts[1].content_id, None);
        assert!(parts[1].body.is_empty());
    }

    #[test]
    fn test_missing_boundary_is_malformed() {
        let body = response_body("abc", &[("", "HTTP/1.1 200 OK\r\n\r\n")]);
        let err = BatchDecoder::new()
            .decode(&multipart_headers("multipart/mixed"), &body)
            .unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn test_missing_content_type_is_malformed() {
        let err = BatchDecoder::new()
            .decode(&HeaderList::new(), b"--b\r\n\r\n--b--")
            .unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn test_boundary_absent_from_body() {
        let err = BatchDecoder::new()
            .decode_with_content_type("multipart/mixed; boundary=zzz", b"plain body")
            .unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn test_part_without_separator() {
        let body = b"--b\r\nContent-Type: application/http\r\nHTTP/1.1 200 OK\r\n--b--";
        let err = BatchDecoder::new()
            .decode_with_content_type("multipart/mixed; boundary=b", body)
            .unwrap_err();
        assert!(err.to_string().contains("part 0"));
    }

    #[test]
    fn test_unparsable_status_line() {
        let body = response_body("b", &[("", "HTTP/1.1 OK\r\n\r\n")]);
        let err = BatchDecoder::new()
            .decode_with_content_type("multipart/mixed; boundary=b", &body)
            .unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn test_epilogue_repeating_delimiter_is_ignored() {
        let mut body = response_body("b", &[("", "HTTP/1.1 200 OK\r\n\r\nfine")]);
        body.extend_from_slice(b" that mentions --b and --b-- again");
        let parts = BatchDecoder::new()
            .decode_with_content_type("multipart/mixed; boundary=b", &body)
            .unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(&parts[0].body[..], b"fine");
    }
}
