//! Wire constants for the multipart/http batch format.

/// Line terminator used by both MIME framing and HTTP/1.1.
pub const CRLF: &str = "\r\n";

/// Separator between a header block and its body.
pub const HEADER_END: &[u8] = b"\r\n\r\n";

/// Protocol version written on every sub-request line.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Header names written or inspected by the encoder and decoder.
pub mod headers {
    /// Media type of the envelope, of each part and of JSON sub-requests
    pub const CONTENT_TYPE: &str = "Content-Type";
    /// Byte length of a sub-request body
    pub const CONTENT_LENGTH: &str = "Content-Length";
    /// Correlation token on response parts
    pub const CONTENT_ID: &str = "Content-ID";
    /// MIME version marker
    pub const MIME_VERSION: &str = "MIME-Version";
}

/// Media types.
pub mod media_types {
    /// Content type of each batch part.
    pub const APPLICATION_HTTP: &str = "application/http";
    /// Content type injected for structured sub-request bodies.
    pub const APPLICATION_JSON: &str = "application/json";
    /// Default multipart subtype of the envelope.
    pub const DEFAULT_MULTIPART_SUBTYPE: &str = "mixed";
}

/// Value of the `MIME-Version` header on the envelope and on each part.
pub const MIME_VERSION_1_0: &str = "1.0";
