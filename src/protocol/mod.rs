//! Wire format of multipart/http batches.
//!
//! # Module Organization
//!
//! ```text
//! protocol/
//! ├── constants - Header names, media types, CRLF
//! ├── headers   - HeaderList, boundary and header-line parsing
//! ├── message   - HTTP/1.1 request writer and response reader
//! ├── encoder   - BatchEncoder: requests -> multipart envelope
//! └── decoder   - BatchDecoder: multipart response -> parts
//! ```

pub mod constants;
pub mod headers;
pub mod message;

mod decoder;
mod encoder;

pub use decoder::BatchDecoder;
pub use encoder::BatchEncoder;
pub use headers::{
    format_multipart_content_type, parse_boundary, parse_header_line, unquote, validate_header,
    HeaderList,
};
pub use message::{parse_response, parse_status_line, write_request, ResponseMessage};
