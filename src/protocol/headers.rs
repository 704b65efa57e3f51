//! Header lists and header-value parsing for the batch wire format.
//!
//! Sub-requests must be written with their headers in the order the caller gave
//! them, so headers are kept in an ordered [`HeaderList`] rather than a map.
//! Lookups are ASCII case-insensitive, as HTTP and MIME header names are.
//!
//! # Header Formats
//!
//! | Header | Format | Example |
//! |--------|--------|---------|
//! | Content-Type (envelope) | `multipart/{subtype}; boundary="{token}"` | `multipart/mixed; boundary="b1"` |
//! | Content-Type (part) | media type | `application/http` |
//! | Content-ID | opaque token | `<response-item1>` |
//!
//! # Examples
//!
//! ```
//! use http_batch::protocol::{parse_boundary, HeaderList};
//!
//! let mut headers = HeaderList::new();
//! headers.insert("Accept", "application/json");
//! assert_eq!(headers.get("accept"), Some("application/json"));
//!
//! let boundary = parse_boundary(r#"multipart/mixed; boundary="abc123""#).unwrap();
//! assert_eq!(boundary, "abc123");
//! ```

use crate::error::{BatchError, Result};
use serde::{Deserialize, Serialize};

/// An ordered list of header name/value pairs.
///
/// Iteration yields headers in insertion order. [`insert`](Self::insert) replaces
/// an existing header of the same name in place, so replacing a header does not
/// move it; [`append`](Self::append) always adds a new entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    /// Create an empty header list.
    pub fn new() -> Self {
        HeaderList {
            entries: Vec::new(),
        }
    }

    /// Number of header entries, counting repeated names separately.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list holds no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the first header named `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether a header named `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set `name` to `value`.
    ///
    /// The first existing entry with that name keeps its position and takes the
    /// new value; any further duplicates are dropped. Unknown names are appended.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(pos) => {
                self.entries[pos] = (name, value);
                self.dedup_after(pos);
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Add an entry without touching existing headers of the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Remove every header named `name`, returning the first removed value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let first = self.get(name).map(str::to_string);
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        first
    }

    /// Iterate over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Reject names or values that would break the line-oriented wire format.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in &self.entries {
            validate_header(name, value)?;
        }
        Ok(())
    }

    fn dedup_after(&mut self, pos: usize) {
        let name = self.entries[pos].0.clone();
        let mut index = 0;
        self.entries.retain(|(k, _)| {
            let keep = index <= pos || !k.eq_ignore_ascii_case(&name);
            index += 1;
            keep
        });
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderList
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        HeaderList {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a HeaderList {
    type Item = &'a (String, String);
    type IntoIter = std::slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Check that a header can be written as a single `Name: value` line.
pub fn validate_header(name: &str, value: &str) -> Result<()> {
    if name.is_empty() || name.contains([':', '\r', '\n', ' ', '\t']) {
        return Err(BatchError::HeaderParse(format!(
            "Invalid header name: {:?}",
            name
        )));
    }
    if value.contains(['\r', '\n']) {
        return Err(BatchError::HeaderParse(format!(
            "Invalid value for header {}: line breaks are not allowed",
            name
        )));
    }
    Ok(())
}

/// Split a `Name: value` line at its first colon, trimming both halves.
///
/// Returns `None` for lines without a colon.
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let colon_pos = line.find(':')?;
    let key = line[..colon_pos].trim().to_string();
    let value = line[colon_pos + 1..].trim().to_string();
    Some((key, value))
}

/// Parse a CRLF (or LF) separated header block, skipping blank and colon-less lines.
pub fn parse_header_block(block: &str) -> HeaderList {
    block.lines().filter_map(parse_header_line).collect()
}

/// Strip one pair of surrounding double quotes, if present.
///
/// Each side is stripped independently, so a value with a single stray quote
/// still loses it.
pub fn unquote(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// Extract the `boundary` parameter from a multipart Content-Type value.
///
/// Parameter names are matched case-insensitively and quoted values are unquoted.
///
/// # Errors
///
/// Returns [`BatchError::MalformedResponse`] if no non-empty boundary is present.
pub fn parse_boundary(content_type: &str) -> Result<String> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| unquote(value.trim()).to_string())
        .filter(|boundary| !boundary.is_empty())
        .ok_or_else(|| {
            BatchError::malformed(format!(
                "Content-Type has no boundary parameter: '{}'",
                content_type
            ))
        })
}

/// Format the envelope Content-Type for a multipart `subtype` and `boundary`.
///
/// ```
/// use http_batch::protocol::format_multipart_content_type;
///
/// assert_eq!(
///     format_multipart_content_type("mixed", "b1"),
///     r#"multipart/mixed; boundary="b1""#
/// );
/// ```
#[inline]
pub fn format_multipart_content_type(subtype: &str, boundary: &str) -> String {
    format!("multipart/{}; boundary=\"{}\"", subtype, boundary)
}
