//! Data URI helpers
//!
//! Source images travel as `data:<mime>;base64,<payload>` strings. Parsing is
//! lenient: anything starting with `data:` is accepted, and callers check the MIME prefix.

use std::fmt;

use base64::Engine;
use serde::{Serialize, Serializer};

/// A parsed `data:` URI that keeps the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    raw: String,
    mime_end: usize,
    payload_start: Option<usize>,
    base64: bool,
}

impl DataUri {
    /// Parse `input`, returning `None` unless it starts with `data:`.
    pub fn parse(input: impl Into<String>) -> Option<Self> {
        let raw = input.into();
        let rest = raw.strip_prefix("data:")?;
        let header_len = rest.find(',').unwrap_or(rest.len());
        let header = &rest[..header_len];
        let mime_len = header.find(';').unwrap_or(header.len());
        let base64 = header
            .split(';')
            .skip(1)
            .any(|param| param.eq_ignore_ascii_case("base64"));
        let payload_start = (header_len < rest.len()).then_some("data:".len() + header_len + 1);
        Some(Self {
            mime_end: "data:".len() + mime_len,
            payload_start,
            base64,
            raw,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Declared MIME type (may be empty).
    pub fn mime_type(&self) -> &str {
        &self.raw["data:".len()..self.mime_end]
    }

    pub fn is_image(&self) -> bool {
        self.mime_type().starts_with("image/")
    }

    pub const fn is_base64(&self) -> bool {
        self.base64
    }

    /// Encoded payload after the comma.
    pub fn payload(&self) -> &str {
        self.payload_start.map_or("", |start| &self.raw[start..])
    }

    /// File extension derived from the MIME subtype, falling back to `png`.
    pub fn extension(&self) -> &str {
        self.mime_type()
            .split_once('/')
            .map(|(_, subtype)| subtype.split('+').next().unwrap_or(subtype))
            .filter(|subtype| !subtype.is_empty())
            .unwrap_or("png")
    }

    /// Decode a base64 payload.
    pub fn decode(&self) -> Option<Vec<u8>> {
        if !self.base64 {
            return None;
        }
        base64::engine::general_purpose::STANDARD
            .decode(self.payload())
            .ok()
    }

    pub fn into_string(self) -> String {
        self.raw
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for DataUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
