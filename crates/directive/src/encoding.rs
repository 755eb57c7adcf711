//! Encoding modes applied to asset bytes before substitution.
//!
//! # Modes
//!
//! | mode      | byte encoding | escape                                  |
//! |-----------|---------------|-----------------------------------------|
//! | `utf8`    | utf8          | none                                    |
//! | `base64`  | base64        | none                                    |
//! | `string`  | utf8          | JavaScript string literal escaping      |
//! | `dataURI` | base64        | `data:<mime>[; charset=UTF-8];base64,`  |
//! | `link`    | -             | resolver returns a URL, bytes unread    |

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::mime;

/// MIME type used in data URIs when the file name has no known type.
const FALLBACK_MIME: &str = "application/octet-stream";

/// Requested encoding of a substituted asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncodingMode {
    /// Bytes decoded as UTF-8 text.
    #[default]
    Utf8,
    /// Standard base64 with padding.
    Base64,
    /// UTF-8 text escaped for embedding in a JavaScript string literal.
    String,
    /// A URL under which the asset content is served.
    Link,
    /// A base64 `data:` URI. Only valid for image and font assets.
    DataUri,
}

/// Error returned when parsing an unknown encoding mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unsupported asset encoding param value {0}, supported values are base64, utf8, link, dataURI and string"
)]
pub struct ParseEncodingError(pub String);

impl EncodingMode {
    /// All modes in their wire spelling order.
    pub const ALL: [EncodingMode; 5] = [
        EncodingMode::Utf8,
        EncodingMode::Base64,
        EncodingMode::String,
        EncodingMode::Link,
        EncodingMode::DataUri,
    ];

    /// The wire spelling used in directives.
    pub fn as_str(self) -> &'static str {
        match self {
            EncodingMode::Utf8 => "utf8",
            EncodingMode::Base64 => "base64",
            EncodingMode::String => "string",
            EncodingMode::Link => "link",
            EncodingMode::DataUri => "dataURI",
        }
    }

    /// Split the mode into its byte encoding and escape step.
    ///
    /// Returns `None` for [`EncodingMode::Link`], which never reads content.
    pub fn payload_encoder(self) -> Option<PayloadEncoder> {
        let (bytes, escape) = match self {
            EncodingMode::Utf8 => (ByteEncoding::Utf8, Escape::Identity),
            EncodingMode::Base64 => (ByteEncoding::Base64, Escape::Identity),
            EncodingMode::String => (ByteEncoding::Utf8, Escape::JsString),
            EncodingMode::DataUri => (ByteEncoding::Base64, Escape::DataUri),
            EncodingMode::Link => return None,
        };
        Some(PayloadEncoder { bytes, escape })
    }

    /// Whether the mode is allowed for an asset with the given name.
    pub fn supports(self, name: &str) -> bool {
        match self {
            EncodingMode::DataUri => mime::is_image(name) || mime::is_font(name),
            _ => true,
        }
    }
}

impl fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncodingMode {
    type Err = ParseEncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EncodingMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ParseEncodingError(s.to_string()))
    }
}

/// Byte-to-text transform underlying an encoding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteEncoding {
    /// Lossy UTF-8 decoding; invalid sequences become U+FFFD.
    Utf8,
    /// Standard base64 with padding.
    Base64,
}

impl ByteEncoding {
    /// Convert bytes to text.
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            ByteEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            ByteEncoding::Base64 => STANDARD.encode(bytes),
        }
    }

    /// Convert text produced by [`ByteEncoding::encode`] back to bytes.
    pub fn decode(self, text: &str) -> Result<Vec<u8>, base64::DecodeError> {
        match self {
            ByteEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            ByteEncoding::Base64 => STANDARD.decode(text),
        }
    }
}

/// Escape step applied after byte encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// Leave the text unchanged.
    Identity,
    /// Escape for a JavaScript string literal.
    JsString,
    /// Wrap base64 text in a `data:` URI typed by the file name.
    DataUri,
}

impl Escape {
    /// Apply the escape to encoded text.
    pub fn apply(self, text: String, filename: &str) -> String {
        match self {
            Escape::Identity => text,
            Escape::JsString => escape_js_string(&text),
            Escape::DataUri => data_uri(filename, &text),
        }
    }
}

/// Byte encoding plus escape, the full transform of a non-link mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadEncoder {
    /// Byte-to-text transform.
    pub bytes: ByteEncoding,
    /// Escape applied to the text.
    pub escape: Escape,
}

impl PayloadEncoder {
    /// Encode asset bytes. `filename` types the payload for data URIs.
    pub fn encode(&self, bytes: &[u8], filename: &str) -> String {
        self.escape.apply(self.bytes.encode(bytes), filename)
    }
}

/// Escape text so it can be placed between single or double quotes in a
/// JavaScript string literal.
pub fn escape_js_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '"' | '\'' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a base64 payload as `data:<mime>[; charset=UTF-8];base64,<payload>`.
pub fn data_uri(filename: &str, base64_payload: &str) -> String {
    let mime = mime::mime_type(filename).unwrap_or(FALLBACK_MIME);
    let charset = if mime::is_text(mime) {
        "; charset=UTF-8"
    } else {
        ""
    };
    format!("data:{mime}{charset};base64,{base64_payload}")
}
