//! # Asset Directive Library
//!
//! This crate provides the I/O-free building blocks of asset expansion:
//! the `{#asset ...}` directive syntax, the encoding modes a directive can
//! request, and the error taxonomy shared by everything that resolves assets.
//!
//! ## Overview
//!
//! - **Directive Syntax**: Regex-based discovery of `{#asset name @encoding=mode}`
//!   markers with byte positions, and position-preserving splicing
//! - **Encoding Modes**: `utf8`, `base64`, `string`, `link` and `dataURI`
//!   as a closed enum with their byte encodings and escapes
//! - **MIME Lookup**: Extension based type lookup for data URIs and served content
//! - **Errors**: [`AssetError`] with an [`ErrorKind`] separating authoring
//!   mistakes, expected ("weak") failures and internal faults
//!
//! ## Example Usage
//!
//! ```rust
//! use directive::{find_directives, splice, EncodingMode};
//!
//! let text = "<img src=\"{#asset logo.png @encoding=dataURI}\">";
//! let matches = find_directives(text).unwrap();
//! assert_eq!(matches[0].directive.asset_name, "logo.png");
//! assert_eq!(matches[0].directive.encoding, EncodingMode::DataUri);
//!
//! let encoder = EncodingMode::DataUri.payload_encoder().unwrap();
//! let payload = encoder.encode(b"\x89PNG", "logo.png");
//! let replaced = splice(text, &[(matches[0].range.clone(), payload)]);
//! assert_eq!(replaced, "<img src=\"data:image/png;base64,iVBORw==\">");
//! ```
//!
//! ## Modules
//!
//! - [`directive`]: Directive parsing, discovery and splicing
//! - [`encoding`]: Encoding modes, byte encodings and escapes
//! - [`mime`]: MIME type lookup
//! - [`error`]: Error types

pub mod directive;
pub mod encoding;
pub mod error;
pub mod mime;

pub use directive::{
    contains_directive, find_directives, splice, Directive, DirectiveMatch,
    MAX_DIRECTIVE_BODY_LEN,
};
pub use encoding::{
    data_uri, escape_js_string, ByteEncoding, EncodingMode, Escape, ParseEncodingError,
    PayloadEncoder,
};
pub use error::{AssetError, ErrorKind, Result};
