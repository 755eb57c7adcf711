//! Asset directive syntax.
//!
//! # Format
//!
//! ```text
//! {#asset <name>}
//! {#asset <name> @encoding=<mode>}
//! ```
//!
//! The part between `{#asset ` and `}` holds at most
//! [`MAX_DIRECTIVE_BODY_LEN`] characters and may not contain braces.
//! Everything after the first ` @` is the parameter, which must be a single
//! `encoding=<mode>` pair.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::encoding::EncodingMode;
use crate::error::{AssetError, Result};

/// Maximum length of the body inside a directive.
pub const MAX_DIRECTIVE_BODY_LEN: usize = 150;

/// Separator between the asset name and its parameter.
const PARAM_SEPARATOR: &str = " @";

/// The only recognized parameter key.
const ENCODING_PARAM: &str = "encoding";

/// Matches one directive; group 1 is the body.
static DIRECTIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{#asset ([^{}]{0,150})\}").expect("directive pattern is a valid regex")
});

/// A parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Asset name or link to resolve.
    pub asset_name: String,
    /// Requested encoding.
    pub encoding: EncodingMode,
}

impl Directive {
    /// Create a directive.
    pub fn new(asset_name: impl Into<String>, encoding: EncodingMode) -> Self {
        Self {
            asset_name: asset_name.into(),
            encoding,
        }
    }

    /// Parse the body of a directive (without the braces and
    /// the `#asset ` prefix).
    pub fn parse(body: &str) -> Result<Self> {
        let Some(idx) = body.find(PARAM_SEPARATOR) else {
            return Ok(Self::new(body, EncodingMode::Utf8));
        };

        let asset_name = &body[..idx];
        let param = &body[idx + PARAM_SEPARATOR.len()..];

        let mut parts = param.split('=');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AssetError::invalid_directive(
                body,
                "wrong asset param format, should be {#asset name @encoding=base64}",
            ));
        };

        if key != ENCODING_PARAM {
            return Err(AssetError::invalid_directive(
                body,
                format!("unsupported param {key}"),
            ));
        }

        let encoding = value
            .parse::<EncodingMode>()
            .map_err(|e| AssetError::invalid_directive(body, e.to_string()))?;

        Ok(Self::new(asset_name, encoding))
    }

    /// Render the directive back to its wire form.
    pub fn to_wire(&self) -> String {
        match self.encoding {
            EncodingMode::Utf8 => format!("{{#asset {}}}", self.asset_name),
            mode => format!(
                "{{#asset {}{PARAM_SEPARATOR}{ENCODING_PARAM}={mode}}}",
                self.asset_name
            ),
        }
    }
}

/// A directive found in a text, with the byte range of the whole
/// `{#asset ...}` span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveMatch {
    /// Byte range of the directive in the scanned text.
    pub range: Range<usize>,
    /// The parsed directive.
    pub directive: Directive,
}

/// Whether the text contains at least one directive.
pub fn contains_directive(text: &str) -> bool {
    DIRECTIVE_PATTERN.is_match(text)
}

/// Find and parse all directives in left-to-right order.
///
/// Fails on the first directive whose parameter cannot be parsed.
pub fn find_directives(text: &str) -> Result<Vec<DirectiveMatch>> {
    DIRECTIVE_PATTERN
        .captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
            let body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            Ok(DirectiveMatch {
                range: whole,
                directive: Directive::parse(body)?,
            })
        })
        .collect()
}

/// Replace the given ranges of `text` with their replacements.
///
/// Ranges must be sorted ascending and must not overlap, which is what
/// [`find_directives`] produces.
pub fn splice<S: AsRef<str>>(text: &str, replacements: &[(Range<usize>, S)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (range, replacement) in replacements {
        out.push_str(&text[cursor..range.start]);
        out.push_str(replacement.as_ref());
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_name() {
        let directive = Directive::parse("foo.html").unwrap();
        assert_eq!(directive, Directive::new("foo.html", EncodingMode::Utf8));
    }

    #[test]
    fn test_parse_with_encoding() {
        let directive = Directive::parse("foo.html @encoding=base64").unwrap();
        assert_eq!(directive, Directive::new("foo.html", EncodingMode::Base64));

        let directive = Directive::parse("images/logo.png @encoding=dataURI").unwrap();
        assert_eq!(
            directive,
            Directive::new("images/logo.png", EncodingMode::DataUri)
        );
    }

    #[test]
    fn test_parse_name_with_spaces() {
        let directive = Directive::parse("my file.html @encoding=string").unwrap();
        assert_eq!(directive.asset_name, "my file.html");
        assert_eq!(directive.encoding, EncodingMode::String);
    }

    #[test]
    fn test_parse_malformed_param() {
        let err = Directive::parse("foo.html @encoding").unwrap_err();
        assert!(matches!(err, AssetError::InvalidDirective { .. }));
        assert!(err.to_string().contains("{#asset name @encoding=base64}"));

        let err = Directive::parse("foo.html @encoding=base64=x").unwrap_err();
        assert!(matches!(err, AssetError::InvalidDirective { .. }));
    }

    #[test]
    fn test_parse_unsupported_param() {
        let err = Directive::parse("foo.html @charset=utf8").unwrap_err();
        assert!(err.to_string().contains("unsupported param charset"));
    }

    #[test]
    fn test_parse_unsupported_encoding_value() {
        let err = Directive::parse("foo.html @encoding=hex").unwrap_err();
        assert!(matches!(err, AssetError::InvalidDirective { .. }));
        assert!(err.to_string().contains("hex"));
    }

    #[test]
    fn test_to_wire() {
        assert_eq!(
            Directive::new("a.html", EncodingMode::Utf8).to_wire(),
            "{#asset a.html}"
        );
        assert_eq!(
            Directive::new("a.png", EncodingMode::DataUri).to_wire(),
            "{#asset a.png @encoding=dataURI}"
        );
    }

    #[test]
    fn test_find_directives_positions() {
        let text = "<style>{#asset a.css}</style><script>{#asset b.js @encoding=string}</script>";
        let matches = find_directives(text).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(&text[matches[0].range.clone()], "{#asset a.css}");
        assert_eq!(matches[0].directive.asset_name, "a.css");
        assert_eq!(
            &text[matches[1].range.clone()],
            "{#asset b.js @encoding=string}"
        );
        assert_eq!(matches[1].directive.encoding, EncodingMode::String);
    }

    #[test]
    fn test_find_directives_none() {
        assert!(find_directives("plain {text} without #asset markers")
            .unwrap()
            .is_empty());
        assert!(!contains_directive("{#assets foo}"));
        assert!(!contains_directive("{#asset {nested}}"));
    }

    #[test]
    fn test_body_length_limit() {
        let ok = format!("{{#asset {}}}", "a".repeat(MAX_DIRECTIVE_BODY_LEN));
        assert!(contains_directive(&ok));

        let too_long = format!("{{#asset {}}}", "a".repeat(MAX_DIRECTIVE_BODY_LEN + 1));
        assert!(!contains_directive(&too_long));
    }

    #[test]
    fn test_find_directives_fails_on_bad_param() {
        let result = find_directives("{#asset ok.html} {#asset bad.html @foo=bar}");
        assert!(matches!(result, Err(AssetError::InvalidDirective { .. })));
    }

    #[test]
    fn test_splice_preserves_order() {
        let text = "x{#asset a}y{#asset b}z";
        let matches = find_directives(text).unwrap();
        let replacements: Vec<_> = matches
            .iter()
            .map(|m| (m.range.clone(), m.directive.asset_name.to_uppercase()))
            .collect();
        assert_eq!(splice(text, &replacements), "xAyBz");
    }

    #[test]
    fn test_splice_no_replacements() {
        let empty: [(Range<usize>, &str); 0] = [];
        assert_eq!(splice("unchanged", &empty), "unchanged");
    }
}
