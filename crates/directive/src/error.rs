//! Error types for asset directives and asset resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Classification of an [`AssetError`].
///
/// Callers use the kind to decide whether a failure may be shown to the end
/// user verbatim or has to be treated as a fault of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Template authoring mistake: malformed directive, unsupported encoding,
    /// reference to an unknown asset.
    Authoring,
    /// Expected ("weak") failure such as a denied or missing file.
    Expected,
    /// Internal failure of a collaborator (store, link composition).
    Internal,
}

/// Asset error type covering all failure modes of resolution and expansion.
#[derive(Debug, Error)]
pub enum AssetError {
    // Authoring errors
    /// The directive parameter part could not be parsed.
    #[error("invalid asset directive `{directive}`: {reason}")]
    InvalidDirective {
        /// The raw directive body between `{#asset ` and `}`.
        directive: String,
        /// What is wrong with it.
        reason: String,
    },

    /// `dataURI` was requested for an asset that is neither image nor font.
    #[error(
        "asset {name} encoded as dataURI needs to have file extension jpeg|jpg|gif|png|svg|woff|ttf|otf|woff2|eot"
    )]
    UnsupportedEncoding {
        /// The asset name.
        name: String,
    },

    /// No store record matched and disk fallback is disabled.
    #[error("asset {name} not found")]
    AssetNotFound {
        /// The asset name.
        name: String,
    },

    // Expected (weak) errors
    /// The path is not covered by the configured allow-list.
    #[error(
        "request to file {path} denied, allow it by setting `allowed_files = \"**/foo.js\"` in the [assets] config section"
    )]
    AccessDenied {
        /// The resolved absolute path.
        path: PathBuf,
    },

    /// The file could not be read.
    #[error("unable to find file {path}")]
    FileNotFound {
        /// The resolved absolute path.
        path: PathBuf,
    },

    /// The linked file could not be written.
    #[error("unable to access file {path}")]
    FileUnwritable {
        /// The resolved absolute path.
        path: PathBuf,
    },

    // Internal errors
    /// The asset store failed.
    #[error("asset store error: {0}")]
    Store(String),

    /// A link URL could not be composed.
    #[error("invalid link url: {0}")]
    InvalidUrl(String),
}

/// Result type alias for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

impl AssetError {
    /// Create an [`AssetError::InvalidDirective`].
    pub fn invalid_directive(directive: impl Into<String>, reason: impl Into<String>) -> Self {
        AssetError::InvalidDirective {
            directive: directive.into(),
            reason: reason.into(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssetError::InvalidDirective { .. }
            | AssetError::UnsupportedEncoding { .. }
            | AssetError::AssetNotFound { .. } => ErrorKind::Authoring,
            AssetError::AccessDenied { .. }
            | AssetError::FileNotFound { .. }
            | AssetError::FileUnwritable { .. } => ErrorKind::Expected,
            AssetError::Store(_) | AssetError::InvalidUrl(_) => ErrorKind::Internal,
        }
    }

    /// Whether this is an expected failure that is not a system fault.
    pub fn is_weak(&self) -> bool {
        self.kind() == ErrorKind::Expected
    }

    /// Whether the message may be rendered to the end user as is.
    pub fn is_user_facing(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}
