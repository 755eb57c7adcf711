//! Metadata for serving raw asset bytes over HTTP.
//!
//! The HTTP route itself lives outside the engine; this module computes the
//! body and the response headers it needs.

use std::time::SystemTime;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use directive::mime;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::resolver::LoadedAsset;

/// `Cache-Control` value for served assets.
pub const CACHE_CONTROL: &str = "public, max-age=0";

/// Raw asset content with its response metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetContent {
    /// Response body.
    #[serde(skip)]
    pub body: Vec<u8>,
    /// File name the content was read as.
    pub filename: String,
    /// `Content-Type`, when the file extension has a known type.
    pub content_type: Option<String>,
    /// Strong `ETag`.
    pub etag: String,
    /// `Cache-Control`.
    pub cache_control: &'static str,
    /// `Last-Modified` as an HTTP date.
    pub last_modified: String,
    /// `Content-Disposition`, set only for downloads.
    pub content_disposition: Option<String>,
}

impl AssetContent {
    /// Build the response for a loaded asset.
    pub fn new(asset: LoadedAsset, download: bool) -> Self {
        let content_disposition =
            download.then(|| format!("attachment;filename={}", asset.filename));

        Self {
            content_type: mime::mime_type(&asset.filename).map(mime::content_type),
            etag: etag(&asset.content),
            cache_control: CACHE_CONTROL,
            last_modified: http_date(asset.modified),
            content_disposition,
            filename: asset.filename,
            body: asset.content,
        }
    }

    /// Response headers in the order they are set.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::with_capacity(5);
        if let Some(disposition) = &self.content_disposition {
            headers.push(("Content-Disposition", disposition.clone()));
        }
        headers.push(("ETag", self.etag.clone()));
        headers.push(("Cache-Control", self.cache_control.to_string()));
        headers.push(("Last-Modified", self.last_modified.clone()));
        if let Some(content_type) = &self.content_type {
            headers.push(("Content-Type", content_type.clone()));
        }
        headers
    }
}

/// Strong entity tag: body length in hex and a truncated SHA-256 digest.
pub fn etag(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    let encoded = STANDARD_NO_PAD.encode(digest);
    format!("\"{:x}-{}\"", body.len(), &encoded[..27])
}

/// Format a timestamp as an RFC 1123 HTTP date.
pub fn http_date(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
