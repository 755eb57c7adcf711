//! Asset resolution.
//!
//! Resolving an asset means finding its record in the store by name or
//! link, falling back to the disk when configured, reading the bytes from
//! the record or the linked file and encoding them for the requested mode.
//! `link` mode short-circuits to a URL and never reads content.

use std::path::PathBuf;
use std::time::SystemTime;

use directive::{AssetError, EncodingMode, Result};
use url::Url;

use crate::config::{AssetsConfig, ConfigError};
use crate::context::RequestContext;
use crate::files::{FileGateway, FileSystem};
use crate::store::{AssetQuery, AssetRecord, AssetStore};

/// Route prefix under which asset content is served.
pub const CONTENT_ROUTE: &str = "assets/content/";

/// An asset encoded for substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Encoded content, or the URL for `link` mode.
    pub content: String,
    /// File name used for typing the content.
    pub filename: String,
    /// Last modification time; `None` for links.
    pub modified: Option<SystemTime>,
}

/// Raw asset bytes before any encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAsset {
    /// Raw content.
    pub content: Vec<u8>,
    /// File name used for typing the content.
    pub filename: String,
    /// Last modification time.
    pub modified: SystemTime,
}

/// Resolution behaviour taken from the `[assets]` configuration.
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    /// Treat unknown names as file links.
    pub search_on_disk: bool,
    /// Query the store unscoped.
    pub public_access_enabled: bool,
    /// Base URL for links.
    pub root_url_for_links: Option<Url>,
    /// Base URL of the local HTTP server.
    pub local_base_url: Option<String>,
}

impl ResolverOptions {
    /// Build options from the assets configuration.
    pub fn from_config(config: &AssetsConfig) -> std::result::Result<Self, ConfigError> {
        let root_url_for_links = config
            .root_url_for_links
            .as_deref()
            .map(|value| {
                Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
                    field: "root_url_for_links",
                    value: value.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            search_on_disk: config.search_on_disk_if_not_found_in_store,
            public_access_enabled: config.public_access_enabled,
            root_url_for_links,
            local_base_url: config.local_base_url.clone(),
        })
    }
}

/// Resolves asset names against a store and the guarded file system.
#[derive(Debug)]
pub struct AssetResolver<S, F> {
    store: S,
    files: FileGateway<F>,
    options: ResolverOptions,
}

impl<S: AssetStore, F: FileSystem> AssetResolver<S, F> {
    /// Create a resolver.
    pub fn new(store: S, files: FileGateway<F>, options: ResolverOptions) -> Self {
        Self {
            store,
            files,
            options,
        }
    }

    /// The underlying asset store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The underlying file gateway.
    pub fn files(&self) -> &FileGateway<F> {
        &self.files
    }

    /// The resolution options.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve a link to its guarded absolute path.
    pub fn link_path(&self, link: &str) -> Result<PathBuf> {
        self.files.link_path(link)
    }

    /// Resolve an asset and encode it for `mode`.
    pub async fn resolve(
        &self,
        name: &str,
        mode: EncodingMode,
        ctx: &RequestContext,
    ) -> Result<ResolvedAsset> {
        if !mode.supports(name) {
            return Err(AssetError::UnsupportedEncoding {
                name: name.to_string(),
            });
        }

        let record = self.find_record(name, ctx).await?;

        let Some(encoder) = mode.payload_encoder() else {
            let target = record
                .as_ref()
                .and_then(|r| r.link.as_deref())
                .unwrap_or(name);
            return Ok(ResolvedAsset {
                content: self.resolve_link(target, ctx)?,
                filename: name.to_string(),
                modified: None,
            });
        };

        let loaded = self.load_source(name, record).await?;
        Ok(ResolvedAsset {
            content: encoder.encode(&loaded.content, &loaded.filename),
            filename: loaded.filename,
            modified: Some(loaded.modified),
        })
    }

    /// Load the raw bytes of an asset without encoding them.
    pub async fn load(&self, name: &str, ctx: &RequestContext) -> Result<LoadedAsset> {
        let record = self.find_record(name, ctx).await?;
        self.load_source(name, record).await
    }

    /// Compose the URL under which `target` is served.
    pub fn resolve_link(&self, target: &str, ctx: &RequestContext) -> Result<String> {
        let route = format!("{CONTENT_ROUTE}{target}");

        if let Some(root) = &self.options.root_url_for_links {
            return root
                .join(&route)
                .map(|url| url.to_string())
                .map_err(|e| AssetError::InvalidUrl(format!("{root} + {route}: {e}")));
        }

        let base = ctx
            .http_base_url()
            .or(self.options.local_base_url.as_deref());

        Ok(match base {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), route),
            None => route,
        })
    }

    /// Look up the record for `name`, preferring an exact name match over a
    /// link match. Fails when nothing matches and disk fallback is off.
    async fn find_record(&self, name: &str, ctx: &RequestContext) -> Result<Option<AssetRecord>> {
        let principal = if self.options.public_access_enabled {
            None
        } else {
            ctx.principal()
        };

        let mut records = self
            .store
            .find(&AssetQuery::NameOrLink(name.to_string()), principal)
            .await?;

        if records.is_empty() {
            if !self.options.search_on_disk {
                return Err(AssetError::AssetNotFound {
                    name: name.to_string(),
                });
            }
            tracing::debug!("Asset {} not in store, searching on disk", name);
            return Ok(None);
        }

        let idx = records.iter().position(|r| r.name == name).unwrap_or(0);
        Ok(Some(records.swap_remove(idx)))
    }

    async fn load_source(&self, name: &str, record: Option<AssetRecord>) -> Result<LoadedAsset> {
        let Some(record) = record else {
            let file = self.files.read_file(name).await?;
            return Ok(LoadedAsset {
                content: file.content,
                filename: file.filename,
                modified: file.modified,
            });
        };

        if let Some(link) = &record.link {
            let file = self.files.read_file(link).await?;
            return Ok(LoadedAsset {
                content: file.content,
                filename: file.filename,
                modified: file.modified,
            });
        }

        Ok(LoadedAsset {
            content: record.content.unwrap_or_default(),
            filename: record.name,
            modified: record.modification_date.unwrap_or_else(SystemTime::now),
        })
    }
}
