//! The asset engine facade.
//!
//! [`AssetEngine`] wires the resolver, the expander and the guarded file
//! gateway together from a [`Config`] and exposes the operations external
//! collaborators call: resolving single assets, expanding text, serving raw
//! content and resolving link paths. Render and store hooks are implemented
//! on it in the `render` and `hooks` modules.

use std::path::PathBuf;

use anyhow::Context;
use directive::{EncodingMode, Result};

use crate::config::Config;
use crate::content::AssetContent;
use crate::context::RequestContext;
use crate::expander::{Expander, Expansion};
use crate::files::{FileGateway, FileSystem, LocalFileSystem, PathGuard};
use crate::resolver::{AssetResolver, ResolvedAsset, ResolverOptions};
use crate::store::AssetStore;

/// Resolves and expands asset directives.
#[derive(Debug)]
pub struct AssetEngine<S, F = LocalFileSystem> {
    resolver: AssetResolver<S, F>,
}

impl<S: AssetStore> AssetEngine<S, LocalFileSystem> {
    /// Create an engine reading files from the local disk.
    pub fn from_config(config: &Config, store: S) -> anyhow::Result<Self> {
        Self::with_file_system(config, store, LocalFileSystem)
    }
}

impl<S: AssetStore, F: FileSystem> AssetEngine<S, F> {
    /// Create an engine on top of an existing resolver.
    pub fn new(resolver: AssetResolver<S, F>) -> Self {
        Self { resolver }
    }

    /// Create an engine with a custom file system.
    pub fn with_file_system(config: &Config, store: S, fs: F) -> anyhow::Result<Self> {
        config.validate().context("Invalid asset engine configuration")?;

        let guard = PathGuard::new(config.assets.allowed_files.as_deref())
            .context("Failed to compile allowed_files pattern")?;
        if !guard.is_configured() {
            tracing::debug!("No allowed_files pattern configured, disk access is denied");
        }

        let files = FileGateway::new(fs, guard, &config.engine.root_directory);
        let options = ResolverOptions::from_config(&config.assets)?;

        Ok(Self::new(AssetResolver::new(store, files, options)))
    }

    /// The underlying resolver.
    pub fn resolver(&self) -> &AssetResolver<S, F> {
        &self.resolver
    }

    /// An expander bound to this engine's resolver.
    pub fn expander(&self) -> Expander<'_, S, F> {
        Expander::new(&self.resolver)
    }

    /// Resolve a single asset.
    pub async fn resolve_asset(
        &self,
        name: &str,
        mode: EncodingMode,
        ctx: &RequestContext,
    ) -> Result<ResolvedAsset> {
        self.resolver.resolve(name, mode, ctx).await
    }

    /// Run one directive scan pass over the text.
    pub async fn scan_and_replace(&self, text: &str, ctx: &RequestContext) -> Result<String> {
        self.expander().scan_and_replace(text, ctx).await
    }

    /// Expand all directives in the text, recursively.
    pub async fn expand(&self, text: &str, ctx: &RequestContext) -> Result<String> {
        self.expander().expand(text, ctx).await
    }

    /// Like [`AssetEngine::expand`], also reporting the number of passes.
    pub async fn expand_traced(&self, text: &str, ctx: &RequestContext) -> Result<Expansion> {
        self.expander().expand_traced(text, ctx).await
    }

    /// Resolve the guarded absolute path of a link.
    pub fn link_path(&self, link: &str) -> Result<PathBuf> {
        self.resolver.link_path(link).inspect_err(|e| {
            tracing::warn!("Unable to get asset link {}: {}", link, e);
        })
    }

    /// Load the raw bytes of an asset with their serving metadata.
    pub async fn content(
        &self,
        name: &str,
        download: bool,
        ctx: &RequestContext,
    ) -> Result<AssetContent> {
        match self.resolver.load(name, ctx).await {
            Ok(asset) => Ok(AssetContent::new(asset, download)),
            Err(e) => {
                tracing::warn!("Unable to get asset content {}: {}", name, e);
                Err(e)
            }
        }
    }
}
