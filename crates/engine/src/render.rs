//! Render pipeline hooks.
//!
//! The host renderer calls these around template rendering: before the
//! templating engine runs, after it produced output, and before user
//! scripts execute. Every hook runs its own top-level expansions.

use directive::{EncodingMode, Result};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::engine::AssetEngine;
use crate::files::FileSystem;
use crate::store::{AssetQuery, AssetStore};

/// Template helpers as passed by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Helpers {
    /// No helpers.
    #[default]
    None,
    /// Helper source code.
    Text(String),
    /// Helpers passed as a structured object; shared helpers cannot be
    /// merged into these.
    Object(serde_json::Value),
}

impl Helpers {
    /// The helper source, when helpers are text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Helpers::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// The parts of a template the engine rewrites before rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Template content.
    pub content: String,
    /// Template helpers.
    #[serde(default)]
    pub helpers: Helpers,
}

impl Template {
    /// Create a template without helpers.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            helpers: Helpers::None,
        }
    }

    /// Attach helper source code.
    pub fn with_helpers(mut self, helpers: impl Into<String>) -> Self {
        self.helpers = Helpers::Text(helpers.into());
        self
    }
}

impl<S: AssetStore, F: FileSystem> AssetEngine<S, F> {
    /// Append the content of every shared helper asset to the helpers.
    ///
    /// Content already contained in the helpers is not appended twice.
    pub async fn merge_shared_helpers(
        &self,
        helpers: &mut Helpers,
        ctx: &RequestContext,
    ) -> Result<()> {
        let principal = if self.resolver().options().public_access_enabled {
            None
        } else {
            ctx.principal()
        };
        let shared = self
            .resolver()
            .store()
            .find(&AssetQuery::SharedHelpers, principal)
            .await?;

        if shared.is_empty() {
            return Ok(());
        }

        if matches!(helpers, Helpers::Object(_)) {
            tracing::warn!("Cannot add shared helpers when passing helpers as object");
            return Ok(());
        }

        let contents = try_join_all(
            shared
                .iter()
                .map(|record| self.resolve_asset(&record.name, EncodingMode::Utf8, ctx)),
        )
        .await?;

        let mut merged = helpers.as_text().unwrap_or_default().to_string();
        for asset in contents {
            if !merged.contains(&asset.content) {
                merged.push('\n');
                merged.push_str(&asset.content);
            }
        }

        tracing::debug!("Merged {} shared helper assets", shared.len());
        *helpers = Helpers::Text(merged);
        Ok(())
    }

    /// Prepare a template for rendering.
    ///
    /// Shared helpers are merged first, then the content and the helper
    /// source are expanded.
    pub async fn before_render(&self, template: &mut Template, ctx: &RequestContext) -> Result<()> {
        self.merge_shared_helpers(&mut template.helpers, ctx).await?;

        template.content = self.expand(&template.content, ctx).await?;

        if let Helpers::Text(helpers) = &template.helpers {
            if !helpers.is_empty() {
                template.helpers = Helpers::Text(self.expand(helpers, ctx).await?);
            }
        }

        Ok(())
    }

    /// Expand the output of the templating engine.
    pub async fn after_render(&self, output: &[u8], ctx: &RequestContext) -> Result<Vec<u8>> {
        let text = String::from_utf8_lossy(output);
        Ok(self.expand(&text, ctx).await?.into_bytes())
    }

    /// Expand a script before it is executed.
    pub async fn before_script(&self, script: &str, ctx: &RequestContext) -> Result<String> {
        self.expand(script, ctx).await
    }
}
