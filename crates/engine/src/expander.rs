//! Directive scanning and recursive expansion.
//!
//! One scan pass finds every `{#asset ...}` directive in a text, resolves
//! them concurrently and splices the results back in their original order.
//! Expansion repeats the pass over its own output so that assets may embed
//! directives themselves, until no directive is left or the pass limit is
//! reached. Directives still present after the limit (a reference cycle)
//! are left in the text verbatim.

use directive::{contains_directive, find_directives, splice, Result};
use futures_util::future::try_join_all;

use crate::context::RequestContext;
use crate::files::FileSystem;
use crate::resolver::AssetResolver;
use crate::store::AssetStore;

/// Number of re-scans allowed after the first pass of one expansion.
pub const MAX_EXPANSION_PASSES: u32 = 100;

/// Result of one top-level expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// The expanded text.
    pub text: String,
    /// Number of scan passes performed, at least one.
    pub scans: u32,
    /// Whether directives were left unresolved because of the pass limit.
    pub truncated: bool,
    /// Directives left in place, in wire form.
    pub remaining: Vec<String>,
}

/// Expands asset directives through an [`AssetResolver`].
#[derive(Debug)]
pub struct Expander<'r, S, F> {
    resolver: &'r AssetResolver<S, F>,
    max_passes: u32,
}

impl<'r, S: AssetStore, F: FileSystem> Expander<'r, S, F> {
    /// Create an expander with the default pass limit.
    pub fn new(resolver: &'r AssetResolver<S, F>) -> Self {
        Self {
            resolver,
            max_passes: MAX_EXPANSION_PASSES,
        }
    }

    /// Override the number of re-scans allowed after the first pass.
    pub fn with_max_passes(mut self, max_passes: u32) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Run a single scan pass.
    ///
    /// All directives are resolved concurrently; the first failure aborts
    /// the pass and nothing is substituted.
    pub async fn scan_and_replace(&self, text: &str, ctx: &RequestContext) -> Result<String> {
        let matches = find_directives(text)?;
        if matches.is_empty() {
            return Ok(text.to_string());
        }

        let resolved = try_join_all(matches.iter().map(|m| {
            self.resolver
                .resolve(&m.directive.asset_name, m.directive.encoding, ctx)
        }))
        .await?;

        let replacements: Vec<_> = matches
            .iter()
            .zip(resolved)
            .map(|(m, asset)| (m.range.clone(), asset.content))
            .collect();

        let names: Vec<&str> = matches
            .iter()
            .map(|m| m.directive.asset_name.as_str())
            .collect();
        tracing::debug!("Replaced assets {:?}", names);

        Ok(splice(text, &replacements))
    }

    /// Expand the text until no directive is left or the pass limit is hit.
    pub async fn expand(&self, text: &str, ctx: &RequestContext) -> Result<String> {
        Ok(self.expand_traced(text, ctx).await?.text)
    }

    /// Like [`Expander::expand`], also reporting how many passes ran.
    pub async fn expand_traced(&self, text: &str, ctx: &RequestContext) -> Result<Expansion> {
        let mut passes = 0;
        let mut text = self.scan_and_replace(text, ctx).await?;

        while contains_directive(&text) && passes < self.max_passes {
            passes += 1;
            text = self.scan_and_replace(&text, ctx).await?;
        }

        let truncated = contains_directive(&text);
        let remaining: Vec<String> = if truncated {
            find_directives(&text)
                .unwrap_or_default()
                .iter()
                .map(|m| m.directive.to_wire())
                .collect()
        } else {
            Vec::new()
        };
        if truncated {
            tracing::debug!(
                "Stopped expanding assets after {} passes, left in place: {:?}",
                passes + 1,
                remaining
            );
        }

        Ok(Expansion {
            text,
            scans: passes + 1,
            truncated,
            remaining,
        })
    }
}
