//! # Asset Engine Library
//!
//! This crate resolves `{#asset ...}` directives embedded in rendered
//! documents, scripts and template helpers.
//!
//! ## Overview
//!
//! Assets are named blobs kept in an asset store, either inline or linked to
//! a file on disk. The engine provides:
//!
//! - **Resolution**: Look up an asset by name or link and encode it as
//!   `utf8`, `base64`, an escaped string literal, a data URI or a link URL
//! - **Expansion**: Replace every directive in a text, recursively, with a
//!   bounded number of passes so reference cycles terminate
//! - **Guarded File Access**: Read and write linked files only when they
//!   match the configured `allowed_files` glob
//! - **Render Hooks**: Shared helper merging and expansion around template
//!   rendering and script execution
//! - **Store Hooks**: Record preparation on insert and write-through updates
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       AssetEngine                         │
//! ├───────────────────────────────────────────────────────────┤
//! │  render hooks · store hooks · content serving             │
//! │                                                           │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │         Expander (scan pass + recursion)            │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │                  AssetResolver                      │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! │  ┌──────────────────┐  ┌───────────────────────────────┐  │
//! │  │    AssetStore    │  │  FileGateway ─▶ PathGuard     │  │
//! │  └──────────────────┘  └───────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use engine::{AssetEngine, AssetRecord, Config, InMemoryAssetStore, RequestContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let store = InMemoryAssetStore::from_records([
//!         AssetRecord::with_content("style.css", "body { margin: 0 }"),
//!     ]);
//!
//!     let engine = AssetEngine::from_config(&config, store)?;
//!     let html = engine
//!         .expand("<style>{#asset style.css}</style>", &RequestContext::new())
//!         .await?;
//!
//!     println!("{html}");
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`context`]: Per-request principal and base URL
//! - [`store`]: Asset records and the store trait
//! - [`files`]: Allow-list guard and file gateway
//! - [`resolver`]: Single asset resolution
//! - [`expander`]: Directive scanning and recursive expansion
//! - [`content`]: Raw content serving metadata
//! - [`render`]: Render pipeline hooks
//! - [`hooks`]: Store insert and update hooks

pub mod config;
pub mod content;
pub mod context;
pub mod engine;
pub mod expander;
pub mod files;
pub mod hooks;
pub mod render;
pub mod resolver;
pub mod store;

// Re-export directive definitions for convenience
pub use directive;
pub use directive::{AssetError, EncodingMode, ErrorKind};

// Re-export config types for convenience
pub use config::{Config, ConfigError};

// Re-export engine types for convenience
pub use content::AssetContent;
pub use context::{Principal, RequestContext};
pub use engine::AssetEngine;
pub use expander::{Expander, Expansion, MAX_EXPANSION_PASSES};
pub use resolver::{AssetResolver, LoadedAsset, ResolvedAsset, ResolverOptions};

// Re-export collaborator types for convenience
pub use files::{FileGateway, FileSystem, LocalFileSystem, PathGuard};
pub use hooks::{content_extension, AssetUpdate};
pub use render::{Helpers, Template};
pub use store::{AssetQuery, AssetRecord, AssetStore, InMemoryAssetStore};
