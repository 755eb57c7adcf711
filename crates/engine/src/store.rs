//! Asset records and the store they are looked up in.
//!
//! The engine only reads from the store. [`InMemoryAssetStore`] is a
//! thread-safe implementation that can be persisted to a JSON manifest at
//! e.g. `assets.json`; production deployments plug in their own document
//! store through the [`AssetStore`] trait.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use dashmap::DashMap;
use directive::AssetError;
use serde::{Deserialize, Serialize};

use crate::context::Principal;

/// A stored asset.
///
/// Either `content` or `link` is the source of truth: when `link` is set the
/// linked file is read, otherwise the stored content is used.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Unique public name.
    pub name: String,
    /// Short identifier assigned on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortid: Option<String>,
    /// Path of a file on disk holding the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Inline content (serialized as base64).
    #[serde(default, with = "content_serde", skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<SystemTime>,
    /// Whether the content is appended to the helpers of every template.
    #[serde(default)]
    pub is_shared_helper: bool,
    /// Write-through request for linked content; never persisted.
    #[serde(default, skip_serializing)]
    pub force_update: bool,
    /// Owning principal. Unowned assets are visible to everyone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl AssetRecord {
    /// Create a record with inline content.
    pub fn with_content(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Create a record linked to a file on disk.
    pub fn with_link(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: Some(link.into()),
            ..Default::default()
        }
    }

    /// Mark the record as a shared helper.
    pub fn shared_helper(mut self) -> Self {
        self.is_shared_helper = true;
        self
    }

    /// Set the owning principal.
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Whether the principal may see this record.
    pub fn is_visible_to(&self, principal: Option<&Principal>) -> bool {
        match (principal, &self.owner) {
            (None, _) | (_, None) => true,
            (Some(p), Some(owner)) => p.is_admin || &p.id == owner,
        }
    }
}

/// Queries the engine issues against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetQuery {
    /// Records whose `name` or `link` equals the value.
    NameOrLink(String),
    /// Records flagged as shared helpers.
    SharedHelpers,
}

impl AssetQuery {
    /// Whether the record satisfies the query.
    pub fn matches(&self, record: &AssetRecord) -> bool {
        match self {
            AssetQuery::NameOrLink(value) => {
                &record.name == value || record.link.as_deref() == Some(value.as_str())
            }
            AssetQuery::SharedHelpers => record.is_shared_helper,
        }
    }
}

/// Read access to asset records.
///
/// `principal` scopes the query; `None` means unscoped (public) access.
#[allow(async_fn_in_trait)]
pub trait AssetStore: Send + Sync {
    /// Find all records matching the query that the principal may see.
    async fn find(
        &self,
        query: &AssetQuery,
        principal: Option<&Principal>,
    ) -> Result<Vec<AssetRecord>, AssetError>;
}

/// Thread-safe in-memory asset store keyed by asset name.
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    records: DashMap<String, AssetRecord>,
}

impl InMemoryAssetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given records.
    pub fn from_records(records: impl IntoIterator<Item = AssetRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Insert or replace a record, returning the previous one.
    pub fn insert(&self, record: AssetRecord) -> Option<AssetRecord> {
        self.records.insert(record.name.clone(), record)
    }

    /// Get a record by name.
    pub fn get(&self, name: &str) -> Option<AssetRecord> {
        self.records.get(name).map(|r| r.clone())
    }

    /// Remove a record by name.
    pub fn remove(&self, name: &str) -> Option<AssetRecord> {
        self.records.remove(name).map(|(_, record)| record)
    }

    /// All records sorted by name.
    pub fn records(&self) -> Vec<AssetRecord> {
        let mut records: Vec<AssetRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load a store from a JSON manifest holding an array of records.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read asset manifest: {}", path.display()))?;

        let records: Vec<AssetRecord> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse asset manifest: {}", path.display()))?;

        tracing::info!("Loaded {} assets from {:?}", records.len(), path);
        Ok(Self::from_records(records))
    }

    /// Save the store to a JSON manifest.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create manifest directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(&self.records())
            .context("Failed to serialize asset manifest")?;

        // Atomic write
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &contents).with_context(|| {
            format!("Failed to write temp manifest file: {}", temp_path.display())
        })?;

        fs::rename(&temp_path, path).with_context(|| {
            format!(
                "Failed to rename temp manifest file {} to {}",
                temp_path.display(),
                path.display()
            )
        })?;

        tracing::debug!("Saved {} assets to {:?}", self.len(), path);
        Ok(())
    }
}

impl AssetStore for InMemoryAssetStore {
    async fn find(
        &self,
        query: &AssetQuery,
        principal: Option<&Principal>,
    ) -> Result<Vec<AssetRecord>, AssetError> {
        let mut found: Vec<AssetRecord> = self
            .records
            .iter()
            .filter(|r| query.matches(r.value()) && r.value().is_visible_to(principal))
            .map(|r| r.value().clone())
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }
}

/// Serde support for inline content (serializes as base64).
pub(crate) mod content_serde {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(content: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        content
            .as_ref()
            .map(|bytes| STANDARD.encode(bytes))
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Deserialize::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
