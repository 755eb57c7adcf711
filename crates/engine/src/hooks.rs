//! Asset store hooks.
//!
//! Document stores call these before inserting or updating asset records.
//! Linked records are checked against the file allow-list on insert, and an
//! update may write its content through to the linked file.

use std::path::Path;
use std::time::SystemTime;

use directive::{mime, AssetError, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::AssetEngine;
use crate::files::gateway::file_name;
use crate::files::FileSystem;
use crate::store::{AssetRecord, AssetStore};

/// Length of generated short identifiers.
pub const SHORTID_LEN: usize = 7;

/// A partial update of an asset record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(
        default,
        with = "crate::store::content_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_shared_helper: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_update: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<SystemTime>,
}

impl AssetUpdate {
    /// Apply the set fields to a record.
    pub fn apply(self, record: &mut AssetRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(link) = self.link {
            record.link = Some(link);
        }
        if let Some(content) = self.content {
            record.content = Some(content);
        }
        if let Some(shared) = self.is_shared_helper {
            record.is_shared_helper = shared;
        }
        if let Some(date) = self.modification_date {
            record.modification_date = Some(date);
        }
    }
}

/// Generate a random short identifier.
pub fn generate_shortid() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHORTID_LEN)
        .map(char::from)
        .collect()
}

/// File extension used when a document store writes the asset content to
/// disk.
pub fn content_extension(name: &str) -> &str {
    mime::extension(name).unwrap_or_default()
}

impl<S: AssetStore, F: FileSystem> AssetEngine<S, F> {
    /// Prepare a record for insertion.
    ///
    /// Linked records take the name of the linked file, which must be
    /// readable through the allow-list.
    pub async fn before_insert(&self, record: &mut AssetRecord) -> Result<()> {
        record.force_update = false;
        record.modification_date = Some(SystemTime::now());

        if record.shortid.is_none() {
            record.shortid = Some(generate_shortid());
        }

        if let Some(link) = &record.link {
            record.name = file_name(Path::new(link));
            self.resolver().files().read_file(link).await?;
        }

        Ok(())
    }

    /// Prepare an update of the record identified by `id`.
    ///
    /// A forced update of a linked record writes the new content to the
    /// linked file instead of storing it.
    pub async fn before_update(&self, id: Option<&str>, update: &mut AssetUpdate) -> Result<()> {
        update.modification_date = Some(SystemTime::now());

        let forced = update.force_update.unwrap_or(false);
        let (Some(id), true, Some(link)) = (id, forced, update.link.as_deref()) else {
            update.force_update = None;
            return Ok(());
        };

        let content = update.content.as_deref().unwrap_or_default();
        let path = self
            .resolver()
            .files()
            .write_file(link, content)
            .await
            .map_err(|e| match e {
                AssetError::AccessDenied { path } => AssetError::FileUnwritable { path },
                other => other,
            })?;

        tracing::debug!("Wrote content of asset {} to {:?}", id, path);
        update.force_update = None;
        update.content = None;
        Ok(())
    }
}
