//! Guarded file access for linked and on-disk assets.
//!
//! Every path goes through the [`PathGuard`] before the file system is
//! touched. Relative links are joined to the configured root directory and
//! lexically normalized, so `..` components cannot step around the
//! allow-list.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use directive::{AssetError, Result};

use super::guard::PathGuard;

/// UTF-8 byte order mark stripped from file contents.
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// File system operations the gateway needs.
#[allow(async_fn_in_trait)]
pub trait FileSystem: Send + Sync {
    /// Read the whole file.
    async fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Last modification time of the file.
    async fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    /// Replace the file contents.
    async fn write_bytes(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// [`FileSystem`] backed by the local disk through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    async fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        tokio::fs::metadata(path).await?.modified()
    }

    async fn write_bytes(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }
}

/// A file read through the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRead {
    /// File contents without a leading byte order mark.
    pub content: Vec<u8>,
    /// Base name of the file.
    pub filename: String,
    /// Last modification time.
    pub modified: SystemTime,
}

/// Reads and writes asset files under an allow-list.
#[derive(Debug, Clone)]
pub struct FileGateway<F> {
    fs: F,
    guard: PathGuard,
    root_directory: PathBuf,
}

impl<F: FileSystem> FileGateway<F> {
    /// Create a gateway resolving relative links against `root_directory`.
    pub fn new(fs: F, guard: PathGuard, root_directory: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            guard,
            root_directory: root_directory.into(),
        }
    }

    /// The root directory relative links are joined to.
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Resolve a link to an absolute path and check it against the
    /// allow-list.
    pub fn link_path(&self, link: &str) -> Result<PathBuf> {
        let path = Path::new(link);
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_directory.join(path)
        };
        let absolute = normalize_lexically(&joined);

        if !self.guard.is_path_allowed(link, &absolute) {
            tracing::debug!("Denied access to {:?} (link {})", absolute, link);
            return Err(AssetError::AccessDenied { path: absolute });
        }

        Ok(absolute)
    }

    /// Read a linked file with its modification time.
    pub async fn read_file(&self, link: &str) -> Result<FileRead> {
        let path = self.link_path(link)?;

        let read = async {
            let content = self.fs.read_bytes(&path).await?;
            let modified = self.fs.modified(&path).await?;
            Ok::<_, io::Error>((content, modified))
        };

        let (content, modified) = read.await.map_err(|e| {
            tracing::debug!("Failed to read {:?}: {}", path, e);
            AssetError::FileNotFound { path: path.clone() }
        })?;

        Ok(FileRead {
            content: strip_bom(content),
            filename: file_name(&path),
            modified,
        })
    }

    /// Write new contents to a linked file.
    pub async fn write_file(&self, link: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.link_path(link)?;

        self.fs.write_bytes(&path, contents).await.map_err(|e| {
            tracing::debug!("Failed to write {:?}: {}", path, e);
            AssetError::FileUnwritable { path: path.clone() }
        })?;

        Ok(path)
    }
}

/// Base name of a path, lossily converted to UTF-8.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn strip_bom(mut content: Vec<u8>) -> Vec<u8> {
    if content.starts_with(&UTF8_BOM) {
        content.drain(..UTF8_BOM.len());
    }
    content
}

/// Resolve `.` and `..` components without touching the file system.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root
                if !matches!(
                    normalized.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
