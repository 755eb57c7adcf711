//! Guarded file access for asset links.
//!
//! This module provides:
//! - An allow-list check on glob patterns for every path the engine touches
//! - Reading linked files with modification time and BOM stripping
//! - Writing linked files for write-through updates
//!
//! # Security
//!
//! All disk access goes through [`FileGateway::link_path`], which joins
//! relative links to the root directory, normalizes `..` components and
//! denies any path not covered by `assets.allowed_files`. With no pattern
//! configured, every path is denied.

pub mod gateway;
pub mod guard;

pub use gateway::{FileGateway, FileRead, FileSystem, LocalFileSystem};
pub use guard::{is_path_allowed, PathGuard};
