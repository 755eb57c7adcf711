//! Allow-list check for on-disk asset access.
//!
//! A single glob pattern from `assets.allowed_files` decides which files
//! the engine may read. The pattern is tried against the resolved absolute
//! path and against the link as written, each in its original and its
//! separator-flipped form, so one pattern serves both `/` and `\` paths and
//! relative patterns can match before the root directory is joined.
//!
//! Wildcards never match hidden segments (those starting with `.`); a
//! hidden directory or file is only allowed when the pattern names it with
//! a segment of its own that starts with `.`. A link containing `..` is
//! only checked in its normalized absolute form.

use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

/// Compiled allow-list for asset files.
#[derive(Debug, Clone)]
pub struct PathGuard {
    /// `None` denies every path.
    matcher: Option<GlobMatcher>,
    /// Pattern segments starting with `.`, the only ones allowed to match
    /// hidden segments.
    dot_segments: Vec<GlobMatcher>,
}

impl PathGuard {
    /// Compile a guard from the configured pattern. `None` denies all paths.
    pub fn new(allowed_files: Option<&str>) -> Result<Self, globset::Error> {
        let Some(pattern) = allowed_files else {
            return Ok(Self::deny_all());
        };

        let dot_segments = segments(pattern)
            .filter(|segment| segment.starts_with('.'))
            .map(compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            matcher: Some(compile(pattern)?),
            dot_segments,
        })
    }

    /// A guard that denies every path.
    pub fn deny_all() -> Self {
        Self {
            matcher: None,
            dot_segments: Vec::new(),
        }
    }

    /// Whether any allow-list pattern is configured.
    pub fn is_configured(&self) -> bool {
        self.matcher.is_some()
    }

    /// Check the link as written and its resolved absolute path.
    pub fn is_path_allowed(&self, link: &str, absolute_path: &Path) -> bool {
        let Some(matcher) = &self.matcher else {
            return false;
        };

        let absolute = absolute_path.to_string_lossy();
        let mut candidates = vec![absolute.to_string(), flip_separators(&absolute)];
        if !has_parent_segment(link) {
            candidates.push(link.to_string());
            candidates.push(flip_separators(link));
        }

        candidates
            .iter()
            .any(|candidate| self.allows_hidden(candidate) && matcher.is_match(candidate))
    }

    /// Every hidden segment of the candidate must be named by the pattern.
    fn allows_hidden(&self, candidate: &str) -> bool {
        segments(candidate)
            .filter(|segment| is_hidden(segment))
            .all(|segment| self.dot_segments.iter().any(|m| m.is_match(segment)))
    }
}

/// One-shot form of [`PathGuard::is_path_allowed`].
///
/// Returns false when the pattern is unset or is not a valid glob.
pub fn is_path_allowed(allowed_files: Option<&str>, link: &str, absolute_path: &Path) -> bool {
    PathGuard::new(allowed_files)
        .map(|guard| guard.is_path_allowed(link, absolute_path))
        .unwrap_or(false)
}

fn compile(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\'])
}

fn is_hidden(segment: &str) -> bool {
    segment.starts_with('.') && segment != "." && segment != ".."
}

fn has_parent_segment(link: &str) -> bool {
    segments(link).any(|segment| segment == "..")
}

/// Swap `/` and `\` separators.
fn flip_separators(path: &str) -> String {
    path.chars()
        .map(|c| match c {
            '/' => '\\',
            '\\' => '/',
            other => other,
        })
        .collect()
}
