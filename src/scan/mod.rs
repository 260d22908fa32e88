//! Directory walk and file loading
//!
//! The walk is strictly sequential. Anything that goes wrong for a single
//! entry (permission denied, vanished file, binary content) is counted in
//! [`ScanStats`] and skipped; it never aborts the scan.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::domain::{ScanStats, SourceFile};
use crate::error::{ExportError, Result};
use crate::utils::{normalize_path, read_file_safe, ReadOutcome};

/// A file that passed the name filters but has not been read yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub relative_path: String,
}

pub struct FileScanner {
    root: PathBuf,
    extension: String,
    follow_symlinks: bool,
    sorted: bool,
    exclude: Option<GlobSet>,
    skip_path: Option<PathBuf>,
    stats: ScanStats,
}

impl FileScanner {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            follow_symlinks: false,
            sorted: false,
            exclude: None,
            skip_path: None,
            stats: ScanStats::default(),
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    pub fn exclude_globs(mut self, patterns: &[String]) -> Result<Self> {
        self.exclude = build_globset(patterns)?;
        Ok(self)
    }

    /// Never yield this file, e.g. the document being produced.
    pub fn skip_path(mut self, path: Option<PathBuf>) -> Self {
        self.skip_path = path;
        self
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn into_stats(self) -> ScanStats {
        self.stats
    }

    /// Walk the root and collect matching files in traversal order.
    pub fn scan(&mut self) -> Vec<Candidate> {
        let mut walker = WalkDir::new(&self.root).follow_links(self.follow_symlinks);
        if self.sorted {
            walker = walker.sort_by_file_name();
        }

        let mut candidates = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable directory entry");
                    self.stats.walk_errors += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            self.stats.files_scanned += 1;

            if !entry.file_name().to_string_lossy().ends_with(self.extension.as_str()) {
                continue;
            }
            if self.is_skipped(entry.path()) {
                debug!(path = %entry.path().display(), "skipping output document");
                continue;
            }
            self.stats.files_matched += 1;

            let relative_path = normalize_path(&self.root, entry.path());
            if self.exclude.as_ref().is_some_and(|set| set.is_match(&relative_path)) {
                debug!(path = %relative_path, "excluded by glob");
                self.stats.skipped_excluded += 1;
                continue;
            }

            candidates.push(Candidate { path: entry.into_path(), relative_path });
        }
        candidates
    }

    /// Read a candidate as text. Returns `None` when the file has to be skipped.
    pub fn load(&mut self, candidate: Candidate) -> Option<SourceFile> {
        match read_file_safe(&candidate.path) {
            Ok(ReadOutcome::Text { content, encoding }) => {
                if encoding != encoding_rs::UTF_8 {
                    debug!(path = %candidate.relative_path, encoding = encoding.name(), "decoded non-UTF-8 file");
                }
                Some(SourceFile {
                    path: candidate.path,
                    relative_path: candidate.relative_path,
                    content,
                })
            }
            Ok(ReadOutcome::Binary) => {
                debug!(path = %candidate.relative_path, "skipping binary file");
                self.stats.skipped_binary += 1;
                None
            }
            Err(err) => {
                debug!(path = %candidate.relative_path, error = %err, "skipping unreadable file");
                self.stats.skipped_unreadable += 1;
                None
            }
        }
    }

    fn is_skipped(&self, path: &Path) -> bool {
        let Some(skip) = self.skip_path.as_deref() else {
            return false;
        };
        path.canonicalize().map(|p| p == skip).unwrap_or(false)
    }
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| ExportError::InvalidPattern {
            pattern: pattern.clone(),
            message: err.to_string(),
        })?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|err| ExportError::InvalidPattern {
        pattern: patterns.join(","),
        message: err.to_string(),
    })?;
    Ok(Some(set))
}
