//! Core domain types
//!
//! An [`ExportJob`] describes one run, the scanner produces [`SourceFile`]s,
//! and each source file becomes one [`Page`] of the [`OutputDocument`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::LayoutConfig;
use crate::render::font::FontChoice;

/// Prefix of the header line that opens every page.
pub const HEADER_PREFIX: &str = "// File: ";

/// How the header line refers to the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HeaderPath {
    /// Path relative to the scan root, `/`-separated
    #[default]
    Relative,
    /// Absolute path on disk
    Absolute,
}

/// A matched file, read once and dropped after rendering
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path to the file
    pub path: PathBuf,

    /// Path relative to the scan root
    pub relative_path: String,

    /// Decoded text content
    pub content: String,
}

impl SourceFile {
    pub fn header(&self, style: HeaderPath) -> String {
        match style {
            HeaderPath::Relative => format!("{HEADER_PREFIX}{}", self.relative_path),
            HeaderPath::Absolute => format!("{HEADER_PREFIX}{}", self.path.display()),
        }
    }
}

/// Parameters of one export run. Immutable once the run starts.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Directory to scan
    pub root: PathBuf,

    /// Case-sensitive file name suffix, e.g. `.kt`
    pub extension: String,

    /// Destination document, overwritten if present
    pub output: PathBuf,

    pub header_path: HeaderPath,

    /// Glob patterns matched against root-relative paths
    pub exclude_globs: Vec<String>,

    pub follow_symlinks: bool,

    /// Sort siblings by file name instead of using raw directory order
    pub sorted: bool,

    pub layout: LayoutConfig,

    pub font: FontChoice,

    /// Write a CreationDate into the document info
    pub timestamp: bool,

    cancel: Option<Arc<AtomicBool>>,
}

impl ExportJob {
    pub fn new(
        root: impl Into<PathBuf>,
        extension: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            output: output.into(),
            header_path: HeaderPath::default(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            sorted: false,
            layout: LayoutConfig::default(),
            font: FontChoice::default(),
            timestamp: true,
            cancel: None,
        }
    }

    pub fn header_path(mut self, header_path: HeaderPath) -> Self {
        self.header_path = header_path;
        self
    }

    pub fn exclude_globs(mut self, globs: Vec<String>) -> Self {
        self.exclude_globs = globs;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn font(mut self, font: FontChoice) -> Self {
        self.font = font;
        self
    }

    pub fn timestamp(mut self, timestamp: bool) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Abort the run between files once `flag` is set.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|flag| flag.load(Ordering::Relaxed)).unwrap_or(false)
    }
}

/// One section of the output, one per exported file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub header: String,
    pub body: String,
}

/// Ordered pages in walk order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDocument {
    pages: Vec<Page>,
}

impl OutputDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: SourceFile, style: HeaderPath) {
        let header = file.header(style);
        self.pages.push(Page { header, body: file.content });
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Counters collected while scanning
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Regular files visited by the walk
    pub files_scanned: usize,

    /// Files whose name ends with the extension
    pub files_matched: usize,

    /// Files that made it into the document
    pub files_exported: usize,

    /// Matched files dropped by an exclude glob
    #[serde(default)]
    pub skipped_excluded: usize,

    /// Matched files that looked binary
    #[serde(default)]
    pub skipped_binary: usize,

    /// Matched files that could not be read
    #[serde(default)]
    pub skipped_unreadable: usize,

    /// Directory entries the walker could not visit
    #[serde(default)]
    pub walk_errors: usize,
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSummary {
    pub output: PathBuf,

    /// One per exported file
    pub pages: usize,

    /// Physical PDF pages after wrapping and page breaks
    pub pdf_pages: usize,

    pub stats: ScanStats,
}
