//! Error types for export runs.
//!
//! Only whole-run failures live here. Per-file problems (unreadable files,
//! binary content, walk errors) are absorbed by the scanner and only show up
//! as counters in [`crate::domain::ScanStats`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Fatal conditions that abort an export run.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The scan root does not exist.
    #[error("root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// The scan root exists but is not a directory.
    #[error("root is not a directory: {}", .0.display())]
    RootNotADirectory(PathBuf),

    /// The extension filter is empty and would match every file.
    #[error("file extension filter must not be empty")]
    InvalidExtension,

    /// An exclude glob could not be compiled.
    #[error("invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The page layout leaves no room for text.
    #[error("invalid page layout: {0}")]
    InvalidLayout(String),

    /// A font file could not be used for the document.
    #[error("cannot load font {}: {message}", .path.display())]
    Font { path: PathBuf, message: String },

    /// The PDF could not be assembled in memory.
    #[error("failed to render document: {0}")]
    Render(String),

    /// The output document could not be written.
    #[error("cannot write output {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The run was cancelled between files.
    #[error("export interrupted before the output was written")]
    Interrupted,
}

impl ExportError {
    pub(crate) fn output_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::OutputWrite { path: path.into(), source }
    }

    pub(crate) fn font(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Font { path: path.into(), message: message.to_string() }
    }
}

impl From<lopdf::Error> for ExportError {
    fn from(err: lopdf::Error) -> Self {
        Self::Render(err.to_string())
    }
}
