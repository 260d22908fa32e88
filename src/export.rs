//! Directory-to-document export pipeline
//!
//! enumerate → filter → read → render → persist, strictly in that order and
//! on one thread. The output path is only touched by the final atomic
//! rename, so a failed or interrupted run never leaves a partial document.

use chrono::Utc;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::domain::{ExportJob, ExportSummary, OutputDocument};
use crate::error::{ExportError, Result};
use crate::render::{FontChoice, PdfRenderer};
use crate::scan::FileScanner;

/// Export every file under `root` whose name ends with `extension` into one
/// PDF at `output`, with root-relative headers and the default layout.
///
/// Returns the number of files written to the document.
pub fn export(
    root: impl AsRef<Path>,
    extension: &str,
    output: impl AsRef<Path>,
) -> Result<usize> {
    let job = ExportJob::new(root.as_ref(), extension, output.as_ref());
    Exporter::new(job).run().map(|summary| summary.pages)
}

pub struct Exporter {
    job: ExportJob,
}

impl Exporter {
    pub fn new(job: ExportJob) -> Self {
        Self { job }
    }

    pub fn job(&self) -> &ExportJob {
        &self.job
    }

    pub fn run(&self) -> Result<ExportSummary> {
        let job = &self.job;
        if job.extension.is_empty() {
            return Err(ExportError::InvalidExtension);
        }
        job.layout.validate()?;
        let root = resolve_root(&job.root)?;

        let font = job.font.resolve()?;
        match &font {
            Some(font) => debug!(font = %font.path.display(), "embedding font"),
            None if job.font == FontChoice::Auto => {
                warn!("no monospaced TrueType font found, characters outside WinAnsi print as '?'")
            }
            None => {}
        }

        let mut scanner = FileScanner::new(root.clone(), job.extension.clone())
            .follow_symlinks(job.follow_symlinks)
            .sorted(job.sorted)
            .skip_path(job.output.canonicalize().ok())
            .exclude_globs(&job.exclude_globs)?;

        let candidates = scanner.scan();
        debug!(root = %root.display(), candidates = candidates.len(), "scan complete");

        let mut document = OutputDocument::new();
        for candidate in candidates {
            if job.is_cancelled() {
                return Err(ExportError::Interrupted);
            }
            if let Some(file) = scanner.load(candidate) {
                document.push(file, job.header_path);
            }
        }
        if job.is_cancelled() {
            return Err(ExportError::Interrupted);
        }

        let mut stats = scanner.into_stats();
        stats.files_exported = document.len();

        let title = root.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let rendered = PdfRenderer::new(job.layout.clone())
            .font(font)
            .title(title)
            .created_at(job.timestamp.then(Utc::now))
            .render(&document)?;

        write_atomic(&job.output, &rendered.bytes)?;
        info!(
            output = %job.output.display(),
            files = document.len(),
            pdf_pages = rendered.pages,
            "export written"
        );

        Ok(ExportSummary {
            output: job.output.clone(),
            pages: document.len(),
            pdf_pages: rendered.pages,
            stats,
        })
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    if !root.exists() {
        return Err(ExportError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ExportError::RootNotADirectory(root.to_path_buf()));
    }
    Ok(root.canonicalize().unwrap_or_else(|_| root.to_path_buf()))
}

/// Write `bytes` next to `output` and rename over it once fully flushed.
fn write_atomic(output: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if output.is_dir() {
        return Err(ExportError::output_write(
            output,
            io::Error::new(io::ErrorKind::Other, "output path is a directory"),
        ));
    }

    let mut temp =
        NamedTempFile::new_in(parent).map_err(|err| ExportError::output_write(output, err))?;
    temp.write_all(bytes).map_err(|err| ExportError::output_write(output, err))?;
    temp.as_file().sync_all().map_err(|err| ExportError::output_write(output, err))?;
    let file = temp.persist(output).map_err(|err| ExportError::output_write(output, err.error))?;
    set_default_permissions(&file);
    Ok(())
}

/// Temp files are created owner-only; give the document the usual mode.
#[cfg(unix)]
fn set_default_permissions(file: &fs::File) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(err) = file.set_permissions(fs::Permissions::from_mode(0o644)) {
        debug!(error = %err, "could not relax output permissions");
    }
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &fs::File) {}
