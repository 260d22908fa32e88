//! Export command implementation

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::{merge_layout_overrides, LayoutConfig, LayoutOverrides, PageSize};
use crate::domain::{ExportJob, ExportSummary, HeaderPath};
use crate::render::FontChoice;
use crate::export::Exporter;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Directory to scan recursively
    #[arg(short, long, value_name = "DIR")]
    pub root: PathBuf,

    /// Case-sensitive file name suffix to include (e.g. '.kt')
    #[arg(short, long, value_name = "SUFFIX")]
    pub ext: String,

    /// Destination PDF, overwritten if it exists
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Print absolute paths in page headers instead of root-relative ones
    #[arg(long)]
    pub absolute_paths: bool,

    /// Sort entries by file name instead of raw directory order
    #[arg(long)]
    pub sorted: bool,

    /// Follow symbolic links when scanning
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip paths matching these globs, relative to the root (repeatable or comma-separated)
    #[arg(short = 'x', long, value_name = "GLOB", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Paper size: a4|letter
    #[arg(long, value_name = "SIZE")]
    pub page_size: Option<PageSize>,

    /// Font size in points
    #[arg(long, value_name = "PT")]
    pub font_size: Option<f32>,

    /// TrueType font to embed [default: first monospaced system font found]
    #[arg(long, value_name = "TTF", conflicts_with = "builtin_font")]
    pub font: Option<PathBuf>,

    /// Use the built-in Courier font (WinAnsi characters only)
    #[arg(long)]
    pub builtin_font: bool,

    /// Omit the creation date for reproducible output
    #[arg(long)]
    pub no_timestamp: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl ExportArgs {
    fn layout(&self) -> LayoutConfig {
        let overrides = LayoutOverrides {
            page_size: self.page_size,
            font_size: self.font_size,
            ..LayoutOverrides::default()
        };
        merge_layout_overrides(LayoutConfig::default(), overrides)
    }

    fn font_choice(&self) -> FontChoice {
        match (&self.font, self.builtin_font) {
            (Some(path), _) => FontChoice::File(path.clone()),
            (None, true) => FontChoice::Builtin,
            (None, false) => FontChoice::Auto,
        }
    }

    fn into_job(self) -> ExportJob {
        let layout = self.layout();
        let font = self.font_choice();
        let header_path =
            if self.absolute_paths { HeaderPath::Absolute } else { HeaderPath::Relative };
        ExportJob::new(self.root, self.ext, self.output)
            .header_path(header_path)
            .exclude_globs(self.exclude)
            .follow_symlinks(self.follow_symlinks)
            .sorted(self.sorted)
            .layout(layout)
            .font(font)
            .timestamp(!self.no_timestamp)
    }
}

pub fn run(args: ExportArgs) -> Result<()> {
    let start_time = Instant::now();

    if args.ext.trim().is_empty() {
        anyhow::bail!("--ext must not be empty");
    }
    if let Some(font_size) = args.font_size {
        if !(font_size > 0.0) {
            anyhow::bail!("Invalid font size '{font_size}'. Use a positive number of points");
        }
    }

    let json = args.json;
    let spinner = if json { ProgressBar::hidden() } else { scan_spinner(&args.root) };

    let result = Exporter::new(args.into_job()).run();
    spinner.finish_and_clear();
    let summary = result?;
    debug!(elapsed_ms = start_time.elapsed().as_millis() as u64, "export finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn scan_spinner(root: &std::path::Path) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Exporting {}", root.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_summary(summary: &ExportSummary) {
    let files = summary.pages;
    let noun = if files == 1 { "file" } else { "files" };
    println!("Exported {files} {noun} to {}", summary.output.display());

    let stats = &summary.stats;
    let skipped = stats.skipped_binary + stats.skipped_unreadable;
    if skipped > 0 {
        println!(
            "  Skipped {skipped} unreadable or binary file(s) (run with --verbose for details)"
        );
    }
    if stats.walk_errors > 0 {
        println!("  {} entr(ies) could not be read", stats.walk_errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> ExportArgs {
        #[derive(clap::Parser)]
        struct Harness {
            #[command(flatten)]
            args: ExportArgs,
        }
        let mut argv = vec!["export-tool", "--root", "src", "--ext", ".kt", "--output", "out.pdf"];
        argv.extend_from_slice(extra);
        <Harness as clap::Parser>::parse_from(argv).args
    }

    #[test]
    fn defaults_map_to_relative_headers_and_a4() {
        let job = args(&[]).into_job();
        assert_eq!(job.header_path, HeaderPath::Relative);
        assert_eq!(job.layout, LayoutConfig::default());
        assert!(job.timestamp);
        assert!(!job.sorted);
        assert_eq!(job.font, FontChoice::Auto);
    }

    #[test]
    fn font_flags_pick_the_text_font() {
        let job = args(&["--font", "fonts/Mono.ttf"]).into_job();
        assert_eq!(job.font, FontChoice::File(PathBuf::from("fonts/Mono.ttf")));

        let job = args(&["--builtin-font"]).into_job();
        assert_eq!(job.font, FontChoice::Builtin);
    }

    #[test]
    fn flags_reach_the_job() {
        let job = args(&[
            "--absolute-paths",
            "--sorted",
            "--no-timestamp",
            "--exclude",
            "build/**,gen/**",
            "--page-size",
            "letter",
            "--font-size",
            "10",
        ])
        .into_job();

        assert_eq!(job.header_path, HeaderPath::Absolute);
        assert!(job.sorted);
        assert!(!job.timestamp);
        assert_eq!(job.exclude_globs, vec!["build/**".to_string(), "gen/**".to_string()]);
        assert_eq!(job.layout.page_size, PageSize::Letter);
        assert_eq!(job.layout.font_size, 10.0);
    }
}
