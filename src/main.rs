//! export-tool: export source files with one extension into a single PDF
//!
//! Scans a directory recursively and writes one section per matching file,
//! each headed by the file's path.

fn main() {
    if let Err(err) = export_tool::cli::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
