//! Export-Tool: turn a source tree into one printable PDF
//!
//! Every file under a root directory whose name ends with a given suffix
//! becomes one section of the document, headed by its path.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod render;
pub mod scan;
pub mod utils;

pub use domain::{ExportJob, ExportSummary, HeaderPath};
pub use error::{ExportError, Result};
pub use export::{export, Exporter};
