//! Utility functions

pub mod encoding;
pub mod paths;

pub use encoding::{decode_permissive, looks_binary, read_file_safe, ReadOutcome};
pub use paths::normalize_path;
