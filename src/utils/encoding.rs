//! Permissive text decoding
//!
//! Reading a source file never fails on bad bytes: valid UTF-8 is taken as
//! is, anything else goes through charset detection and lossy decoding.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use std::fs;
use std::io;
use std::path::Path;

/// Bytes inspected for NUL when sniffing binary content.
const BINARY_SNIFF_BYTES: usize = 8192;

/// Whether the first few KiB of `bytes` contain a NUL byte.
pub fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_SNIFF_BYTES).any(|&b| b == 0)
}

/// Decode `bytes` to text, returning the text and the encoding used.
///
/// Invalid sequences become U+FFFD; this never fails.
pub fn decode_permissive(bytes: &[u8]) -> (String, &'static Encoding) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (text.into_owned(), encoding);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), UTF_8);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    (text.into_owned(), encoding)
}

/// Outcome of reading one candidate file
#[derive(Debug)]
pub enum ReadOutcome {
    Text { content: String, encoding: &'static Encoding },
    Binary,
}

/// Read the whole file at `path` as text.
///
/// I/O errors are returned to the caller; content problems are not errors.
pub fn read_file_safe(path: &Path) -> io::Result<ReadOutcome> {
    let bytes = fs::read(path)?;
    // UTF-16 text is full of NUL bytes; a BOM settles that it is text.
    if Encoding::for_bom(&bytes).is_none() && looks_binary(&bytes) {
        return Ok(ReadOutcome::Binary);
    }
    let (content, encoding) = decode_permissive(&bytes);
    Ok(ReadOutcome::Text { content, encoding })
}
