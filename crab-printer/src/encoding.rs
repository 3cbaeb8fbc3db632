//! Text encoding for raw text jobs
//!
//! Raw jobs bypass the driver, so text has to be turned into single-byte
//! code page data before it is written:
//! - ASCII for generated ticket content
//! - the ANSI code page (Windows-1252) for operator-supplied text

use tracing::instrument;

/// Encode a string as ASCII, replacing anything outside 0x00-0x7F with `?`
pub fn encode_ascii_lossy(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}

/// Encode a string to Windows-1252
///
/// Characters with no mapping become `?` rather than the HTML numeric
/// references `encoding_rs` would substitute.
#[instrument(skip(s), fields(chars = s.len()))]
pub fn encode_ansi(s: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(s.len());
    let mut scratch = [0u8; 4];

    for c in s.chars() {
        if c.is_ascii() {
            result.push(c as u8);
            continue;
        }
        let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut scratch));
        if had_errors {
            result.push(b'?');
        } else {
            result.extend_from_slice(&bytes);
        }
    }

    result
}
