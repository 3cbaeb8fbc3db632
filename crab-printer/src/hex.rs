//! Hex command ingestion
//!
//! Operators type command bytes in whatever shape they copied them from a
//! manual: `0x1B 0x40`, `1B,40`, `1b-40`. Both helpers turn that text into
//! raw bytes.

use crate::error::{PrintError, PrintResult};
use std::path::Path;

/// Parse free-form hex text into bytes
///
/// `0x` prefixes are dropped, every non-alphanumeric character acts as a
/// separator, and each remaining token must be a hex byte. Empty input
/// yields an empty payload.
pub fn parse_hex_string(source: &str) -> PrintResult<Vec<u8>> {
    let scrubbed: String = source
        .replace("0x", "")
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    scrubbed
        .split_whitespace()
        .map(|token| {
            u8::from_str_radix(token, 16)
                .map_err(|_| PrintError::InvalidHex(format!("'{}' is not a hex byte", token)))
        })
        .collect()
}

/// Read a text file of hex digits, one run per line
///
/// Spaces inside a line are ignored; each line must then hold an even
/// number of hex digits.
pub fn read_hex_file(path: impl AsRef<Path>) -> PrintResult<Vec<u8>> {
    let text = std::fs::read_to_string(path)?;
    let mut result = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let digits: String = line.chars().filter(|c| *c != ' ').collect();
        let bytes = ::hex::decode(&digits)
            .map_err(|e| PrintError::InvalidHex(format!("line {}: {}", idx + 1, e)))?;
        result.extend_from_slice(&bytes);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_prefixed() {
        assert_eq!(parse_hex_string("0x1B 0x40").unwrap(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_parse_mixed_separators() {
        assert_eq!(
            parse_hex_string("1d,65;03  0c\n").unwrap(),
            vec![0x1D, 0x65, 0x03, 0x0C]
        );
        assert_eq!(parse_hex_string("a").unwrap(), vec![0x0A]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_hex_string("").unwrap().is_empty());
        assert!(parse_hex_string(" , ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_token() {
        assert!(matches!(
            parse_hex_string("1B ZZ"),
            Err(PrintError::InvalidHex(_))
        ));
        // out of byte range
        assert!(parse_hex_string("1B40").is_err());
    }

    #[test]
    fn test_read_hex_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1B 40").unwrap();
        writeln!(file, "1D65 05").unwrap();

        let bytes = read_hex_file(file.path()).unwrap();
        assert_eq!(bytes, vec![0x1B, 0x40, 0x1D, 0x65, 0x05]);
    }

    #[test]
    fn test_read_hex_file_odd_digits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1B 4").unwrap();

        assert!(matches!(
            read_hex_file(file.path()),
            Err(PrintError::InvalidHex(_))
        ));
    }
}
