//! Human-readable byte sizes (`64MB`, `2GB`, `512KB`).

use thiserror::Error;

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// A size string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid size '{0}' (expected a number with optional KB, MB or GB suffix)")]
pub struct SizeParseError(pub String);

/// Parses a size with an optional `K`/`KB`/`M`/`MB`/`G`/`GB` suffix.
///
/// Suffixes are case-insensitive and binary (1 KB = 1024 bytes). A bare
/// number is bytes.
pub fn parse_size(s: &str) -> Result<usize, SizeParseError> {
    let trimmed = s.trim();
    let upper = trimmed.to_uppercase();

    let (number, multiplier) = [("GB", GB), ("G", GB), ("MB", MB), ("M", MB), ("KB", KB), ("K", KB)]
        .iter()
        .find_map(|(suffix, mult)| {
            upper
                .strip_suffix(suffix)
                .map(|n| (n.trim().to_string(), *mult))
        })
        .unwrap_or_else(|| (upper.clone(), 1));

    number
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| SizeParseError(s.to_string()))
}

/// Formats a byte count with the largest whole binary unit.
pub fn format_size(bytes: usize) -> String {
    if bytes >= GB && bytes % GB == 0 {
        format!("{}GB", bytes / GB)
    } else if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        format!("{}B", bytes)
    }
}
