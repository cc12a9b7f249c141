use std::path::Path;

pub fn wide_string(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}

pub fn wide_path(path: &Path) -> Vec<u16> {
    wide_string(&path.to_string_lossy())
}

/// Reads a NUL-terminated UTF-16 buffer, stopping at `buffer.len()` when no
/// terminator is present.
pub fn string_from_wide(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}
