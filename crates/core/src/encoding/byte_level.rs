//! Byte-level display mapping.
//!
//! Each byte `b` maps to the character `U+0100 + b`. The range U+0100..=U+01FF
//! holds no control, whitespace or surrogate code points, so any token,
//! including invalid UTF-8, becomes a printable string and maps back exactly.

/// First code point of the mapped range.
const BASE: u32 = 0x100;

/// Map one byte to its display character.
#[inline]
pub fn byte_to_char(byte: u8) -> char {
    // U+0100..=U+01FF are all valid scalar values.
    char::from_u32(BASE + byte as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Map a display character back to its byte.
#[inline]
pub fn char_to_byte(ch: char) -> Option<u8> {
    let offset = (ch as u32).checked_sub(BASE)?;
    u8::try_from(offset).ok()
}

/// Render raw bytes as a display string.
pub fn bytes_to_display(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| byte_to_char(b)).collect()
}

/// Parse a display string back into bytes.
///
/// Returns `None` if any character lies outside the mapped range.
pub fn display_to_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(char_to_byte).collect()
}
