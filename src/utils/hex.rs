use crate::core::error::UnicodeError;

/// Derive the `#rrggbb` display color from raw channel values.
///
/// Channels are stored unconstrained, so each one is clamped to 0..=255 here.
pub fn rgb_to_hex(red: i64, green: i64, blue: i64) -> String {
    let channels = [clamp_channel(red), clamp_channel(green), clamp_channel(blue)];
    format!("#{}", hex::encode(channels))
}

fn clamp_channel(value: i64) -> u8 {
    value.clamp(0, 255) as u8
}

/// Parse a buffer of hex digits (optionally `0x`-prefixed) into a character
pub fn parse_code_point(digits: &str) -> Result<char, UnicodeError> {
    let trimmed = digits.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let value = u32::from_str_radix(trimmed, 16)
        .map_err(|_| UnicodeError::NotHex(digits.to_string()))?;

    char::from_u32(value).ok_or(UnicodeError::InvalidCodePoint(value))
}
