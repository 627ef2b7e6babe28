//! Hex rendering for byte ranges.

use std::fmt::Write;

/// Render bytes as two lowercase hex digits each, separated by single spaces.
///
/// ```
/// assert_eq!(protolens_core::hex::to_hex(&[0x08, 0x96, 0x01]), "08 96 01");
/// assert_eq!(protolens_core::hex::to_hex(&[]), "");
/// ```
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().saturating_mul(3));
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // Writing into a String cannot fail
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
