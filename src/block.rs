//! IEEE 488.2 arbitrary block data, as returned by binary queries such as `:WAV:DATA?`.
//!
//! A definite-length block is `#<n><length as n decimal digits><payload>`. The indefinite form
//! `#0<payload>` runs to the end of the message, which is then terminated by a newline.

use crate::{Error, Result};

/// Strips the block header from a complete response message and returns the payload.
///
/// Anything before the first `#` is skipped, and so is anything after a definite-length
/// payload (usually the `\n` terminator).
pub fn parse_ieee_block(message: &[u8]) -> Result<&[u8]> {
    let start = message.iter().position(|&byte| byte == b'#')
        .ok_or_else(|| Error::protocol("binary block header not found"))?;
    let header = &message[start + 1..];

    let digit_count = match header.first().copied() {
        Some(digit @ b'0'..=b'9') => (digit - b'0') as usize,
        Some(other) => return Err(Error::protocol(
            format!("invalid binary block length digit count {:#04x}", other))),
        None => return Err(Error::protocol("truncated binary block header")),
    };

    if digit_count == 0 {
        let payload = &header[1..];
        return Ok(payload.strip_suffix(b"\n").unwrap_or(payload))
    }

    let length_digits = header.get(1..1 + digit_count)
        .ok_or_else(|| Error::protocol("truncated binary block header"))?;
    let mut length = 0usize;
    for &digit in length_digits {
        if !digit.is_ascii_digit() {
            return Err(Error::protocol(
                format!("invalid binary block length {:?}", String::from_utf8_lossy(length_digits))))
        }
        length = length.checked_mul(10)
            .and_then(|length| length.checked_add((digit - b'0') as usize))
            .ok_or_else(|| Error::protocol("binary block length overflows"))?;
    }

    let payload = &header[1 + digit_count..];
    log::trace!("binary block: declared {} bytes, received {}", length, payload.len());
    payload.get(..length)
        .ok_or_else(|| Error::protocol(
            format!("binary block declares {} bytes but only {} were received", length, payload.len())))
}
