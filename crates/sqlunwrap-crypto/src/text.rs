//! UTF-16 decoding of recovered module text
//!
//! Object bodies are stored as UTF-16LE. A leading byte-order mark is
//! consumed; a big-endian mark (`FE FF`) switches the rest of the buffer to
//! big-endian.

use sqlunwrap_core::DecodeFailure;

const BOM_LE: [u8; 2] = [0xFF, 0xFE];
const BOM_BE: [u8; 2] = [0xFE, 0xFF];

/// How to treat unpaired surrogates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Fail on the first unpaired surrogate
    #[default]
    Strict,
    /// Substitute U+FFFD
    Lossy,
}

/// Decode a UTF-16 buffer to a `String`.
///
/// Odd lengths are rejected in every mode: a trailing half code unit is
/// never silently dropped.
pub fn decode_utf16(bytes: &[u8], mode: DecodeMode) -> Result<String, DecodeFailure> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeFailure::OddLength(bytes.len()));
    }

    let (body, big_endian, skipped) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, false, BOM_LE.len()),
        [0xFE, 0xFF, rest @ ..] => (rest, true, BOM_BE.len()),
        _ => (bytes, false, 0),
    };

    let units = body.chunks_exact(2).map(|pair| {
        let pair = [pair[0], pair[1]];
        if big_endian {
            u16::from_be_bytes(pair)
        } else {
            u16::from_le_bytes(pair)
        }
    });

    let mut out = String::with_capacity(body.len() / 2);
    let mut offset = skipped;
    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(c) => {
                offset += c.len_utf16() * 2;
                out.push(c);
            }
            Err(_) if mode == DecodeMode::Lossy => {
                offset += 2;
                out.push(char::REPLACEMENT_CHARACTER);
            }
            Err(_) => return Err(DecodeFailure::UnpairedSurrogate { offset }),
        }
    }
    Ok(out)
}

/// Encode text as UTF-16LE, optionally prefixed with a byte-order mark.
pub fn encode_utf16le(text: &str, with_bom: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2 + 2);
    if with_bom {
        out.extend_from_slice(&BOM_LE);
    }
    out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
    out
}
