//! Base64 in the two dialects used on the wire.
//!
//! - standard alphabet, `=` padded
//! - url-safe alphabet, unpadded

use base64::{
    engine::general_purpose::{GeneralPurpose, STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use common::MessageError;

fn engine(url_safe: bool) -> &'static GeneralPurpose {
    if url_safe {
        &URL_SAFE_NO_PAD
    } else {
        &STANDARD
    }
}

/// Encode `bytes` in the selected dialect.
pub fn encode(bytes: &[u8], url_safe: bool) -> String {
    engine(url_safe).encode(bytes)
}

/// Strictly decode `text` in the selected dialect only.
///
/// # Errors
///
/// Returns [`MessageError::InvalidEncoding`] if `text` is not canonical base64
/// for that dialect.
pub fn decode(text: &str, url_safe: bool) -> Result<Vec<u8>, MessageError> {
    engine(url_safe)
        .decode(text)
        .map_err(|_| MessageError::InvalidEncoding)
}

/// Length of the encoding of `byte_len` bytes in the selected dialect.
pub fn encoded_len(byte_len: usize, url_safe: bool) -> usize {
    if url_safe {
        (byte_len * 4 + 2) / 3
    } else {
        byte_len.div_ceil(3) * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASES: &[(&str, &str, &str)] = &[
        ("1", "MQ==", "MQ"),
        ("12", "MTI=", "MTI"),
        ("123", "MTIz", "MTIz"),
        ("1234", "MTIzNA==", "MTIzNA"),
        ("12345", "MTIzNDU=", "MTIzNDU"),
        ("123456", "MTIzNDU2", "MTIzNDU2"),
        ("1234567", "MTIzNDU2Nw==", "MTIzNDU2Nw"),
        ("ÿÿÿ", "w7/Dv8O/", "w7_Dv8O_"),
        (">?>", "Pj8+", "Pj8-"),
    ];

    #[test]
    fn standard_alphabet_is_padded() {
        for (src, std, _) in CASES {
            assert_eq!(encode(src.as_bytes(), false), *std, "input {src:?}");
        }
    }

    #[test]
    fn url_safe_alphabet_is_unpadded() {
        for (src, _, url) in CASES {
            assert_eq!(encode(src.as_bytes(), true), *url, "input {src:?}");
        }
    }

    #[test]
    fn strict_decode_rejects_other_dialect() {
        assert!(decode("Pj8-", false).is_err());
        assert!(decode("Pj8+", true).is_err());
        assert!(decode("MQ==", true).is_err());
        assert!(decode("MQ", false).is_err());
    }

    #[test]
    fn encoded_len_matches_encoder() {
        for n in 0..40 {
            let bytes = vec![0xA5u8; n];
            assert_eq!(encode(&bytes, false).len(), encoded_len(n, false));
            assert_eq!(encode(&bytes, true).len(), encoded_len(n, true));
        }
    }
}
