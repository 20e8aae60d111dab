//! Byte-level encoding and metadata-envelope (de)serialisation.
//!
//! A [`Codec`] is a pair of construction-time flags:
//!
//! - `url_safe` picks the base64 dialect used when *producing* messages.
//!   Decoding always accepts both dialects, so messages issued before a
//!   dialect switch keep verifying.
//! - `legacy_metadata` picks where the payload goes inside the envelope
//!   (`message` as base64 JSON, or `data` as raw JSON). Decoding accepts both.

pub mod encoding;
mod envelope;

pub use encoding::{decode, encode, encoded_len};

use common::MessageError;

/// Stateless encoder shared by [`Verifier`](crate::Verifier) and
/// [`Encryptor`](crate::Encryptor).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Codec {
    url_safe: bool,
    legacy_metadata: bool,
}

impl Codec {
    pub fn new(url_safe: bool, legacy_metadata: bool) -> Self {
        Self {
            url_safe,
            legacy_metadata,
        }
    }

    pub fn url_safe(&self) -> bool {
        self.url_safe
    }

    pub fn legacy_metadata(&self) -> bool {
        self.legacy_metadata
    }

    /// Encode in this codec's dialect.
    pub fn encode(&self, bytes: &[u8]) -> String {
        encode(bytes, self.url_safe)
    }

    /// Decode in this codec's dialect, retrying with the other dialect on failure.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidEncoding`] only if both dialects reject `text`.
    pub fn decode(&self, text: &str) -> Result<Vec<u8>, MessageError> {
        decode(text, self.url_safe).or_else(|_| decode(text, !self.url_safe))
    }
}
