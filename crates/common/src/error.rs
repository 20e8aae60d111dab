//! Error taxonomy shared by the codec, verifier, and encryptor.

use thiserror::Error;

/// Every failure a caller can observe when producing or consuming a message.
///
/// Variants are returned as-is and never retried. Whether a rejection is a
/// security event or an ordinary "token invalid" outcome is the caller's call.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Input is not valid base64 under either the standard or url-safe alphabet.
    #[error("invalid encoding")]
    InvalidEncoding,

    /// Separator missing, MAC is not hex, or MAC does not match.
    #[error("invalid signature")]
    InvalidSignature,

    /// Any encryptor-layer failure. Deliberately does not say which stage failed.
    #[error("invalid message")]
    InvalidMessage,

    /// The envelope carries an expiry at or before the current time.
    #[error("message expired")]
    Expired,

    /// The envelope purpose differs from the expected purpose.
    #[error("mismatched purpose")]
    MismatchedPurpose,

    /// Envelope parsed but carries no payload, or the legacy payload is not base64.
    #[error("invalid metadata")]
    InvalidMetadata,

    /// The caller's value could not be serialised to JSON.
    #[error("serialise payload: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The authenticated payload does not deserialise into the requested type.
    #[error("deserialise payload: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The encryption secret is not a valid AES key length.
    #[error("invalid key length: expected 16, 24 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// A MAC secret or key-derivation password was empty.
    #[error("secret must not be empty")]
    EmptySecret,

    /// The requested expiry overflows or falls outside years 0000 to 9999.
    #[error("expiry out of range")]
    InvalidExpiry,
}

impl MessageError {
    /// Short machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            MessageError::InvalidEncoding => "invalid_encoding",
            MessageError::InvalidSignature => "invalid_signature",
            MessageError::InvalidMessage => "invalid_message",
            MessageError::Expired => "expired",
            MessageError::MismatchedPurpose => "mismatched_purpose",
            MessageError::InvalidMetadata => "invalid_metadata",
            MessageError::Serialize(_) => "serialize",
            MessageError::Deserialize(_) => "deserialize",
            MessageError::InvalidKeyLength(_) => "invalid_key_length",
            MessageError::EmptySecret => "empty_secret",
            MessageError::InvalidExpiry => "invalid_expiry",
        }
    }

    /// Returns `true` for errors raised while authenticating or decoding a message,
    /// as opposed to misconfiguration or serialisation of the caller's own value.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            MessageError::Serialize(_)
                | MessageError::InvalidKeyLength(_)
                | MessageError::EmptySecret
                | MessageError::InvalidExpiry
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let json_err = || serde_json::from_str::<u8>("x").unwrap_err();
        let all = [
            MessageError::InvalidEncoding,
            MessageError::InvalidSignature,
            MessageError::InvalidMessage,
            MessageError::Expired,
            MessageError::MismatchedPurpose,
            MessageError::InvalidMetadata,
            MessageError::Serialize(json_err()),
            MessageError::Deserialize(json_err()),
            MessageError::InvalidKeyLength(7),
            MessageError::EmptySecret,
            MessageError::InvalidExpiry,
        ];
        let mut codes: Vec<_> = all.iter().map(MessageError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn rejection_classification() {
        assert!(MessageError::InvalidSignature.is_rejection());
        assert!(MessageError::Expired.is_rejection());
        assert!(!MessageError::EmptySecret.is_rejection());
        assert!(!MessageError::InvalidKeyLength(3).is_rejection());
        assert!(!MessageError::InvalidExpiry.is_rejection());
    }

    #[test]
    fn display_includes_key_length() {
        let e = MessageError::InvalidKeyLength(20);
        assert!(e.to_string().contains("20"));
    }
}
