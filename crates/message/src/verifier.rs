//! Signed, unencrypted messages.
//!
//! # Format
//!
//! ```text
//! <base64(envelope)>--<hex(hmac(base64(envelope)))>
//! ```
//!
//! The MAC covers the *encoded* text, not the raw envelope bytes. The MAC is
//! checked in constant time before anything is decoded.

use common::{MessageError, MetadataOption};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::codec::Codec;
use crate::digest::Digest;
use crate::secret::SecretBytes;
use crate::SEPARATOR;

/// Produces and checks HMAC-signed messages.
///
/// Holds no mutable state; one instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct Verifier {
    codec: Codec,
    digest: Digest,
    secret: SecretBytes,
}

impl Verifier {
    /// # Errors
    ///
    /// Returns [`MessageError::EmptySecret`] if `secret` is empty.
    pub fn new(
        codec: Codec,
        digest: Digest,
        secret: impl Into<SecretBytes>,
    ) -> Result<Self, MessageError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(MessageError::EmptySecret);
        }
        Ok(Self {
            codec,
            digest,
            secret,
        })
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }

    /// Serialise `value` into an envelope and sign it.
    pub fn generate<T: Serialize + ?Sized>(
        &self,
        value: &T,
        opt: &MetadataOption,
    ) -> Result<String, MessageError> {
        let serialized = self.codec.serialize_with_metadata(value, opt)?;
        self.encode_and_sign(&serialized)
    }

    /// Check the MAC, then decode the payload and its metadata.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidSignature`] for a missing separator, malformed hex or
    /// a MAC mismatch; metadata errors from the codec are passed through.
    pub fn verify<T: DeserializeOwned>(
        &self,
        sealed: &str,
        opt: &MetadataOption,
    ) -> Result<T, MessageError> {
        let serialized = self.verify_and_decode(sealed)?;
        self.codec.deserialize_with_metadata(&serialized, opt)
    }

    /// Like [`verify`](Self::verify) but collapses every failure to `None`.
    pub fn verified<T: DeserializeOwned>(&self, sealed: &str, opt: &MetadataOption) -> Option<T> {
        self.verify(sealed, opt).ok()
    }

    /// Returns `true` if the MAC matches and the body decodes. Metadata is not inspected.
    pub fn valid_message(&self, sealed: &str) -> bool {
        self.verify_and_decode(sealed).is_ok()
    }

    /// MAC over already-encoded text.
    pub fn calculate_mac(&self, encoded: &[u8]) -> Result<Vec<u8>, MessageError> {
        self.digest.hmac(self.secret.expose(), encoded)
    }

    /// Encode `serialized` and append the hex MAC of the encoded text.
    pub(crate) fn encode_and_sign(&self, serialized: &[u8]) -> Result<String, MessageError> {
        let encoded = self.codec.encode(serialized);
        let mac = self.calculate_mac(encoded.as_bytes())?;
        Ok(format!("{encoded}{SEPARATOR}{}", hex::encode(mac)))
    }

    /// Check the MAC and return the decoded body.
    pub(crate) fn verify_and_decode(&self, sealed: &str) -> Result<Vec<u8>, MessageError> {
        // Hex never contains '-', so the last separator is the real one even when
        // url-safe base64 ends in '-'.
        let Some((encoded, hex_mac)) = sealed.rsplit_once(SEPARATOR) else {
            debug!("message rejected: missing separator");
            return Err(MessageError::InvalidSignature);
        };
        let Ok(mac) = hex::decode(hex_mac) else {
            debug!("message rejected: malformed mac");
            return Err(MessageError::InvalidSignature);
        };
        if !self
            .digest
            .verify_hmac(self.secret.expose(), encoded.as_bytes(), &mac)
        {
            debug!("message rejected: mac mismatch");
            return Err(MessageError::InvalidSignature);
        }
        self.codec.decode(encoded)
    }
}
