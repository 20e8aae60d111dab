//! Tamper-evident and encrypted message envelopes.
//!
//! Two producers share one [`Codec`]:
//!
//! - [`Verifier`] signs a serialised value with HMAC. The payload stays readable.
//! - [`Encryptor`] encrypts it with AES-GCM, or AES-CBC under an outer HMAC.
//!
//! Both wrap the value in a `{"_rails": {...}}` envelope carrying optional
//! expiry and purpose, and both are byte-compatible with Rails'
//! `MessageVerifier` / `MessageEncryptor`. Keys are typically derived from a
//! shared secret with [`KeyGenerator`].

pub mod codec;
pub mod digest;
pub mod encryptor;
pub mod keygen;
pub mod secret;
pub mod verifier;

pub use codec::Codec;
pub use common::{MessageError, MetadataOption};
pub use digest::Digest;
pub use encryptor::{CipherMode, CipherName, Encryptor};
pub use keygen::{derive, CachingKeyGenerator, KeyDerivation, KeyGenerator};
pub use secret::SecretBytes;
pub use verifier::Verifier;

/// Separator between the parts of a sealed message.
pub const SEPARATOR: &str = "--";
