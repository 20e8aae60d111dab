//! PBKDF2 key derivation from a shared secret.
//!
//! One secret (`secret_key_base`) feeds every verifier and encryptor; each
//! consumer asks for a key under its own salt and length.

mod cache;

pub use cache::CachingKeyGenerator;

use std::num::NonZeroU32;

use common::MessageError;

use crate::digest::Digest;
use crate::secret::SecretBytes;

/// PBKDF2-HMAC of `password` and `salt`, `key_len` bytes long.
pub fn derive(
    password: &[u8],
    salt: &[u8],
    iterations: NonZeroU32,
    key_len: usize,
    digest: Digest,
) -> Vec<u8> {
    let mut key = vec![0u8; key_len];
    digest.pbkdf2(password, salt, iterations.get(), &mut key);
    key
}

/// Source of derived keys.
#[cfg_attr(test, mockall::automock)]
pub trait KeyDerivation {
    fn generate_key(&self, salt: &[u8], key_len: usize) -> SecretBytes;
}

/// Derives keys from a fixed password with PBKDF2.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    password: SecretBytes,
    iterations: NonZeroU32,
    digest: Digest,
}

impl KeyGenerator {
    /// Rails' default iteration count (2^16).
    pub const DEFAULT_ITERATIONS: NonZeroU32 = match NonZeroU32::new(1 << 16) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Rails' default PBKDF2 hash.
    pub const DEFAULT_DIGEST: Digest = Digest::Sha1;

    /// # Errors
    ///
    /// Returns [`MessageError::EmptySecret`] if `password` is empty.
    pub fn new(
        password: impl Into<SecretBytes>,
        iterations: NonZeroU32,
        digest: Digest,
    ) -> Result<Self, MessageError> {
        let password = password.into();
        if password.is_empty() {
            return Err(MessageError::EmptySecret);
        }
        Ok(Self {
            password,
            iterations,
            digest,
        })
    }

    pub fn iterations(&self) -> NonZeroU32 {
        self.iterations
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }
}

impl KeyDerivation for KeyGenerator {
    fn generate_key(&self, salt: &[u8], key_len: usize) -> SecretBytes {
        SecretBytes::new(derive(
            self.password.expose(),
            salt,
            self.iterations,
            key_len,
            self.digest,
        ))
    }
}
