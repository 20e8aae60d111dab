//! Memoised key derivation.
//!
//! PBKDF2 is deliberately slow; a process that builds several verifiers and
//! encryptors from the same secret derives each `(salt, key_len)` pair once.
//! Reads are lock-free via `arc-swap`.

use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;

use super::KeyDerivation;
use crate::secret::SecretBytes;

type KeyMap = HashMap<(Vec<u8>, usize), SecretBytes>;

/// Wraps a [`KeyDerivation`] and caches every key it produces.
#[derive(Debug)]
pub struct CachingKeyGenerator<D> {
    inner: D,
    keys: ArcSwap<KeyMap>,
}

impl<D: KeyDerivation> CachingKeyGenerator<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            keys: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.keys.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.load().is_empty()
    }
}

impl<D: KeyDerivation> KeyDerivation for CachingKeyGenerator<D> {
    fn generate_key(&self, salt: &[u8], key_len: usize) -> SecretBytes {
        let slot = (salt.to_vec(), key_len);
        if let Some(key) = self.keys.load().get(&slot) {
            return key.clone();
        }

        let key = self.inner.generate_key(salt, key_len);
        self.keys.rcu(|current| {
            let mut next = KeyMap::clone(current);
            next.entry(slot.clone()).or_insert_with(|| key.clone());
            Arc::new(next)
        });
        key
    }
}
