//! Encrypted and authenticated messages.
//!
//! # Formats
//!
//! ```text
//! GCM:  <b64(ciphertext)>--<b64(nonce)>--<b64(tag)>
//! CBC:  <b64(b64(ciphertext)--b64(iv))>--<hex(hmac)>
//! ```
//!
//! In CBC mode the MAC is checked before any ciphertext reaches the cipher.
//! Every decrypt failure, whatever the stage, surfaces as
//! [`MessageError::InvalidMessage`].

mod cbc_mode;
mod gcm;
pub mod padding;

use std::{fmt, str::FromStr};

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use common::{MessageError, MetadataOption};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::codec::{encoded_len, Codec};
use crate::digest::Digest;
use crate::secret::SecretBytes;
use crate::verifier::Verifier;
use crate::SEPARATOR;

pub use cbc_mode::BLOCK_LEN;
pub use gcm::{NONCE_LEN, TAG_LEN};

// ---------------------------------------------------------------------------
// Cipher selection
// ---------------------------------------------------------------------------

/// Block cipher mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherMode {
    /// AES-GCM, authenticated by the cipher itself.
    Gcm,
    /// AES-CBC, authenticated by an outer HMAC.
    Cbc,
}

/// A named cipher such as `aes-256-gcm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CipherName {
    pub mode: CipherMode,
    /// Key length in bytes: 16, 24 or 32.
    pub key_len: usize,
}

/// Returned by [`CipherName::from_str`] for unsupported names.
#[derive(Debug, Error)]
#[error("unsupported cipher: {0} (expected aes-{{128,192,256}}-{{gcm,cbc}})")]
pub struct UnknownCipher(pub String);

impl FromStr for CipherName {
    type Err = UnknownCipher;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownCipher(s.to_owned());
        let lower = s.to_ascii_lowercase();
        let mut parts = lower.split('-');
        let (Some("aes"), Some(bits), Some(mode), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(unknown());
        };
        let key_len = match bits {
            "128" => 16,
            "192" => 24,
            "256" => 32,
            _ => return Err(unknown()),
        };
        let mode = match mode {
            "gcm" => CipherMode::Gcm,
            "cbc" => CipherMode::Cbc,
            _ => return Err(unknown()),
        };
        Ok(Self { mode, key_len })
    }
}

impl fmt::Display for CipherName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            CipherMode::Gcm => "gcm",
            CipherMode::Cbc => "cbc",
        };
        write!(f, "aes-{}-{mode}", self.key_len * 8)
    }
}

/// AES variant selected by key length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeySize {
    Aes128,
    Aes192,
    Aes256,
}

impl KeySize {
    fn of(len: usize) -> Result<Self, MessageError> {
        match len {
            16 => Ok(KeySize::Aes128),
            24 => Ok(KeySize::Aes192),
            32 => Ok(KeySize::Aes256),
            other => Err(MessageError::InvalidKeyLength(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Encryptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Scheme {
    Gcm,
    Cbc { verifier: Verifier },
}

/// Encrypts and authenticates serialised values.
///
/// Holds no mutable state; one instance can be shared across threads. The only
/// shared resource is the OS CSPRNG used for nonces and IVs.
#[derive(Debug, Clone)]
pub struct Encryptor {
    codec: Codec,
    key: SecretBytes,
    scheme: Scheme,
}

impl Encryptor {
    /// AES-GCM encryptor. The key length selects AES-128/192/256.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKeyLength`] unless `secret` is 16, 24 or 32 bytes.
    pub fn aead(codec: Codec, secret: impl Into<SecretBytes>) -> Result<Self, MessageError> {
        let key = secret.into();
        KeySize::of(key.len())?;
        Ok(Self {
            codec,
            key,
            scheme: Scheme::Gcm,
        })
    }

    /// AES-CBC encryptor with an outer HMAC.
    ///
    /// `mac_secret` defaults to the encryption secret when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidKeyLength`] unless `secret` is 16, 24 or 32 bytes,
    /// or [`MessageError::EmptySecret`] if `mac_secret` is empty.
    pub fn cbc(
        codec: Codec,
        secret: impl Into<SecretBytes>,
        mac_digest: Digest,
        mac_secret: Option<SecretBytes>,
    ) -> Result<Self, MessageError> {
        let key = secret.into();
        KeySize::of(key.len())?;
        let mac_secret = mac_secret.unwrap_or_else(|| key.clone());
        let verifier = Verifier::new(codec, mac_digest, mac_secret)?;
        Ok(Self {
            codec,
            key,
            scheme: Scheme::Cbc { verifier },
        })
    }

    pub fn mode(&self) -> CipherMode {
        match self.scheme {
            Scheme::Gcm => CipherMode::Gcm,
            Scheme::Cbc { .. } => CipherMode::Cbc,
        }
    }

    /// Serialise `value` into an envelope and encrypt it.
    pub fn encrypt<T: Serialize + ?Sized>(
        &self,
        value: &T,
        opt: &MetadataOption,
    ) -> Result<String, MessageError> {
        let serialized = self.codec.serialize_with_metadata(value, opt)?;
        match &self.scheme {
            Scheme::Gcm => {
                let nonce = random_bytes::<NONCE_LEN>();
                let (ciphertext, tag) = gcm::seal(self.key.expose(), &nonce, &serialized)?;
                Ok(self.join(&[ciphertext.as_slice(), nonce.as_slice(), tag.as_slice()]))
            }
            Scheme::Cbc { verifier } => {
                let iv = random_bytes::<BLOCK_LEN>();
                let ciphertext = cbc_mode::encrypt(self.key.expose(), &iv, &serialized)?;
                verifier.encode_and_sign(self.join(&[ciphertext.as_slice(), iv.as_slice()]).as_bytes())
            }
        }
    }

    /// Authenticate and decrypt `message`, then decode the payload and its metadata.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidMessage`] for any structural, decoding or authentication
    /// failure; metadata errors from the codec are passed through.
    pub fn decrypt<T: DeserializeOwned>(
        &self,
        message: &str,
        opt: &MetadataOption,
    ) -> Result<T, MessageError> {
        let serialized = self
            .open(message)
            .inspect_err(|_| debug!("message rejected: decryption failed"))?;
        self.codec.deserialize_with_metadata(&serialized, opt)
    }

    fn open(&self, message: &str) -> Result<Vec<u8>, MessageError> {
        match &self.scheme {
            Scheme::Gcm => {
                let [ciphertext, nonce, tag] = self.split_parts::<3>(message, &[NONCE_LEN, TAG_LEN])?;
                gcm::open(self.key.expose(), &ciphertext, &nonce, &tag)
            }
            Scheme::Cbc { verifier } => {
                let inner = verifier
                    .verify_and_decode(message)
                    .map_err(|_| MessageError::InvalidMessage)?;
                let inner = String::from_utf8(inner).map_err(|_| MessageError::InvalidMessage)?;
                let [ciphertext, iv] = self.split_parts::<2>(&inner, &[BLOCK_LEN])?;
                cbc_mode::decrypt(self.key.expose(), &iv, &ciphertext)
            }
        }
    }

    fn join(&self, parts: &[&[u8]]) -> String {
        parts
            .iter()
            .map(|part| self.codec.encode(part))
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    /// Decode a variable-length leading part followed by fixed-size trailing parts.
    ///
    /// Trailing parts are located by their encoded width from the end of the
    /// message, so a url-safe leading part may itself contain the separator.
    fn split_parts<const N: usize>(
        &self,
        message: &str,
        trailing: &[usize],
    ) -> Result<[Vec<u8>; N], MessageError> {
        let url_safe = self.codec.url_safe();
        [url_safe, !url_safe]
            .into_iter()
            .find_map(|dialect| {
                let texts = split_trailing(message, trailing, dialect)?;
                let parts = texts
                    .iter()
                    .map(|text| self.codec.decode(text).ok())
                    .collect::<Option<Vec<_>>>()?;
                let sizes_match = parts[1..]
                    .iter()
                    .zip(trailing)
                    .all(|(part, &len)| part.len() == len);
                sizes_match.then_some(parts)
            })
            .and_then(|parts| parts.try_into().ok())
            .ok_or(MessageError::InvalidMessage)
    }
}

/// Split off `trailing.len()` fixed-width parts from the end of `message`.
///
/// Returns the leading part followed by the trailing parts, in order, or `None`
/// if the widths or separators do not line up or the leading part is empty.
fn split_trailing<'a>(message: &'a str, trailing: &[usize], url_safe: bool) -> Option<Vec<&'a str>> {
    let mut rest = message;
    let mut parts = Vec::with_capacity(trailing.len() + 1);
    for &byte_len in trailing.iter().rev() {
        let cut = rest.len().checked_sub(encoded_len(byte_len, url_safe))?;
        parts.push(rest.get(cut..)?);
        rest = rest.get(..cut)?.strip_suffix(SEPARATOR)?;
    }
    if rest.is_empty() {
        return None;
    }
    parts.push(rest);
    parts.reverse();
    Some(parts)
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}
