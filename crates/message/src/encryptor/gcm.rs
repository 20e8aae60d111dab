//! AES-GCM sealing with a 96-bit nonce and a 16-byte tag.

use aes::Aes192;
use aes_gcm::{
    aead::{consts::U12, Aead, KeyInit, Nonce},
    Aes128Gcm, Aes256Gcm, AesGcm,
};
use common::MessageError;

use super::KeySize;

/// Byte length of a GCM nonce.
pub const NONCE_LEN: usize = 12;

/// Byte length of a GCM authentication tag.
pub const TAG_LEN: usize = 16;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Encrypt and authenticate `plaintext`, returning `(ciphertext, tag)`.
pub(super) fn seal(
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), MessageError> {
    let mut sealed = match KeySize::of(key.len())? {
        KeySize::Aes128 => encrypt::<Aes128Gcm>(key, nonce, plaintext)?,
        KeySize::Aes192 => encrypt::<Aes192Gcm>(key, nonce, plaintext)?,
        KeySize::Aes256 => encrypt::<Aes256Gcm>(key, nonce, plaintext)?,
    };
    let tag = sealed.split_off(sealed.len() - TAG_LEN);
    Ok((sealed, tag))
}

/// Verify `tag` and decrypt `ciphertext`.
pub(super) fn open(
    key: &[u8],
    ciphertext: &[u8],
    nonce: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, MessageError> {
    if nonce.len() != NONCE_LEN || tag.len() != TAG_LEN {
        return Err(MessageError::InvalidMessage);
    }
    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    match KeySize::of(key.len())? {
        KeySize::Aes128 => decrypt::<Aes128Gcm>(key, nonce, &combined),
        KeySize::Aes192 => decrypt::<Aes192Gcm>(key, nonce, &combined),
        KeySize::Aes256 => decrypt::<Aes256Gcm>(key, nonce, &combined),
    }
}

fn encrypt<A: Aead + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, MessageError> {
    A::new_from_slice(key)
        .map_err(|_| MessageError::InvalidMessage)?
        .encrypt(Nonce::<A>::from_slice(nonce), plaintext)
        .map_err(|_| MessageError::InvalidMessage)
}

fn decrypt<A: Aead + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    combined: &[u8],
) -> Result<Vec<u8>, MessageError> {
    A::new_from_slice(key)
        .map_err(|_| MessageError::InvalidMessage)?
        .decrypt(Nonce::<A>::from_slice(nonce), combined)
        .map_err(|_| MessageError::InvalidMessage)
}
