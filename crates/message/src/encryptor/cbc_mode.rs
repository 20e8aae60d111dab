//! AES-CBC with PKCS#7 padding. Provides no integrity on its own; the
//! encryptor wraps its output in a [`Verifier`](crate::Verifier) MAC.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use common::MessageError;

use super::{padding, KeySize};

/// AES block length, which is also the IV length.
pub const BLOCK_LEN: usize = 16;

/// Pad and encrypt `plaintext`.
pub(super) fn encrypt(
    key: &[u8],
    iv: &[u8; BLOCK_LEN],
    plaintext: &[u8],
) -> Result<Vec<u8>, MessageError> {
    let mut buf = padding::pad(plaintext, BLOCK_LEN);
    match KeySize::of(key.len())? {
        KeySize::Aes128 => encrypt_blocks::<cbc::Encryptor<Aes128>>(key, iv, &mut buf)?,
        KeySize::Aes192 => encrypt_blocks::<cbc::Encryptor<Aes192>>(key, iv, &mut buf)?,
        KeySize::Aes256 => encrypt_blocks::<cbc::Encryptor<Aes256>>(key, iv, &mut buf)?,
    }
    Ok(buf)
}

/// Decrypt `ciphertext` and strip its padding.
pub(super) fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, MessageError> {
    if iv.len() != BLOCK_LEN || ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(MessageError::InvalidMessage);
    }
    let mut buf = ciphertext.to_vec();
    match KeySize::of(key.len())? {
        KeySize::Aes128 => decrypt_blocks::<cbc::Decryptor<Aes128>>(key, iv, &mut buf)?,
        KeySize::Aes192 => decrypt_blocks::<cbc::Decryptor<Aes192>>(key, iv, &mut buf)?,
        KeySize::Aes256 => decrypt_blocks::<cbc::Decryptor<Aes256>>(key, iv, &mut buf)?,
    }
    let len = padding::unpad(&buf, BLOCK_LEN)?.len();
    buf.truncate(len);
    Ok(buf)
}

fn encrypt_blocks<C: BlockEncryptMut + KeyIvInit>(
    key: &[u8],
    iv: &[u8],
    buf: &mut [u8],
) -> Result<(), MessageError> {
    let len = buf.len();
    C::new_from_slices(key, iv)
        .map_err(|_| MessageError::InvalidMessage)?
        .encrypt_padded_mut::<NoPadding>(buf, len)
        .map_err(|_| MessageError::InvalidMessage)?;
    Ok(())
}

fn decrypt_blocks<C: BlockDecryptMut + KeyIvInit>(
    key: &[u8],
    iv: &[u8],
    buf: &mut [u8],
) -> Result<(), MessageError> {
    C::new_from_slices(key, iv)
        .map_err(|_| MessageError::InvalidMessage)?
        .decrypt_padded_mut::<NoPadding>(buf)
        .map_err(|_| MessageError::InvalidMessage)?;
    Ok(())
}
