//! PKCS#7 padding for the CBC scheme.

use common::MessageError;

/// Pad `data` to a multiple of `block_len`.
///
/// Each pad byte holds the pad length. Block-aligned input gains a full block.
pub fn pad(data: &[u8], block_len: usize) -> Vec<u8> {
    let pad = block_len - data.len() % block_len;
    let mut padded = Vec::with_capacity(data.len() + pad);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad, pad as u8);
    padded
}

/// Strip padding added by [`pad`].
///
/// # Errors
///
/// Returns [`MessageError::InvalidMessage`] unless `1 <= pad <= block_len` and
/// `pad <= data.len()`.
pub fn unpad(data: &[u8], block_len: usize) -> Result<&[u8], MessageError> {
    let Some(&last) = data.last() else {
        return Err(MessageError::InvalidMessage);
    };
    let pad = usize::from(last);
    if pad == 0 || pad > block_len || pad > data.len() {
        return Err(MessageError::InvalidMessage);
    }
    Ok(&data[..data.len() - pad])
}
