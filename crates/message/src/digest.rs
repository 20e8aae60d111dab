//! Hash functions available for HMAC and PBKDF2.
//!
//! The set is closed: callers pick a [`Digest`] at construction time and the
//! concrete `sha1` / `sha2` type is chosen by a `match`, never at runtime by name.

use std::{fmt, str::FromStr};

use common::MessageError;
use hmac::{digest::KeyInit, Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use thiserror::Error;

/// Hash used by a MAC or a key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Digest {
    Sha1,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

/// Returned by [`Digest::from_str`] for unsupported names.
#[derive(Debug, Error)]
#[error("unsupported digest: {0}")]
pub struct UnknownDigest(pub String);

impl Digest {
    /// Output length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            Digest::Sha1 => 20,
            Digest::Sha256 => 32,
            Digest::Sha384 => 48,
            Digest::Sha512 => 64,
        }
    }

    /// HMAC of `data` under `key`.
    pub fn hmac(self, key: &[u8], data: &[u8]) -> Result<Vec<u8>, MessageError> {
        Ok(match self {
            Digest::Sha1 => keyed::<Hmac<Sha1>>(key, data)?.finalize().into_bytes().to_vec(),
            Digest::Sha256 => keyed::<Hmac<Sha256>>(key, data)?.finalize().into_bytes().to_vec(),
            Digest::Sha384 => keyed::<Hmac<Sha384>>(key, data)?.finalize().into_bytes().to_vec(),
            Digest::Sha512 => keyed::<Hmac<Sha512>>(key, data)?.finalize().into_bytes().to_vec(),
        })
    }

    /// Constant-time check that `tag` is the HMAC of `data` under `key`.
    pub fn verify_hmac(self, key: &[u8], data: &[u8], tag: &[u8]) -> bool {
        match self {
            Digest::Sha1 => verify::<Hmac<Sha1>>(key, data, tag),
            Digest::Sha256 => verify::<Hmac<Sha256>>(key, data, tag),
            Digest::Sha384 => verify::<Hmac<Sha384>>(key, data, tag),
            Digest::Sha512 => verify::<Hmac<Sha512>>(key, data, tag),
        }
    }

    /// PBKDF2-HMAC filling `out` completely.
    pub fn pbkdf2(self, password: &[u8], salt: &[u8], iterations: u32, out: &mut [u8]) {
        match self {
            Digest::Sha1 => pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, iterations, out),
            Digest::Sha256 => pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, out),
            Digest::Sha384 => pbkdf2::pbkdf2_hmac::<Sha384>(password, salt, iterations, out),
            Digest::Sha512 => pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, iterations, out),
        }
    }
}

fn keyed<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Result<M, MessageError> {
    // HMAC accepts keys of any length; the error arm is unreachable in practice.
    let mut mac = <M as KeyInit>::new_from_slice(key).map_err(|_| MessageError::InvalidSignature)?;
    mac.update(data);
    Ok(mac)
}

fn verify<M: Mac + KeyInit>(key: &[u8], data: &[u8], tag: &[u8]) -> bool {
    keyed::<M>(key, data).is_ok_and(|mac| mac.verify_slice(tag).is_ok())
}

impl FromStr for Digest {
    type Err = UnknownDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(Digest::Sha1),
            "sha256" => Ok(Digest::Sha256),
            "sha384" => Ok(Digest::Sha384),
            "sha512" => Ok(Digest::Sha512),
            _ => Err(UnknownDigest(s.to_owned())),
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Digest::Sha1 => "sha1",
            Digest::Sha256 => "sha256",
            Digest::Sha384 => "sha384",
            Digest::Sha512 => "sha512",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4231 test case 2.
    const KEY: &[u8] = b"Jefe";
    const DATA: &[u8] = b"what do ya want for nothing?";

    #[test]
    fn hmac_sha256_known_answer() {
        let tag = Digest::Sha256.hmac(KEY, DATA).unwrap();
        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn output_len_matches_hmac_len() {
        for digest in [Digest::Sha1, Digest::Sha256, Digest::Sha384, Digest::Sha512] {
            assert_eq!(digest.hmac(KEY, DATA).unwrap().len(), digest.output_len());
        }
    }

    #[test]
    fn verify_accepts_own_tag_and_rejects_altered() {
        let mut tag = Digest::Sha512.hmac(KEY, DATA).unwrap();
        assert!(Digest::Sha512.verify_hmac(KEY, DATA, &tag));
        tag[0] ^= 0x01;
        assert!(!Digest::Sha512.verify_hmac(KEY, DATA, &tag));
    }

    #[test]
    fn verify_rejects_truncated_tag() {
        let tag = Digest::Sha256.hmac(KEY, DATA).unwrap();
        assert!(!Digest::Sha256.verify_hmac(KEY, DATA, &tag[..16]));
    }

    #[test]
    fn pbkdf2_sha1_known_answer() {
        // RFC 6070 test case 1.
        let mut out = [0u8; 20];
        Digest::Sha1.pbkdf2(b"password", b"salt", 1, &mut out);
        assert_eq!(hex::encode(out), "0c60c80f961f0e71f3a9b524af6012062fe037a6");
    }

    #[test]
    fn parses_common_spellings() {
        assert_eq!("sha1".parse::<Digest>().unwrap(), Digest::Sha1);
        assert_eq!("SHA256".parse::<Digest>().unwrap(), Digest::Sha256);
        assert_eq!("sha-384".parse::<Digest>().unwrap(), Digest::Sha384);
        assert_eq!("Sha512".parse::<Digest>().unwrap(), Digest::Sha512);
        assert!("md5".parse::<Digest>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for digest in [Digest::Sha1, Digest::Sha256, Digest::Sha384, Digest::Sha512] {
            assert_eq!(digest.to_string().parse::<Digest>().unwrap(), digest);
        }
    }
}
