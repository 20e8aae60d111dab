//! Configuration loading and validation for `messagectl`.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::num::NonZeroU32;

use anyhow::{Context, Result};
use message::{CipherName, Codec, Digest};
use serde::Deserialize;

/// Validated `messagectl` configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Shared secret every key is derived from. **Required.**
    pub secret_key_base: String,

    /// Salt for the verifier secret and the CBC MAC secret.
    #[serde(default = "default_signing_salt")]
    pub signing_salt: String,

    /// Salt for the encryption key.
    #[serde(default = "default_encryption_salt")]
    pub encryption_salt: String,

    /// PBKDF2 iteration count.
    #[serde(default = "default_key_iterations")]
    pub key_iterations: u32,

    /// PBKDF2 HMAC hash (`sha1`, `sha256`, `sha384`, `sha512`).
    #[serde(default = "default_digest")]
    pub key_digest: String,

    /// Hash used for message MACs.
    #[serde(default = "default_digest")]
    pub mac_digest: String,

    /// Cipher used by `encrypt` / `decrypt`, e.g. `aes-256-gcm`.
    #[serde(default = "default_cipher")]
    pub cipher: String,

    /// Produce url-safe, unpadded base64.
    #[serde(default)]
    pub url_safe: bool,

    /// Put the payload in the legacy `message` envelope field.
    #[serde(default)]
    pub legacy_metadata: bool,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_signing_salt() -> String {
    "signed cookie".into()
}
fn default_encryption_salt() -> String {
    "authenticated encrypted cookie".into()
}
fn default_key_iterations() -> u32 {
    1000
}
fn default_digest() -> String {
    "sha256".into()
}
fn default_cipher() -> String {
    "aes-256-gcm".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.secret_key_base, "SECRET_KEY_BASE")?;
        ensure_non_empty(&self.signing_salt, "SIGNING_SALT")?;
        ensure_non_empty(&self.encryption_salt, "ENCRYPTION_SALT")?;
        self.iterations()?;
        self.key_digest()?;
        self.mac_digest()?;
        self.cipher()?;
        Ok(())
    }

    pub fn iterations(&self) -> Result<NonZeroU32> {
        NonZeroU32::new(self.key_iterations).context("KEY_ITERATIONS must be > 0")
    }

    pub fn key_digest(&self) -> Result<Digest> {
        self.key_digest.parse().context("KEY_DIGEST is invalid")
    }

    pub fn mac_digest(&self) -> Result<Digest> {
        self.mac_digest.parse().context("MAC_DIGEST is invalid")
    }

    pub fn cipher(&self) -> Result<CipherName> {
        self.cipher.parse().context("CIPHER is invalid")
    }

    pub fn codec(&self) -> Codec {
        Codec::new(self.url_safe, self.legacy_metadata)
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use message::CipherMode;

    pub(crate) fn config() -> Config {
        Config {
            secret_key_base: "4aa19bef10a27fd29e09058b10e8c279".into(),
            signing_salt: default_signing_salt(),
            encryption_salt: default_encryption_salt(),
            key_iterations: default_key_iterations(),
            key_digest: default_digest(),
            mac_digest: default_digest(),
            cipher: default_cipher(),
            url_safe: false,
            legacy_metadata: false,
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_signing_salt(), "signed cookie");
        assert_eq!(default_encryption_salt(), "authenticated encrypted cookie");
        assert_eq!(default_key_iterations(), 1000);
        assert_eq!(default_digest(), "sha256");
        assert_eq!(default_cipher(), "aes-256-gcm");
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn defaults_validate() {
        let cfg = config();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.key_digest().unwrap(), Digest::Sha256);
        assert_eq!(
            cfg.cipher().unwrap(),
            CipherName {
                mode: CipherMode::Gcm,
                key_len: 32
            }
        );
        assert_eq!(cfg.codec(), Codec::default());
    }

    #[test]
    fn validate_rejects_empty_secret_key_base() {
        let cfg = Config {
            secret_key_base: "  ".into(),
            ..config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_iterations() {
        let cfg = Config {
            key_iterations: 0,
            ..config()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_digest_and_cipher() {
        let cfg = Config {
            mac_digest: "md5".into(),
            ..config()
        };
        assert!(cfg.validate().is_err());

        let cfg = Config {
            cipher: "aes-256-ctr".into(),
            ..config()
        };
        assert!(cfg.validate().is_err());
    }
}
