//! Subcommands: sign, verify, encrypt and decrypt a single message.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use message::{CipherMode, Encryptor, KeyDerivation, MetadataOption, Verifier};
use serde_json::Value;

use crate::config::Config;

/// Length of the derived MAC secret, as Rails' key generator defaults to.
const SIGNING_KEY_LEN: usize = 64;

/// Rails-compatible signed and encrypted messages.
///
/// Reads one value from stdin and writes the result to stdout. Keys are
/// derived from `SECRET_KEY_BASE`; `CIPHER`, `MAC_DIGEST`, `URL_SAFE` and
/// friends select the message format.
#[derive(Parser, Debug)]
#[command(name = "messagectl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign a JSON value read from stdin
    Generate(ProduceArgs),
    /// Verify a signed message read from stdin and print its JSON payload
    Verify(ConsumeArgs),
    /// Encrypt a JSON value read from stdin
    Encrypt(ProduceArgs),
    /// Decrypt a message read from stdin and print its JSON payload
    Decrypt(ConsumeArgs),
}

#[derive(Args, Debug)]
pub struct ProduceArgs {
    /// Purpose tag embedded in the message
    #[arg(long, default_value = "")]
    pub purpose: String,

    /// Expire the message this many seconds from now
    #[arg(long)]
    pub expires_in: Option<i64>,

    /// Expire the message at this RFC 3339 instant (wins over --expires-in)
    #[arg(long)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct ConsumeArgs {
    /// Purpose the message must carry
    #[arg(long, default_value = "")]
    pub purpose: String,
}

impl ProduceArgs {
    fn options(&self) -> Result<MetadataOption> {
        let mut opt = MetadataOption::new().with_purpose(self.purpose.as_str());
        if let Some(secs) = self.expires_in {
            let within = Duration::try_seconds(secs).context("--expires-in is out of range")?;
            opt = opt.with_expires_in(within);
        }
        if let Some(at) = self.expires_at {
            opt = opt.with_expires_at(at);
        }
        Ok(opt)
    }
}

impl ConsumeArgs {
    fn options(&self) -> MetadataOption {
        MetadataOption::new().with_purpose(self.purpose.as_str())
    }
}

/// The verifier and encryptor built from one [`Config`].
#[derive(Debug)]
pub struct Messages {
    verifier: Verifier,
    encryptor: Encryptor,
}

impl Messages {
    /// Derive every secret through `keys` and build both producers.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not describe a usable cipher or digest.
    pub fn from_config<K: KeyDerivation>(cfg: &Config, keys: &K) -> Result<Self> {
        let codec = cfg.codec();
        let mac_digest = cfg.mac_digest()?;
        let cipher = cfg.cipher()?;

        let signing_key = keys.generate_key(cfg.signing_salt.as_bytes(), SIGNING_KEY_LEN);
        let encryption_key = keys.generate_key(cfg.encryption_salt.as_bytes(), cipher.key_len);

        let verifier = Verifier::new(codec, mac_digest, signing_key.clone())
            .context("failed to build verifier")?;
        let encryptor = match cipher.mode {
            CipherMode::Gcm => Encryptor::aead(codec, encryption_key),
            CipherMode::Cbc => Encryptor::cbc(codec, encryption_key, mac_digest, Some(signing_key)),
        }
        .with_context(|| format!("failed to build {cipher} encryptor"))?;

        Ok(Self {
            verifier,
            encryptor,
        })
    }

    /// Run `command` against `input` and return what should be printed.
    ///
    /// # Errors
    ///
    /// Message failures are returned as [`message::MessageError`] inside the
    /// `anyhow` chain so callers can report their code.
    pub fn run(&self, command: &Command, input: &str) -> Result<String> {
        match command {
            Command::Generate(args) => {
                let value = parse_json(input)?;
                Ok(self.verifier.generate(&value, &args.options()?)?)
            }
            Command::Encrypt(args) => {
                let value = parse_json(input)?;
                Ok(self.encryptor.encrypt(&value, &args.options()?)?)
            }
            Command::Verify(args) => {
                let value: Value = self.verifier.verify(input.trim(), &args.options())?;
                Ok(serde_json::to_string(&value)?)
            }
            Command::Decrypt(args) => {
                let value: Value = self.encryptor.decrypt(input.trim(), &args.options())?;
                Ok(serde_json::to_string(&value)?)
            }
        }
    }
}

fn parse_json(input: &str) -> Result<Value> {
    serde_json::from_str(input.trim()).context("stdin is not a JSON value")
}
