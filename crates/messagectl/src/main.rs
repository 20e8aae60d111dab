//! `messagectl`: sign, verify, encrypt and decrypt Rails-compatible messages.
//!
//! Startup sequence:
//! 1. Parse the command line.
//! 2. Load and validate [`Config`] from environment variables.
//! 3. Initialise tracing (JSON on stderr).
//! 4. Derive keys from `SECRET_KEY_BASE` and build the verifier and encryptor.
//! 5. Read stdin, run the subcommand, write the result to stdout.

mod commands;
mod config;
mod telemetry;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use message::{CachingKeyGenerator, KeyGenerator, MessageError};
use tracing::{error, info};

use commands::{Cli, Messages};
use config::Config;

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Command line
    // -----------------------------------------------------------------------
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        cipher = %cfg.cipher,
        url_safe = cfg.url_safe,
        "messagectl starting"
    );

    // -----------------------------------------------------------------------
    // 4. Keys
    // -----------------------------------------------------------------------
    let keys = CachingKeyGenerator::new(KeyGenerator::new(
        cfg.secret_key_base.as_bytes(),
        cfg.iterations()?,
        cfg.key_digest()?,
    )?);
    let messages = Messages::from_config(&cfg, &keys)?;

    // -----------------------------------------------------------------------
    // 5. Run
    // -----------------------------------------------------------------------
    let input = io::read_to_string(io::stdin()).context("failed to read stdin")?;
    let output = messages.run(&cli.command, &input).inspect_err(|e| {
        let code = e.downcast_ref::<MessageError>().map(MessageError::code);
        error!(code = code.unwrap_or("usage"), "command failed");
    })?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}").context("failed to write stdout")?;
    Ok(())
}
