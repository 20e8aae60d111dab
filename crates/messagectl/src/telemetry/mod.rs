//! Structured logging for `messagectl`.
//!
//! # Telemetry invariants
//!
//! - Logs go to stderr; stdout carries only command output.
//! - **No payloads or key material** appear in any log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), overridden by `RUST_LOG`.

pub mod init;

pub use init::init_telemetry;
