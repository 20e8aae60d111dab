//! Common types, wire definitions, and errors shared across the message crates.

pub mod error;
pub mod protocol;

pub use error::MessageError;
pub use protocol::{Envelope, Metadata, MetadataOption};
