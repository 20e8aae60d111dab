//! Envelope wire types wrapped around every signed or encrypted payload.
//!
//! The JSON shape is fixed for compatibility with tokens issued by other
//! implementations of the same format:
//!
//! ```text
//! {"_rails": {"data"?: <json>, "message"?: <base64 json>, "exp"?: <iso8601>, "pur"?: <string>}}
//! ```
//!
//! Unset fields are omitted rather than written as `null`. On input, `null`
//! is accepted for every field (legacy producers emit `"exp": null`).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::MessageError;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Top-level container holding exactly one [`Metadata`] record under `_rails`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "_rails")]
    pub rails: Metadata,
}

/// Payload plus optional expiry and purpose.
///
/// Exactly one of `data` (modern) or `message` (legacy) is populated by a
/// producer; a consumer accepts either.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Raw JSON payload (modern layout). An explicit `null` payload is kept as `Some`.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub data: Option<Box<RawValue>>,

    /// Standard-base64 of the JSON payload (legacy layout).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Absolute expiry, UTC.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "expiry")]
    pub exp: Option<DateTime<Utc>>,

    /// Purpose tag, compared by exact match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pur: Option<String>,
}

impl Metadata {
    /// Returns `true` when an expiry is set and lies at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| exp <= now)
    }

    /// Exact purpose match. An absent purpose equals the empty string.
    pub fn purpose_matches(&self, expected: &str) -> bool {
        self.pur.as_deref().unwrap_or("") == expected
    }
}

// ---------------------------------------------------------------------------
// Caller options
// ---------------------------------------------------------------------------

/// Caller-supplied expiry and purpose for a single produce or consume call.
///
/// When both `expires_at` and `expires_in` are set, `expires_at` wins.
/// An empty `purpose` means "no purpose".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataOption {
    pub expires_at: Option<DateTime<Utc>>,
    pub expires_in: Option<Duration>,
    pub purpose: String,
}

impl MetadataOption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    pub fn with_expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn with_expires_in(mut self, within: Duration) -> Self {
        self.expires_in = Some(within);
        self
    }

    /// Resolve the absolute expiry relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidExpiry`] if `now + expires_in` overflows or the
    /// expiry lies outside years 0000 to 9999, which the envelope cannot carry.
    pub fn resolve_expiry(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, MessageError> {
        let at = match (self.expires_at, self.expires_in) {
            (Some(at), _) => at,
            (None, Some(within)) => now
                .checked_add_signed(within)
                .ok_or(MessageError::InvalidExpiry)?,
            (None, None) => return Ok(None),
        };
        if !expiry::in_range(&at) {
            return Err(MessageError::InvalidExpiry);
        }
        Ok(Some(at))
    }

    /// Purpose as it is written into the envelope.
    pub fn envelope_purpose(&self) -> Option<String> {
        (!self.purpose.is_empty()).then(|| self.purpose.clone())
    }
}

fn present<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Box<RawValue>>, D::Error> {
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Expiry encoding
// ---------------------------------------------------------------------------

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g.
/// `2007-01-01T00:00:00.000Z`.
mod expiry {
    use chrono::{DateTime, Datelike, SecondsFormat, Utc};
    use serde::{de, ser, Deserialize, Deserializer, Serializer};

    /// Four-digit years only; RFC 3339 has no form for the rest.
    pub(super) fn in_range(at: &DateTime<Utc>) -> bool {
        (0..=9999).contains(&at.year())
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(at) if !in_range(at) => Err(ser::Error::custom("expiry year out of range")),
            Some(at) => serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|at| at.with_timezone(&Utc))
                .map_err(de::Error::custom)
        })
        .transpose()
    }
}
