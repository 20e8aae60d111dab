//! Wrapping payloads in an [`Envelope`] and unwrapping them again.

use chrono::{DateTime, Utc};
use common::{Envelope, Metadata, MessageError, MetadataOption};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::value::RawValue;
use tracing::debug;

use super::{encoding, Codec};

impl Codec {
    /// JSON-encode `value` and wrap it in an envelope carrying `opt`'s expiry and purpose.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Serialize`] if `value` cannot be encoded as JSON, or
    /// [`MessageError::InvalidExpiry`] if `opt`'s expiry cannot be written.
    pub fn serialize_with_metadata<T: Serialize + ?Sized>(
        &self,
        value: &T,
        opt: &MetadataOption,
    ) -> Result<Vec<u8>, MessageError> {
        self.serialize_with_metadata_at(value, opt, Utc::now())
    }

    /// [`serialize_with_metadata`](Self::serialize_with_metadata) with an explicit clock.
    pub fn serialize_with_metadata_at<T: Serialize + ?Sized>(
        &self,
        value: &T,
        opt: &MetadataOption,
        now: DateTime<Utc>,
    ) -> Result<Vec<u8>, MessageError> {
        let serialized = serde_json::to_string(value).map_err(MessageError::Serialize)?;

        let mut meta = Metadata {
            exp: opt.resolve_expiry(now)?,
            pur: opt.envelope_purpose(),
            ..Metadata::default()
        };
        if self.legacy_metadata {
            meta.message = Some(encoding::encode(serialized.as_bytes(), false));
        } else {
            meta.data = Some(RawValue::from_string(serialized).map_err(MessageError::Serialize)?);
        }

        serde_json::to_vec(&Envelope { rails: meta }).map_err(MessageError::Serialize)
    }

    /// Unwrap an envelope, check expiry and purpose, and decode the payload.
    ///
    /// Bytes that are not an envelope are decoded directly as the payload,
    /// skipping every metadata check.
    ///
    /// # Errors
    ///
    /// - [`MessageError::Expired`] if the envelope expiry is at or before now.
    /// - [`MessageError::MismatchedPurpose`] if the purpose differs from `opt.purpose`.
    /// - [`MessageError::InvalidMetadata`] if the envelope has no usable payload.
    /// - [`MessageError::Deserialize`] if the payload does not fit `T`.
    pub fn deserialize_with_metadata<T: DeserializeOwned>(
        &self,
        bytes: &[u8],
        opt: &MetadataOption,
    ) -> Result<T, MessageError> {
        self.deserialize_with_metadata_at(bytes, opt, Utc::now())
    }

    /// [`deserialize_with_metadata`](Self::deserialize_with_metadata) with an explicit clock.
    pub fn deserialize_with_metadata_at<T: DeserializeOwned>(
        &self,
        bytes: &[u8],
        opt: &MetadataOption,
        now: DateTime<Utc>,
    ) -> Result<T, MessageError> {
        let meta = match serde_json::from_slice::<Envelope>(bytes) {
            Ok(envelope) => envelope.rails,
            // Not an envelope: payloads issued before metadata existed.
            Err(_) => return serde_json::from_slice(bytes).map_err(MessageError::Deserialize),
        };

        if meta.is_expired_at(now) {
            debug!("message rejected: expired");
            return Err(MessageError::Expired);
        }
        if !meta.purpose_matches(&opt.purpose) {
            debug!("message rejected: purpose mismatch");
            return Err(MessageError::MismatchedPurpose);
        }

        if let Some(message) = meta.message.as_deref().filter(|m| !m.is_empty()) {
            let serialized =
                encoding::decode(message, false).map_err(|_| MessageError::InvalidMetadata)?;
            return serde_json::from_slice(&serialized).map_err(MessageError::Deserialize);
        }

        match meta.data {
            Some(data) => serde_json::from_str(data.get()).map_err(MessageError::Deserialize),
            None => Err(MessageError::InvalidMetadata),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Complex {
        ab: i64,
        cd: String,
        ef: bool,
        gh: Option<i64>,
    }

    fn complex() -> Complex {
        Complex {
            ab: 123,
            cd: "yellow".into(),
            ef: true,
            gh: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn modern_layout_embeds_raw_json() {
        let codec = Codec::new(false, false);
        let opt = MetadataOption::new().with_purpose("pizza");
        let bytes = codec.serialize_with_metadata_at("signed message", &opt, now()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"_rails":{"data":"signed message","pur":"pizza"}}"#
        );
    }

    #[test]
    fn legacy_layout_embeds_base64_json() {
        let codec = Codec::new(true, true);
        let bytes = codec
            .serialize_with_metadata_at("signed message", &MetadataOption::new(), now())
            .unwrap();
        // Legacy payloads use the standard alphabet regardless of the codec dialect.
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"_rails":{"message":"InNpZ25lZCBtZXNzYWdlIg=="}}"#
        );
    }

    #[test]
    fn relative_expiry_is_resolved_when_serialising() {
        let codec = Codec::default();
        let opt = MetadataOption::new().with_expires_in(Duration::hours(1));
        let bytes = codec.serialize_with_metadata_at(&1, &opt, now()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"_rails":{"data":1,"exp":"2024-03-01T13:00:00.000Z"}}"#
        );
    }

    #[test]
    fn modern_and_legacy_decode_to_same_value() {
        let opt = MetadataOption::new().with_purpose("pizza");
        let modern = Codec::new(false, false)
            .serialize_with_metadata_at(&complex(), &opt, now())
            .unwrap();
        let legacy = Codec::new(false, true)
            .serialize_with_metadata_at(&complex(), &opt, now())
            .unwrap();

        // Either codec reads either layout.
        for reader in [Codec::new(false, false), Codec::new(true, true)] {
            let a: Complex = reader.deserialize_with_metadata_at(&modern, &opt, now()).unwrap();
            let b: Complex = reader.deserialize_with_metadata_at(&legacy, &opt, now()).unwrap();
            assert_eq!(a, complex());
            assert_eq!(b, complex());
        }
    }

    #[test]
    fn bare_value_skips_metadata_checks() {
        let codec = Codec::default();
        let opt = MetadataOption::new().with_purpose("anything");
        let value: String = codec
            .deserialize_with_metadata_at(br#""signed message""#, &opt, now())
            .unwrap();
        assert_eq!(value, "signed message");

        let value: Complex = codec
            .deserialize_with_metadata_at(br#"{"ab":123,"cd":"yellow","ef":true,"gh":null}"#, &opt, now())
            .unwrap();
        assert_eq!(value, complex());
    }

    #[test]
    fn bare_value_of_wrong_type_fails() {
        let err = Codec::default()
            .deserialize_with_metadata_at::<u32>(br#""text""#, &MetadataOption::new(), now())
            .unwrap_err();
        assert!(matches!(err, MessageError::Deserialize(_)));
    }

    #[test]
    fn expired_at_and_after_boundary() {
        let codec = Codec::default();
        let exp = now();
        let opt = MetadataOption::new().with_expires_at(exp);
        let bytes = codec.serialize_with_metadata_at("x", &opt, exp).unwrap();

        let ok: String = codec
            .deserialize_with_metadata_at(&bytes, &opt, exp - Duration::milliseconds(1))
            .unwrap();
        assert_eq!(ok, "x");

        let err = codec
            .deserialize_with_metadata_at::<String>(&bytes, &opt, exp)
            .unwrap_err();
        assert!(matches!(err, MessageError::Expired));
    }

    #[test]
    fn purpose_must_match_exactly() {
        let codec = Codec::default();
        let pizza = MetadataOption::new().with_purpose("pizza");
        let bytes = codec.serialize_with_metadata_at("x", &pizza, now()).unwrap();

        let err = codec
            .deserialize_with_metadata_at::<String>(&bytes, &MetadataOption::new().with_purpose("milk"), now())
            .unwrap_err();
        assert!(matches!(err, MessageError::MismatchedPurpose));

        let err = codec
            .deserialize_with_metadata_at::<String>(&bytes, &MetadataOption::new(), now())
            .unwrap_err();
        assert!(matches!(err, MessageError::MismatchedPurpose));

        let unscoped = codec
            .serialize_with_metadata_at("x", &MetadataOption::new(), now())
            .unwrap();
        let value: String = codec
            .deserialize_with_metadata_at(&unscoped, &MetadataOption::new(), now())
            .unwrap();
        assert_eq!(value, "x");
    }

    #[test]
    fn expiry_is_checked_before_purpose() {
        let codec = Codec::default();
        let bytes = br#"{"_rails":{"data":"x","exp":"2007-01-01T00:00:00.000Z","pur":"pizza"}}"#;
        let err = codec
            .deserialize_with_metadata_at::<String>(bytes, &MetadataOption::new().with_purpose("milk"), now())
            .unwrap_err();
        assert!(matches!(err, MessageError::Expired));
    }

    #[test]
    fn envelope_without_payload_is_invalid_metadata() {
        let err = Codec::default()
            .deserialize_with_metadata_at::<String>(br#"{"_rails":{"pur":"pizza"}}"#, &MetadataOption::new().with_purpose("pizza"), now())
            .unwrap_err();
        assert!(matches!(err, MessageError::InvalidMetadata));
    }

    #[test]
    fn legacy_payload_that_is_not_base64_is_invalid_metadata() {
        let err = Codec::default()
            .deserialize_with_metadata_at::<String>(br#"{"_rails":{"message":"%%%"}}"#, &MetadataOption::new(), now())
            .unwrap_err();
        assert!(matches!(err, MessageError::InvalidMetadata));
    }

    #[test]
    fn null_payload_round_trips() {
        let codec = Codec::default();
        let bytes = codec
            .serialize_with_metadata_at(&Option::<u8>::None, &MetadataOption::new(), now())
            .unwrap();
        let value: Option<u8> = codec
            .deserialize_with_metadata_at(&bytes, &MetadataOption::new(), now())
            .unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn null_payload_into_required_target_is_deserialize() {
        let err = Codec::default()
            .deserialize_with_metadata_at::<String>(br#"{"_rails":{"data":null}}"#, &MetadataOption::new(), now())
            .unwrap_err();
        assert!(matches!(err, MessageError::Deserialize(_)));
    }

    #[test]
    fn unwritable_expiry_is_refused() {
        let codec = Codec::default();
        let far = Utc.with_ymd_and_hms(12000, 1, 1, 0, 0, 0).unwrap();
        for opt in [
            MetadataOption::new().with_purpose("pizza").with_expires_at(far),
            MetadataOption::new().with_expires_in(Duration::MIN),
            MetadataOption::new().with_expires_in(Duration::MAX),
        ] {
            let err = codec.serialize_with_metadata_at("x", &opt, now()).unwrap_err();
            assert!(matches!(err, MessageError::InvalidExpiry), "{opt:?}");
        }
    }
}
