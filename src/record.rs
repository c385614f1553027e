//! Record trait and the JSON decoding rules shared by every lookup tier.
//! Strict decoding rejects top-level fields the schema does not declare,
//! lenient decoding drops them silently.

use std::fmt;

use serde::de::{self, DeserializeOwned, Visitor};
use serde::forward_to_deserialize_any;

/// A keyed value served by a [`LookupAdapter`](crate::lookup::LookupAdapter).
///
/// The `id` is assigned at decode time and never changes afterwards.
pub trait Record: Clone + fmt::Debug + DeserializeOwned + Send + Sync + 'static {
    /// Label used in log fields, e.g. "subscriber".
    const KIND: &'static str;

    fn id(&self) -> &str;
}

#[derive(Debug)]
pub enum DecodeError {
    /// The payload carries a top-level field the schema does not know about.
    UnknownField(String),
    Malformed(serde_json::Error),
}

impl DecodeError {
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, DecodeError::UnknownField(_))
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownField(name) => write!(f, "unknown field \"{name}\""),
            DecodeError::Malformed(e) => write!(f, "malformed payload: {e}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::UnknownField(_) => None,
            DecodeError::Malformed(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Malformed(e)
    }
}

/// Decode `bytes`, failing with [`DecodeError::UnknownField`] if the top-level
/// object has a key the schema does not declare.
pub fn decode_strict<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    decode_value_strict(value)
}

/// Same as [`decode_strict`] for an already-parsed JSON value.
pub fn decode_value_strict<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, DecodeError> {
    if let (Some(object), Some(known)) = (value.as_object(), struct_fields::<T>()) {
        if let Some(unknown) = object.keys().find(|key| !known.contains(&key.as_str())) {
            return Err(DecodeError::UnknownField(unknown.clone()));
        }
    }
    Ok(serde_json::from_value(value)?)
}

/// Decode `bytes`, ignoring fields the schema does not declare.
pub fn decode_lenient<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Field names a derived `Deserialize` impl accepts, as serde reports them to
/// `deserialize_struct`. `None` when `T` is not deserialized as a struct.
pub fn struct_fields<T: DeserializeOwned>() -> Option<&'static [&'static str]> {
    let mut fields = None;
    let _ = T::deserialize(FieldProbe { fields: &mut fields });
    fields
}

/// Deserializer that captures the field list and then bails out.
struct FieldProbe<'a> {
    fields: &'a mut Option<&'static [&'static str]>,
}

impl<'de> de::Deserializer<'de> for FieldProbe<'_> {
    type Error = de::value::Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(de::Error::custom("not a struct"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        *self.fields = Some(fields);
        Err(de::Error::custom("field probe"))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Probe {
        id: String,
        #[serde(default)]
        display_name: String,
    }

    #[test]
    fn struct_fields_reports_renamed_names() {
        assert_eq!(struct_fields::<Probe>(), Some(&["id", "displayName"][..]));
        assert_eq!(struct_fields::<u32>(), None);
    }

    #[test]
    fn strict_decode_rejects_unknown_top_level_field() {
        let err = decode_strict::<Probe>(br#"{"id":"A","extra":true}"#).unwrap_err();
        match err {
            DecodeError::UnknownField(name) => assert_eq!(name, "extra"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strict_decode_accepts_known_fields() {
        let probe: Probe = decode_strict(br#"{"id":"A","displayName":"first"}"#).unwrap();
        assert_eq!(probe, Probe { id: "A".into(), display_name: "first".into() });
    }

    #[test]
    fn lenient_decode_drops_unknown_fields() {
        let probe: Probe = decode_lenient(br#"{"id":"A","extra":true}"#).unwrap();
        assert_eq!(probe.id, "A");
        assert!(probe.display_name.is_empty());
    }

    #[test]
    fn malformed_payload_is_not_an_unknown_field_error() {
        let err = decode_strict::<Probe>(b"{not json").unwrap_err();
        assert!(!err.is_unknown_field());
        let err = decode_lenient::<Probe>(br#"{"displayName":"no id"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }
}
