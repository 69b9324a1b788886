//! Structured value types.
//!
//! A record is a fixed-shape struct with named, typed fields that serde can
//! move in and out of JSON. Its [`Record`] impl lists the fields in
//! declaration order together with their defaults; the [`record!`] macro
//! writes both the struct and the impl.
//!
//! [`record!`]: crate::record!

mod macros;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use crate::core::{Error, Result};

/// How a field is filled when a record is built without it.
#[derive(Debug, Clone, Copy)]
pub enum FieldDefault {
    /// The field must always be given.
    Required,
    /// A default value. The function evaluates the declared constant
    /// expression (`field: T = expr`), so every call yields the same value.
    Value(fn() -> Result<JsonValue>),
    /// A factory called for a fresh default each time (`field: T => path`).
    Factory(fn() -> Result<JsonValue>),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub default: FieldDefault,
}

impl FieldSpec {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            default: FieldDefault::Required,
        }
    }

    pub const fn with_default(name: &'static str, default: fn() -> Result<JsonValue>) -> Self {
        Self {
            name,
            default: FieldDefault::Value(default),
        }
    }

    pub const fn with_factory(name: &'static str, factory: fn() -> Result<JsonValue>) -> Self {
        Self {
            name,
            default: FieldDefault::Factory(factory),
        }
    }

    pub fn has_default(&self) -> bool {
        !matches!(self.default, FieldDefault::Required)
    }

    /// The default for this field, if it has one. Fails when the default
    /// cannot be serialized.
    pub fn default_value(&self) -> Result<Option<JsonValue>> {
        match self.default {
            FieldDefault::Required => Ok(None),
            FieldDefault::Value(value) => value().map(Some),
            FieldDefault::Factory(factory) => factory().map(Some),
        }
    }
}

/// A structured value type.
///
/// Records declared with [`record!`](crate::record!) deserialize through
/// [`Record::from_fields`], so defaults and unknown-field checks apply the
/// same way wherever the record appears, nested ones included.
pub trait Record: Serialize + DeserializeOwned {
    /// Type name used in error messages.
    const NAME: &'static str;

    /// Declared fields, in order.
    fn fields() -> &'static [FieldSpec];

    fn field(name: &str) -> Option<&'static FieldSpec> {
        Self::fields().iter().find(|field| field.name == name)
    }

    /// Builds a record from named JSON values.
    ///
    /// Names that are not declared fields are rejected, fields left out get
    /// their default, and a left-out field without a default is an error.
    fn from_fields(mut values: Map<String, JsonValue>) -> Result<Self> {
        if let Some(unknown) = values.keys().find(|name| Self::field(name).is_none()) {
            return Err(unknown_field::<Self>(unknown));
        }

        let mut object = Map::with_capacity(Self::fields().len());
        for field in Self::fields() {
            let value = match values.remove(field.name) {
                Some(value) => value,
                None => field
                    .default_value()?
                    .ok_or_else(|| missing_field::<Self>(field.name))?,
            };
            object.insert(field.name.to_string(), value);
        }

        Self::from_complete(object)
    }

    /// Builds a record from an object holding every declared field.
    fn from_complete(object: Map<String, JsonValue>) -> Result<Self> {
        serde_json::from_value(JsonValue::Object(object)).map_err(|err| {
            Error::TypeMismatch(format!("Cannot build record \"{}\": {}", Self::NAME, err))
        })
    }
}

#[doc(hidden)]
pub fn default_json<T: Serialize>(value: T) -> Result<JsonValue> {
    Ok(serde_json::to_value(value)?)
}

#[doc(hidden)]
pub fn take_field<R: Record, T: DeserializeOwned>(
    object: &mut Map<String, JsonValue>,
    name: &str,
) -> Result<T> {
    let value = object
        .remove(name)
        .ok_or_else(|| missing_field::<R>(name))?;
    serde_json::from_value(value).map_err(|err| {
        Error::TypeMismatch(format!(
            "Cannot build record \"{}\": field \"{}\": {}",
            R::NAME,
            name,
            err
        ))
    })
}

pub(crate) fn unknown_field<T: Record>(field: &str) -> Error {
    Error::UnknownField {
        field: field.to_string(),
        record: T::NAME.to_string(),
    }
}

pub(crate) fn missing_field<T: Record>(field: &str) -> Error {
    Error::MissingField {
        field: field.to_string(),
        record: T::NAME.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    crate::record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Track {
            title: String,
            plays: i64 = 0,
            tags: Vec<String> => Vec::new,
        }
    }

    crate::record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Playlist {
            title: String,
            opener: Track,
        }
    }

    fn tuple_keys() -> BTreeMap<Vec<i64>, i64> {
        BTreeMap::from([(vec![1, 2], 3)])
    }

    crate::record! {
        #[derive(Debug)]
        pub struct Weights {
            name: String,
            weights: BTreeMap<Vec<i64>, i64> => tuple_keys,
        }
    }

    fn object(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_fields_in_declaration_order() {
        let names: Vec<&str> = Track::fields().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["title", "plays", "tags"]);
        assert!(!Track::fields()[0].has_default());
        assert!(matches!(Track::fields()[1].default, FieldDefault::Value(_)));
        assert!(matches!(Track::fields()[2].default, FieldDefault::Factory(_)));
        assert_eq!(Track::NAME, "Track");
    }

    #[test]
    fn test_from_fields_applies_defaults() {
        let track = Track::from_fields(object(json!({"title": "Kontroll på kontinentet"}))).unwrap();
        assert_eq!(
            track,
            Track {
                title: "Kontroll på kontinentet".into(),
                plays: 0,
                tags: vec![],
            }
        );
    }

    #[test]
    fn test_from_fields_errors() {
        let err = Track::from_fields(object(json!({"plays": 3}))).unwrap_err();
        assert_eq!(err.to_string(), "Missing field \"title\" on record \"Track\"");

        let err = Track::from_fields(object(json!({"title": "x", "bpm": 120}))).unwrap_err();
        assert_eq!(err.to_string(), "Unknown field \"bpm\" on record \"Track\"");

        let err = Track::from_fields(object(json!({"title": 5}))).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }

    #[test]
    fn test_nested_records_apply_defaults() {
        let playlist = Playlist::from_fields(object(json!({
            "title": "Maestro",
            "opener": {"title": "Knekker deg til sist"},
        })))
        .unwrap();
        assert_eq!(playlist.opener.plays, 0);
        assert!(playlist.opener.tags.is_empty());

        let parsed: Playlist =
            serde_json::from_value(json!({"title": "Maestro", "opener": {"title": "Sigøynerblod"}}))
                .unwrap();
        assert_eq!(parsed.opener.title, "Sigøynerblod");
    }

    #[test]
    fn test_nested_records_reject_unknown_fields() {
        let err = Playlist::from_fields(object(json!({
            "title": "Maestro",
            "opener": {"title": "Knekker deg til sist", "bogus": 3},
        })))
        .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(ref msg) if msg.contains("Unknown field \"bogus\" on record \"Track\"")));
    }

    #[test]
    fn test_unserializable_default_is_reported() {
        assert!(matches!(
            Weights::fields()[1].default_value(),
            Err(Error::Serialization(_))
        ));
        let err = Weights::from_fields(object(json!({"name": "x"}))).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
