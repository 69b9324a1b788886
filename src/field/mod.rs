//! Column type storing a record as JSON.

mod json_object;

use std::fmt;
use std::marker::PhantomData;

use serde_json::Value as JsonValue;

pub use json_object::JsonObject;

use crate::core::{Column, ColumnType, DataType, Error, FieldType, Result, Value};
use crate::query::{Expr, Typed};
use crate::record::{Record, missing_field, unknown_field};

/// Stores a record of type `T` in a single JSON column.
///
/// Values written to the column must decode into `T`; they are stored as
/// `Value::Json`. JSON text is accepted when reading.
pub struct RecordField<T> {
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> RecordField<T> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }

    /// A model column of this type.
    pub fn column(self, name: impl Into<String>) -> Column
    where
        T: 'static,
    {
        Column::custom(name, self)
    }

    pub fn encode(&self, value: &T) -> Result<Value> {
        Ok(Value::Json(serde_json::to_value(value)?))
    }

    pub fn decode(&self, value: Value) -> Result<T> {
        let json = match value {
            Value::Json(json) => json,
            Value::Text(text) => serde_json::from_str(&text).map_err(|err| {
                Error::TypeMismatch(format!(
                    "Invalid JSON for record \"{}\": {}",
                    T::NAME,
                    err
                ))
            })?,
            other => {
                return Err(Error::TypeMismatch(format!(
                    "Expected JSON for record \"{}\", got {}",
                    T::NAME,
                    other.type_name()
                )));
            }
        };

        match json {
            JsonValue::Object(fields) => T::from_fields(fields),
            other => Err(Error::TypeMismatch(format!(
                "Expected a JSON object for record \"{}\", got {}",
                T::NAME,
                other
            ))),
        }
    }

    /// Like [`decode`](Self::decode), with NULL decoding to `None`.
    pub fn decode_optional(&self, value: Value) -> Result<Option<T>> {
        match value {
            Value::Null => Ok(None),
            value => self.decode(value).map(Some),
        }
    }

    /// An expression constructing a `T` from named sub-expressions, with this
    /// field as its output field.
    ///
    /// Keys must be declared fields of `T`, and every field without a default
    /// must be given.
    pub fn construct(&self, object: JsonObject) -> Result<Typed<Self>> {
        if let Some(unknown) = object.keys().find(|key| T::field(key).is_none()) {
            return Err(unknown_field::<T>(unknown));
        }
        if let Some(missing) = T::fields()
            .iter()
            .find(|field| !field.has_default() && !object.keys().any(|key| key == field.name))
        {
            return Err(missing_field::<T>(missing.name));
        }
        Ok(Expr::from(object).output_field(*self))
    }
}

impl<T> Clone for RecordField<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RecordField<T> {}

impl<T: Record> Default for RecordField<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> fmt::Debug for RecordField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordField<{}>", T::NAME)
    }
}

impl<T: Record> ColumnType for RecordField<T> {
    fn data_type(&self) -> DataType {
        DataType::Json
    }

    fn describe(&self) -> String {
        format!("{:?}", self)
    }

    fn clean(&self, value: Value) -> Result<Value> {
        let record = self.decode(value)?;
        self.encode(&record)
    }
}

impl<T: Record> FieldType for RecordField<T> {
    type Output = T;

    fn from_db_value(&self, value: Value) -> Result<T> {
        self.decode(value)
    }

    fn get_prep_value(&self, value: &T) -> Result<Value> {
        self.encode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::col;
    use serde_json::json;

    crate::record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Artist {
            name: String,
        }
    }

    crate::record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Album {
            name: String,
            artist: Artist,
            year: Option<i64> = None,
        }
    }

    crate::record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Likes {
            name: String,
            like_count: i64 = 0,
        }
    }

    crate::record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct LikedSong {
            title: String,
            likes: Likes,
        }
    }

    fn kaizers() -> Album {
        Album {
            name: "Ompa til du dør".into(),
            artist: Artist {
                name: "Kaizers Orchestra".into(),
            },
            year: Some(2001),
        }
    }

    #[test]
    fn test_round_trip() {
        let field = RecordField::<Album>::new();
        let stored = field.encode(&kaizers()).unwrap();
        assert_eq!(
            stored,
            Value::Json(json!({
                "name": "Ompa til du dør",
                "artist": {"name": "Kaizers Orchestra"},
                "year": 2001,
            }))
        );
        assert_eq!(field.decode(stored.clone()).unwrap(), kaizers());
        assert_eq!(field.encode(&field.decode(stored.clone()).unwrap()).unwrap(), stored);
    }

    #[test]
    fn test_decode_accepts_json_text() {
        let field = RecordField::<Artist>::new();
        let artist = field
            .decode(Value::from(r#"{"name": "Kaizers Orchestra"}"#))
            .unwrap();
        assert_eq!(artist.name, "Kaizers Orchestra");
    }

    #[test]
    fn test_decode_rejects_other_types() {
        let field = RecordField::<Artist>::new();
        assert!(matches!(field.decode(Value::Integer(3)), Err(Error::TypeMismatch(_))));
        assert!(matches!(field.decode(Value::Null), Err(Error::TypeMismatch(_))));
        assert!(matches!(field.decode(Value::from("not json")), Err(Error::TypeMismatch(_))));
        assert!(matches!(field.decode(Value::Json(json!([1]))), Err(Error::TypeMismatch(_))));
        assert!(matches!(
            field.decode(Value::Json(json!({"name": 7}))),
            Err(Error::TypeMismatch(_))
        ));
        assert_eq!(field.decode_optional(Value::Null).unwrap(), None);
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let field = RecordField::<Album>::new();
        let album = field
            .decode(Value::Json(json!({"name": "Maestro", "artist": {"name": "Kaizers Orchestra"}})))
            .unwrap();
        assert_eq!(album.year, None);
    }

    #[test]
    fn test_clean_normalises_to_json() {
        let field = RecordField::<Artist>::new();
        assert_eq!(
            field.clean(Value::from(r#"{"name":"A"}"#)).unwrap(),
            Value::Json(json!({"name": "A"}))
        );
        assert_eq!(field.data_type(), DataType::Json);
        assert_eq!(field.describe(), "RecordField<Artist>");
    }

    #[test]
    fn test_construct_validates_keys() {
        let field = RecordField::<Album>::new();

        let err = field
            .construct(JsonObject::new().field("name", col("name")))
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing field \"artist\" on record \"Album\"");

        let err = field
            .construct(
                JsonObject::new()
                    .field("name", col("name"))
                    .field("artist", col("artist"))
                    .field("label", col("label")),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown field \"label\" on record \"Album\"");

        let typed = field
            .construct(
                JsonObject::new()
                    .field("name", col("name"))
                    .field("artist", col("artist")),
            )
            .unwrap();
        assert_eq!(typed.expr.lookups(), vec!["name", "artist"]);
    }

    #[test]
    fn test_nested_record_decodes_like_top_level() {
        let likes = RecordField::<Likes>::new()
            .decode(Value::Json(json!({"name": "a"})))
            .unwrap();
        let field = RecordField::<LikedSong>::new();
        let song = field
            .decode(Value::Json(json!({"title": "t", "likes": {"name": "a"}})))
            .unwrap();
        assert_eq!(song.likes, likes);
        assert_eq!(song.likes.like_count, 0);

        assert!(matches!(
            field.decode(Value::Json(json!({"title": "t", "likes": {"name": "a", "bogus": 3}}))),
            Err(Error::TypeMismatch(_))
        ));
    }
}
