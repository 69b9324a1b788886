// ============================================================================
// record_field
// ============================================================================

//! Records in JSON columns, and query results projected into records.
//!
//! Two adapters sit on top of a small in-memory ORM layer:
//!
//! - [`RecordField`] is a column type that stores a [`Record`] as JSON and
//!   builds JSON-construction expressions ([`JsonObject`]) for annotations.
//! - [`QuerySet::records`] projects a queryset into records, one per row.
//!
//! ```
//! use record_field::{Column, DataType, Database, ModelMeta, Value, col, record};
//!
//! record! {
//!     #[derive(Debug, PartialEq)]
//!     pub struct SongWithAlbumName {
//!         name: String,
//!         album_name: String,
//!     }
//! }
//!
//! # fn main() -> record_field::Result<()> {
//! let db = Database::new();
//! db.register(ModelMeta::new("album", vec![Column::new("name", DataType::Text)]))?;
//! db.register(ModelMeta::new(
//!     "song",
//!     vec![
//!         Column::foreign_key("album", "album"),
//!         Column::new("name", DataType::Text),
//!     ],
//! ))?;
//!
//! let album = db.objects("album")?.create(vec![("name", Value::from("Maestro"))])?;
//! db.objects("song")?.create(vec![
//!     ("album", Value::Integer(album.id().unwrap_or_default())),
//!     ("name", Value::from("Knekker deg til sist")),
//! ])?;
//!
//! let songs = db
//!     .objects("song")?
//!     .all()
//!     .records::<SongWithAlbumName>(vec![("album_name", col("album__name"))])?
//!     .fetch_all()?;
//! assert_eq!(songs[0].album_name, "Maestro");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod facade;
pub mod field;
pub mod projection;
pub mod query;
pub mod record;
pub mod storage;

pub use crate::config::FetchConfig;
pub use crate::core::{Column, ColumnType, DataType, Error, FieldType, Result, Value};
pub use crate::facade::{Database, Manager, ModelInstance};
pub use crate::field::{JsonObject, RecordField};
pub use crate::projection::{FieldMap, RecordIterable};
pub use crate::query::{Expr, QuerySet, Typed, col, val};
pub use crate::record::{FieldDefault, FieldSpec, Record};
pub use crate::storage::ModelMeta;

#[doc(hidden)]
pub use serde;
#[doc(hidden)]
pub use serde_json;
