pub mod error;
pub mod field_type;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use field_type::{ColumnType, FieldType};
pub use types::{Column, DataType, Row, Schema};
pub use value::Value;
