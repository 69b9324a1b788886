use super::{DataType, Result, Value};

/// A pluggable column type.
///
/// Model columns hold their column type as a trait object, so this half of
/// the contract carries no associated types. It is consulted whenever a value
/// is written to the column.
pub trait ColumnType: Send + Sync {
    /// The storage type of the column.
    fn data_type(&self) -> DataType;

    /// Human readable description, used in debug output.
    fn describe(&self) -> String;

    /// Validates a value written to the column and returns the value to store.
    fn clean(&self, value: Value) -> Result<Value>;
}

/// Typed conversion between a Rust value and the storage representation.
pub trait FieldType: ColumnType {
    type Output;

    /// Converts a value read from the database.
    fn from_db_value(&self, value: Value) -> Result<Self::Output>;

    /// Converts a Rust value into its storage representation.
    fn get_prep_value(&self, value: &Self::Output) -> Result<Value>;
}
