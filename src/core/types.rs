use std::fmt;
use std::sync::Arc;

use super::{ColumnType, Error, Result, Value};

pub type Row = Vec<Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
    Array,
    Json,
}

impl DataType {
    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Float, Value::Float(_)) => true,
            (Self::Float, Value::Integer(_)) => true,
            (Self::Text, Value::Text(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Array, Value::Array(_)) => true,
            (Self::Json, Value::Json(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "INTEGER"),
            Self::Float => write!(f, "FLOAT"),
            Self::Text => write!(f, "TEXT"),
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Array => write!(f, "ARRAY"),
            Self::Json => write!(f, "JSONB"),
        }
    }
}

/// A model field and the column backing it.
#[derive(Clone)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub primary_key: bool,
    /// Target table of a foreign key.
    pub references: Option<String>,
    column_type: Option<Arc<dyn ColumnType>>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
            primary_key: false,
            references: None,
            column_type: None,
        }
    }

    /// A column whose values go through a custom column type.
    pub fn custom(name: impl Into<String>, column_type: impl ColumnType + 'static) -> Self {
        let data_type = column_type.data_type();
        Self {
            column_type: Some(Arc::new(column_type)),
            ..Self::new(name, data_type)
        }
    }

    /// A foreign key to the `id` of another table, stored as `<name>_id`.
    pub fn foreign_key(name: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            references: Some(to.into()),
            ..Self::new(name, DataType::Integer)
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn attname(&self) -> String {
        match self.references {
            Some(_) => format!("{}_id", self.name),
            None => self.name.clone(),
        }
    }

    pub fn column_type(&self) -> Option<&dyn ColumnType> {
        self.column_type.as_deref()
    }

    /// Checks a value against the column, returning the value to store.
    pub fn validate(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            if !self.nullable {
                return Err(Error::ConstraintViolation(format!(
                    "Column '{}' cannot be NULL",
                    self.name
                )));
            }
            return Ok(value);
        }

        let value = match &self.column_type {
            Some(column_type) => column_type.clean(value)?,
            None => value,
        };

        if !self.data_type.is_compatible(&value) {
            return Err(Error::TypeMismatch(format!(
                "Column '{}' expects type {}, got {}",
                self.name,
                self.data_type,
                value.type_name()
            )));
        }

        Ok(value)
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("data_type", &self.data_type)
            .field("nullable", &self.nullable)
            .field("primary_key", &self.primary_key)
            .field("references", &self.references)
            .field("column_type", &self.column_type.as_ref().map(|t| t.describe()))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Finds a column by field name or attname.
    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.name == name || col.attname() == name)
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.find_column_index(name).map(|idx| &self.columns[idx])
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_compatibility() {
        assert!(DataType::Integer.is_compatible(&Value::Integer(42)));
        assert!(DataType::Integer.is_compatible(&Value::Null));
        assert!(!DataType::Integer.is_compatible(&Value::Text("hello".into())));
        assert!(DataType::Float.is_compatible(&Value::Integer(1)));
    }

    #[test]
    fn test_foreign_key_attname() {
        let column = Column::foreign_key("album", "album");
        assert_eq!(column.attname(), "album_id");

        let schema = Schema::new(vec![Column::new("name", DataType::Text), column]);
        assert_eq!(schema.find_column_index("album"), Some(1));
        assert_eq!(schema.find_column_index("album_id"), Some(1));
        assert_eq!(schema.find_column_index("missing"), None);
    }

    #[test]
    fn test_not_null_rejected() {
        let column = Column::new("name", DataType::Text);
        assert!(matches!(
            column.validate(Value::Null),
            Err(Error::ConstraintViolation(_))
        ));
        assert!(column.clone().nullable().validate(Value::Null).is_ok());
        assert!(matches!(
            column.validate(Value::Integer(1)),
            Err(Error::TypeMismatch(_))
        ));
    }
}
