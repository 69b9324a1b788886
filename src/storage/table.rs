use std::collections::BTreeMap;

use crate::core::{Column, DataType, Error, Result, Row, Schema, Value};

/// Name of the implicit auto-increment primary key.
pub const PRIMARY_KEY: &str = "id";

/// Model metadata: a table name plus its ordered fields.
///
/// Every model gets an implicit `id` primary key as its first column.
#[derive(Debug, Clone)]
pub struct ModelMeta {
    name: String,
    schema: Schema,
}

impl ModelMeta {
    pub fn new(name: impl Into<String>, fields: Vec<Column>) -> Self {
        let mut columns = Vec::with_capacity(fields.len() + 1);
        columns.push(Column::new(PRIMARY_KEY, DataType::Integer).primary_key());
        columns.extend(fields);
        Self {
            name: name.into(),
            schema: Schema::new(columns),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Every name a query may use to refer to a column of this model,
    /// i.e. field names and attnames.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for column in self.schema.columns() {
            names.push(column.name.clone());
            let attname = column.attname();
            if attname != column.name {
                names.push(attname);
            }
        }
        names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.find_column_index(name).is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    meta: ModelMeta,
    rows: BTreeMap<i64, Row>,
    next_row_id: i64,
}

impl Table {
    pub fn new(meta: ModelMeta) -> Self {
        Self {
            meta,
            rows: BTreeMap::new(),
            next_row_id: 1,
        }
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    /// Builds and inserts a row from named values, assigning the primary key.
    ///
    /// Columns without a value are stored as NULL, which non-nullable columns
    /// reject.
    pub fn insert(&mut self, values: Vec<(String, Value)>) -> Result<Row> {
        let schema = self.meta.schema();
        let mut row: Row = vec![Value::Null; schema.column_count()];
        let mut assigned = vec![false; schema.column_count()];

        for (name, value) in values {
            let idx = schema
                .find_column_index(&name)
                .ok_or_else(|| Error::ColumnNotFound(name.clone(), self.meta.name.clone()))?;
            row[idx] = value;
            assigned[idx] = true;
        }

        let id = match &row[0] {
            Value::Null => self.next_row_id,
            Value::Integer(id) => *id,
            other => {
                return Err(Error::TypeMismatch(format!(
                    "Primary key must be INTEGER, got {}",
                    other.type_name()
                )));
            }
        };
        if self.rows.contains_key(&id) {
            return Err(Error::ConstraintViolation(format!(
                "Duplicate primary key {} in table '{}'",
                id, self.meta.name
            )));
        }
        row[0] = Value::Integer(id);

        for (idx, column) in schema.columns().iter().enumerate().skip(1) {
            let value = std::mem::replace(&mut row[idx], Value::Null);
            row[idx] = column.validate(value).map_err(|err| match (err, assigned[idx]) {
                (Error::ConstraintViolation(_), false) => Error::ConstraintViolation(format!(
                    "Missing value for column '{}' in table '{}'",
                    column.name, self.meta.name
                )),
                (err, _) => err,
            })?;
        }

        self.next_row_id = self.next_row_id.max(id + 1);
        self.rows.insert(id, row.clone());
        Ok(row)
    }

    pub fn get(&self, id: i64) -> Option<&Row> {
        self.rows.get(&id)
    }

    pub fn scan(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
