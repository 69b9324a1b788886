use std::collections::HashMap;

use super::{ModelMeta, Table};
use crate::core::{Error, Result, Row, Value};

#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: HashMap<String, Table>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&mut self, meta: ModelMeta) -> Result<()> {
        let name = meta.name().to_string();
        if self.tables.contains_key(&name) {
            return Err(Error::TableExists(name));
        }
        for column in meta.schema().columns() {
            if let Some(target) = &column.references
                && target != &name
                && !self.tables.contains_key(target)
            {
                return Err(Error::TableNotFound(target.clone()));
            }
        }
        self.tables.insert(name, Table::new(meta));
        Ok(())
    }

    pub fn get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Inserts a row, checking that foreign keys point at existing rows.
    pub fn insert_row(&mut self, table_name: &str, values: Vec<(String, Value)>) -> Result<Row> {
        let meta = self.get_table(table_name)?.meta().clone();

        for (name, value) in &values {
            let Some(column) = meta.schema().get_column(name) else {
                continue;
            };
            let (Some(target), Value::Integer(id)) = (&column.references, value) else {
                continue;
            };
            if self.get_table(target)?.get(*id).is_none() {
                return Err(Error::ConstraintViolation(format!(
                    "Foreign key '{}' references missing {} row {}",
                    column.attname(),
                    target,
                    id
                )));
            }
        }

        self.tables
            .get_mut(table_name)
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))?
            .insert(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DataType};

    #[test]
    fn test_foreign_key_must_exist() {
        let mut storage = InMemoryStorage::new();
        storage
            .create_table(ModelMeta::new("album", vec![Column::new("name", DataType::Text)]))
            .unwrap();
        storage
            .create_table(ModelMeta::new(
                "song",
                vec![Column::foreign_key("album", "album")],
            ))
            .unwrap();

        let err = storage
            .insert_row("song", vec![("album".into(), Value::Integer(9))])
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation(_)));

        storage
            .insert_row("album", vec![("name".into(), Value::from("Maestro"))])
            .unwrap();
        let row = storage
            .insert_row("song", vec![("album_id".into(), Value::Integer(1))])
            .unwrap();
        assert_eq!(row, vec![Value::Integer(1), Value::Integer(1)]);
    }

    #[test]
    fn test_duplicate_table() {
        let mut storage = InMemoryStorage::new();
        storage.create_table(ModelMeta::new("album", vec![])).unwrap();
        assert!(matches!(
            storage.create_table(ModelMeta::new("album", vec![])),
            Err(Error::TableExists(_))
        ));
        assert!(matches!(
            storage.create_table(ModelMeta::new("song", vec![Column::foreign_key("band", "band")])),
            Err(Error::TableNotFound(name)) if name == "band"
        ));
    }
}
