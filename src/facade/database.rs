use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use crate::config::FetchConfig;
use crate::core::{FieldType, Result, Value};
use crate::query::{Expr, FlatTypedIterable, QuerySet, Typed};
use crate::storage::{InMemoryStorage, ModelMeta};

/// Shared handle to an in-memory database.
///
/// Clones share the same storage.
#[derive(Clone, Default)]
pub struct Database {
    storage: Arc<RwLock<InMemoryStorage>>,
    fetch: FetchConfig,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fetch configuration querysets of this database start with.
    pub fn with_fetch_config(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn fetch_config(&self) -> FetchConfig {
        self.fetch
    }

    /// Creates the table backing a model.
    pub fn register(&self, meta: ModelMeta) -> Result<()> {
        debug!("Registering model '{}'", meta.name());
        self.write()?.create_table(meta)
    }

    pub fn meta(&self, model: &str) -> Result<ModelMeta> {
        Ok(self.read()?.get_table(model)?.meta().clone())
    }

    /// The default manager of a registered model.
    pub fn objects(&self, model: &str) -> Result<Manager> {
        Ok(Manager {
            db: self.clone(),
            meta: self.meta(model)?,
        })
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, InMemoryStorage>> {
        Ok(self.storage.read()?)
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, InMemoryStorage>> {
        Ok(self.storage.write()?)
    }
}

/// Entry point for queries on one model.
#[derive(Clone)]
pub struct Manager {
    db: Database,
    meta: ModelMeta,
}

impl Manager {
    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    /// Validates and inserts a row. Foreign keys may be given by field name
    /// or attname.
    pub fn create(&self, values: Vec<(&str, Value)>) -> Result<ModelInstance> {
        let values = values
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        let row = self.db.write()?.insert_row(self.meta.name(), values)?;
        Ok(ModelInstance::new(
            self.meta.name(),
            self.meta
                .schema()
                .columns()
                .iter()
                .map(|column| column.attname())
                .zip(row)
                .collect(),
        ))
    }

    pub fn all(&self) -> QuerySet {
        QuerySet::new(self.db.clone(), self.meta.clone())
    }

    pub fn filter(&self, lookup: &str, value: impl Into<Value>) -> QuerySet {
        self.all().filter(lookup, value)
    }

    pub fn order_by(&self, ordering: &[&str]) -> QuerySet {
        self.all().order_by(ordering)
    }

    pub fn annotate(&self, name: &str, expr: Expr) -> Result<QuerySet> {
        self.all().annotate(name, expr)
    }

    pub fn get(&self) -> Result<ModelInstance> {
        self.all().get()
    }

    pub fn count(&self) -> Result<usize> {
        self.all().count()
    }

    pub fn values_flat<F>(&self, typed: Typed<F>) -> Result<QuerySet<FlatTypedIterable<F>>>
    where
        F: FieldType + Clone + 'static,
        F::Output: 'static,
    {
        self.all().values_flat(typed)
    }
}

/// A row loaded as a model instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    model: String,
    fields: Vec<(String, Value)>,
}

impl ModelInstance {
    pub fn new(model: impl Into<String>, fields: Vec<(String, Value)>) -> Self {
        Self {
            model: model.into(),
            fields,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn id(&self) -> Option<i64> {
        self.get("id").and_then(Value::as_i64)
    }

    /// Looks up a value by attname, falling back to `<name>_id` for foreign
    /// keys.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let fk = format!("{}_id", name);
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .or_else(|| self.fields.iter().find(|(field, _)| *field == fk))
            .map(|(_, value)| value)
    }

    /// Decodes a value through a field type.
    pub fn get_as<F: FieldType>(&self, name: &str, field: &F) -> Result<F::Output> {
        field.from_db_value(self.get(name).cloned().unwrap_or(Value::Null))
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}
