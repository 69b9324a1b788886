use log::debug;

use crate::core::Result;
use crate::query::Expr;
use crate::record::{Record, missing_field, unknown_field};

/// Ordered mapping from result column names to record field names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub fn insert(&mut self, column: impl Into<String>, field: impl Into<String>) {
        self.entries.push((column.into(), field.into()));
    }

    pub fn field(&self, column: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, field)| field.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(column, _)| column.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A validated projection of a model onto record type `T`.
#[derive(Debug, Clone)]
pub struct Projection {
    /// Model columns selected under their own name.
    pub fields: Vec<String>,
    /// Expressions selected as annotations, under their final column name.
    pub expressions: Vec<(String, Expr)>,
    pub field_map: FieldMap,
}

impl Projection {
    /// Resolves caller expressions against `T` and the model's column names.
    ///
    /// Expression names that collide with a model column are prefixed with
    /// `_` until unique. Fields without an expression fall back to the
    /// same-named model column, or are left to their default.
    pub fn resolve<T: Record>(
        column_names: &[String],
        expressions: Vec<(String, Expr)>,
    ) -> Result<Self> {
        let mut field_map = FieldMap::default();
        let mut selected: Vec<(String, Expr)> = Vec::with_capacity(expressions.len());
        let mut given: Vec<String> = Vec::with_capacity(expressions.len());

        for (field_name, expr) in expressions {
            if T::field(&field_name).is_none() {
                return Err(unknown_field::<T>(&field_name));
            }

            let taken = |name: &String| {
                column_names.contains(name) || selected.iter().any(|(taken, _)| taken == name)
            };
            let mut name = field_name.clone();
            if taken(&name) {
                while taken(&name) {
                    name = format!("_{}", name);
                }
                debug!(
                    "Selecting \"{}\" of record \"{}\" as \"{}\" to avoid a name clash",
                    field_name,
                    T::NAME,
                    name
                );
            }

            field_map.insert(name.as_str(), field_name.as_str());
            selected.push((name, expr));
            given.push(field_name);
        }

        let mut fields = Vec::new();
        for spec in T::fields() {
            if given.iter().any(|name| name == spec.name) {
                continue;
            }
            if column_names.iter().any(|name| name == spec.name) {
                field_map.insert(spec.name, spec.name);
                fields.push(spec.name.to_string());
                continue;
            }
            if spec.has_default() {
                continue;
            }
            return Err(missing_field::<T>(spec.name));
        }

        Ok(Self {
            fields,
            expressions: selected,
            field_map,
        })
    }
}
