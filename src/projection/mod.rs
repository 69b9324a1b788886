//! Projecting query results into records.
//!
//! [`QuerySet::records`] validates the requested expressions against the
//! record type and the model, narrows the query to exactly the columns the
//! record needs, and installs [`RecordIterable`] to rebuild one record per
//! row.

mod field_map;

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Map;

pub use field_map::{FieldMap, Projection};

use crate::core::Result;
use crate::query::iterable::RowStream;
use crate::query::{Expr, Iterable, Query, QuerySet, ResultsIter};
use crate::record::Record;
use crate::storage::PRIMARY_KEY;

/// Row iterable yielding one `T` per result row.
pub struct RecordIterable<T> {
    field_map: Arc<FieldMap>,
    _record: PhantomData<fn() -> T>,
}

impl<T> RecordIterable<T> {
    pub fn new(field_map: FieldMap) -> Self {
        Self {
            field_map: Arc::new(field_map),
            _record: PhantomData,
        }
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }
}

impl<T> Clone for RecordIterable<T> {
    fn clone(&self) -> Self {
        Self {
            field_map: Arc::clone(&self.field_map),
            _record: PhantomData,
        }
    }
}

impl<T: Record + 'static> Iterable for RecordIterable<T> {
    type Item = T;

    fn iterate(&self, _query: &Query, rows: ResultsIter) -> RowStream<T> {
        let names = rows.column_names();
        let field_map = Arc::clone(&self.field_map);

        Box::new(rows.map(move |row| {
            let row = row?;
            let mut fields = Map::with_capacity(row.len());
            for (name, value) in names.iter().zip(row) {
                // Only the placeholder primary key of an all-default record is unmapped.
                if let Some(field) = field_map.field(name) {
                    fields.insert(field.to_string(), value.to_json());
                }
            }
            T::from_fields(fields)
        }))
    }
}

impl<I: Iterable> QuerySet<I> {
    /// Returns a queryset yielding records of type `T`.
    ///
    /// Each `(field, expression)` pair computes one field of `T`. Fields
    /// without an expression are read from the same-named model column, or
    /// take their default. Unknown and missing fields are reported here,
    /// before anything runs.
    pub fn records<T: Record + 'static>(
        self,
        expressions: Vec<(&str, Expr)>,
    ) -> Result<QuerySet<RecordIterable<T>>> {
        let expressions = expressions
            .into_iter()
            .map(|(name, expr)| (name.to_string(), expr))
            .collect();
        let projection = Projection::resolve::<T>(&self.model().column_names(), expressions)?;

        let Projection {
            mut fields,
            expressions,
            field_map,
        } = projection;
        if field_map.is_empty() {
            fields.push(PRIMARY_KEY.to_string());
        }

        Ok(self
            .restrict(&fields, expressions)?
            .with_iterable(RecordIterable::new(field_map)))
    }
}
