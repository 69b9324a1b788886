use super::{Query, ResultsIter};
use crate::core::{FieldType, Result, Value};
use crate::facade::ModelInstance;

/// A boxed stream of decoded rows.
pub type RowStream<T> = Box<dyn Iterator<Item = Result<T>>>;

/// Turns the compiler's row stream into the items a queryset yields.
///
/// Rows arrive laid out as extra-select columns, then values-select (or all
/// model) columns, then annotations; `rows.column_names()` gives the names in
/// that order.
pub trait Iterable: Clone {
    type Item: 'static;

    fn iterate(&self, query: &Query, rows: ResultsIter) -> RowStream<Self::Item>;
}

/// Yields model instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelIterable;

impl Iterable for ModelIterable {
    type Item = ModelInstance;

    fn iterate(&self, query: &Query, rows: ResultsIter) -> RowStream<ModelInstance> {
        let model = query.model.clone();
        let names = rows.column_names();
        Box::new(rows.map(move |row| {
            let row = row?;
            Ok(ModelInstance::new(
                model.as_str(),
                names.iter().cloned().zip(row).collect(),
            ))
        }))
    }
}

pub type ValuesRow = Vec<(String, Value)>;

/// Yields each row as named values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuesIterable;

impl Iterable for ValuesIterable {
    type Item = ValuesRow;

    fn iterate(&self, _query: &Query, rows: ResultsIter) -> RowStream<ValuesRow> {
        let names = rows.column_names();
        Box::new(rows.map(move |row| Ok(names.iter().cloned().zip(row?).collect())))
    }
}

/// Yields the single selected column of each row, decoded by a field type.
#[derive(Debug, Clone)]
pub struct FlatTypedIterable<F> {
    field: F,
}

impl<F> FlatTypedIterable<F> {
    pub fn new(field: F) -> Self {
        Self { field }
    }
}

impl<F> Iterable for FlatTypedIterable<F>
where
    F: FieldType + Clone + 'static,
    F::Output: 'static,
{
    type Item = F::Output;

    fn iterate(&self, _query: &Query, rows: ResultsIter) -> RowStream<F::Output> {
        let field = self.field.clone();
        Box::new(rows.map(move |row| {
            let value = row?.pop().unwrap_or(Value::Null);
            field.from_db_value(value)
        }))
    }
}
