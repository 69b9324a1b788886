use super::iterable::RowStream;
use super::{
    Compiler, Expr, FlatTypedIterable, Iterable, ModelIterable, OrderBy, Query, Typed,
    ValuesIterable,
};
use crate::config::FetchConfig;
use crate::core::{Error, FieldType, Result, Value};
use crate::facade::Database;
use crate::storage::ModelMeta;

/// Alias under which [`QuerySet::values_flat`] selects its expression.
const FLAT_ALIAS: &str = "__value";

/// A lazily evaluated, chainable query over one model.
///
/// Nothing touches storage until the queryset is iterated. Every method
/// returns a new queryset; clones are independent.
#[derive(Clone)]
pub struct QuerySet<I = ModelIterable> {
    db: Database,
    meta: ModelMeta,
    query: Query,
    iterable: I,
}

impl QuerySet<ModelIterable> {
    pub fn new(db: Database, meta: ModelMeta) -> Self {
        Self {
            query: Query::new(meta.name()),
            db,
            meta,
            iterable: ModelIterable,
        }
    }
}

impl<I: Iterable> QuerySet<I> {
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn model(&self) -> &ModelMeta {
        &self.meta
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn iterable(&self) -> &I {
        &self.iterable
    }

    /// Keeps rows where `lookup` equals `value`. Annotation names resolve to
    /// their expression.
    pub fn filter(mut self, lookup: &str, value: impl Into<Value>) -> Self {
        let expr = self.query.resolve_ref(lookup);
        self.query.filters.push((expr, value.into()));
        self
    }

    /// Replaces the ordering. `"-name"` sorts descending.
    pub fn order_by(mut self, ordering: &[&str]) -> Self {
        self.query.order_by = ordering.iter().map(|spec| OrderBy::parse(spec)).collect();
        self
    }

    /// Adds a raw extra-select column. Extra columns come first in each row.
    pub fn extra(mut self, name: &str, expr: Expr) -> Self {
        upsert(&mut self.query.extra_select, name, expr);
        self
    }

    pub fn annotate(mut self, name: &str, expr: Expr) -> Result<Self> {
        if self.meta.has_column(name) {
            return Err(Error::FieldConflict(name.to_string()));
        }
        upsert(&mut self.query.annotation_select, name, expr);
        Ok(self)
    }

    /// Restricts the selected columns to `fields` plus the given expressions,
    /// keeping the current row iterable.
    ///
    /// Expressions become annotations, so their names must not clash with
    /// model columns. With nothing requested every model column is selected.
    pub fn restrict(mut self, fields: &[String], expressions: Vec<(String, Expr)>) -> Result<Self> {
        let mut requested: Vec<String> = fields.to_vec();
        for (name, expr) in expressions {
            self = self.annotate(&name, expr)?;
            requested.push(name);
        }

        if requested.is_empty() {
            self.query.default_cols = true;
            self.query.values_select.clear();
            return Ok(self);
        }

        let mut values_select = Vec::new();
        for name in &requested {
            if self.query.annotation(name).is_none() && self.query.extra(name).is_none() {
                values_select.push(name.clone());
            }
        }

        self.query
            .annotation_select
            .retain(|(alias, _)| requested.contains(alias));
        self.query
            .extra_select
            .retain(|(alias, _)| requested.contains(alias));
        self.query.default_cols = false;
        self.query.values_select = values_select;
        Ok(self)
    }

    /// Rows as named values.
    pub fn values(
        self,
        fields: &[&str],
        expressions: Vec<(&str, Expr)>,
    ) -> Result<QuerySet<ValuesIterable>> {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        let expressions = expressions
            .into_iter()
            .map(|(name, expr)| (name.to_string(), expr))
            .collect();
        Ok(self
            .restrict(&fields, expressions)?
            .with_iterable(ValuesIterable))
    }

    /// One typed expression per row, decoded through its output field.
    pub fn values_flat<F>(self, typed: Typed<F>) -> Result<QuerySet<FlatTypedIterable<F>>>
    where
        F: FieldType + Clone + 'static,
        F::Output: 'static,
    {
        let Typed { expr, field } = typed;
        Ok(self
            .restrict(&[], vec![(FLAT_ALIAS.to_string(), expr)])?
            .with_iterable(FlatTypedIterable::new(field)))
    }

    /// Swaps the row iterable.
    pub fn with_iterable<J: Iterable>(self, iterable: J) -> QuerySet<J> {
        QuerySet {
            db: self.db,
            meta: self.meta,
            query: self.query,
            iterable,
        }
    }

    pub fn get_compiler(&self) -> Compiler {
        Compiler::new(self.query.clone(), self.db.clone())
    }

    /// Iterates with the database's fetch configuration.
    pub fn iter(&self) -> Result<RowStream<I::Item>> {
        self.iter_with(self.db.fetch_config())
    }

    /// Iterates evaluating `chunk_size` rows at a time.
    pub fn iterator(&self, chunk_size: usize) -> Result<RowStream<I::Item>> {
        self.iter_with(FetchConfig::chunked(chunk_size))
    }

    pub fn iter_with(&self, fetch: FetchConfig) -> Result<RowStream<I::Item>> {
        let rows = self.get_compiler().results_iter(fetch)?;
        Ok(self.iterable.iterate(&self.query, rows))
    }

    pub fn fetch_all(&self) -> Result<Vec<I::Item>> {
        self.iter()?.collect()
    }

    /// The single matching item.
    pub fn get(&self) -> Result<I::Item> {
        let mut items = self.fetch_all()?;
        match items.len() {
            0 => Err(Error::DoesNotExist(self.meta.name().to_string())),
            1 => items
                .pop()
                .ok_or_else(|| Error::DoesNotExist(self.meta.name().to_string())),
            n => Err(Error::MultipleObjectsReturned(self.meta.name().to_string(), n)),
        }
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self
            .get_compiler()
            .results_iter(self.db.fetch_config())?
            .remaining())
    }
}

fn upsert(select: &mut Vec<(String, Expr)>, name: &str, expr: Expr) {
    match select.iter_mut().find(|(alias, _)| alias == name) {
        Some(entry) => entry.1 = expr,
        None => select.push((name.to_string(), expr)),
    }
}
