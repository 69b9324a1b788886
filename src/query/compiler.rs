use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

use log::{Level, debug, log_enabled, trace};
use serde_json::{Map, Value as JsonValue};

use super::{Expr, Query};
use crate::config::FetchConfig;
use crate::core::{Error, Result, Row, Value};
use crate::facade::Database;
use crate::storage::{InMemoryStorage, ModelMeta};

/// Compiles a [`Query`] against a database and streams its rows.
pub struct Compiler {
    db: Database,
    query: Arc<Query>,
}

impl Compiler {
    pub fn new(query: Query, db: Database) -> Self {
        Self {
            db,
            query: Arc::new(query),
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Output column names, in row order.
    pub fn column_names(&self) -> Result<Vec<String>> {
        let storage = self.db.read()?;
        let meta = storage.get_table(&self.query.model)?.meta();
        Ok(select_list(&self.query, meta)
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    /// Renders the query as SQL.
    pub fn as_sql(&self) -> Result<String> {
        let storage = self.db.read()?;
        let meta = storage.get_table(&self.query.model)?.meta();
        SqlWriter::new(&storage, meta).render(&self.query)
    }

    /// Returns a lazy stream of result rows.
    ///
    /// Lookups are validated, and rows are filtered and ordered, before this
    /// returns; select expressions are evaluated as the stream is pulled.
    pub fn results_iter(&self, fetch: FetchConfig) -> Result<ResultsIter> {
        if log_enabled!(Level::Debug) {
            debug!("Executing query: {}", self.as_sql()?);
        }

        let storage = self.db.read()?;
        let table = storage.get_table(&self.query.model)?;
        let meta = table.meta();

        let select = select_list(&self.query, meta);
        let order: Vec<Expr> = self
            .query
            .order_by
            .iter()
            .map(|order| self.query.resolve_ref(&order.lookup))
            .collect();

        let referenced = select
            .iter()
            .map(|(_, expr)| expr)
            .chain(self.query.filters.iter().map(|(expr, _)| expr))
            .chain(order.iter());
        for expr in referenced {
            for lookup in expr.lookups() {
                check_lookup(&storage, meta, lookup)?;
            }
        }

        let mut candidates: Vec<(i64, Vec<Value>)> = Vec::new();
        'rows: for row in table.scan() {
            for (expr, expected) in &self.query.filters {
                if evaluate(&storage, meta, row, expr)? != *expected {
                    continue 'rows;
                }
            }
            let keys = order
                .iter()
                .map(|expr| evaluate(&storage, meta, row, expr))
                .collect::<Result<Vec<_>>>()?;
            let id = row[0].as_i64().ok_or_else(|| {
                Error::TypeMismatch(format!("Row in '{}' has no integer id", meta.name()))
            })?;
            candidates.push((id, keys));
        }

        if !self.query.order_by.is_empty() {
            let mut error = None;
            candidates.sort_by(|(_, a), (_, b)| {
                for (idx, order) in self.query.order_by.iter().enumerate() {
                    match a[idx].compare(&b[idx]) {
                        Ok(Ordering::Equal) => continue,
                        Ok(ord) if order.descending => return ord.reverse(),
                        Ok(ord) => return ord,
                        Err(err) => {
                            error.get_or_insert(err);
                            return Ordering::Equal;
                        }
                    }
                }
                Ordering::Equal
            });
            if let Some(err) = error {
                return Err(err);
            }
        }

        Ok(ResultsIter {
            db: self.db.clone(),
            model: self.query.model.clone(),
            select: Arc::new(select),
            ids: candidates.into_iter().map(|(id, _)| id).collect(),
            position: 0,
            fetch,
            buffer: VecDeque::new(),
        })
    }
}

/// Pull-based stream of result rows. Consumed once.
pub struct ResultsIter {
    db: Database,
    model: String,
    select: Arc<Vec<(String, Expr)>>,
    ids: Vec<i64>,
    position: usize,
    fetch: FetchConfig,
    buffer: VecDeque<Row>,
}

impl ResultsIter {
    pub fn column_names(&self) -> Vec<String> {
        self.select.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Rows not yet yielded.
    pub fn remaining(&self) -> usize {
        self.buffer.len() + (self.ids.len() - self.position)
    }

    fn fill(&mut self) -> Result<()> {
        let end = if self.fetch.chunked_fetch {
            (self.position + self.fetch.chunk_size).min(self.ids.len())
        } else {
            self.ids.len()
        };

        let storage = self.db.read()?;
        let table = storage.get_table(&self.model)?;
        let meta = table.meta();

        for id in &self.ids[self.position..end] {
            let Some(row) = table.get(*id) else {
                continue;
            };
            let values = self
                .select
                .iter()
                .map(|(_, expr)| evaluate(&storage, meta, row, expr))
                .collect::<Result<Row>>()?;
            self.buffer.push_back(values);
        }

        trace!(
            "Fetched rows {}..{} of {} from '{}'",
            self.position,
            end,
            self.ids.len(),
            self.model
        );
        self.position = end;
        Ok(())
    }
}

impl Iterator for ResultsIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.buffer.pop_front() {
                return Some(Ok(row));
            }
            if self.position >= self.ids.len() {
                return None;
            }
            if let Err(err) = self.fill() {
                self.position = self.ids.len();
                return Some(Err(err));
            }
        }
    }
}

fn select_list(query: &Query, meta: &ModelMeta) -> Vec<(String, Expr)> {
    let mut select = query.extra_select.clone();
    if query.default_cols {
        select.extend(
            meta.schema()
                .columns()
                .iter()
                .map(|column| (column.attname(), Expr::col(column.attname()))),
        );
    } else {
        select.extend(
            query
                .values_select
                .iter()
                .map(|name| (name.clone(), Expr::col(name.as_str()))),
        );
    }
    select.extend(query.annotation_select.iter().cloned());
    select
}

fn check_lookup<'a>(storage: &'a InMemoryStorage, meta: &'a ModelMeta, lookup: &str) -> Result<()> {
    let parts: Vec<&str> = lookup.split("__").collect();
    let mut meta = meta;
    for (idx, part) in parts.iter().enumerate() {
        let column = meta
            .schema()
            .get_column(part)
            .ok_or_else(|| Error::ColumnNotFound(lookup.to_string(), meta.name().to_string()))?;
        if idx + 1 == parts.len() {
            return Ok(());
        }
        let target = column
            .references
            .as_deref()
            .ok_or_else(|| Error::ColumnNotFound(lookup.to_string(), meta.name().to_string()))?;
        meta = storage.get_table(target)?.meta();
    }
    Ok(())
}

fn resolve_lookup<'a>(
    storage: &'a InMemoryStorage,
    meta: &'a ModelMeta,
    row: &'a Row,
    lookup: &str,
) -> Result<Value> {
    let parts: Vec<&str> = lookup.split("__").collect();
    let (mut meta, mut row) = (meta, row);
    for (idx, part) in parts.iter().enumerate() {
        let position = meta
            .schema()
            .find_column_index(part)
            .ok_or_else(|| Error::ColumnNotFound(lookup.to_string(), meta.name().to_string()))?;
        if idx + 1 == parts.len() {
            return Ok(row[position].clone());
        }
        let target = meta.schema().columns()[position]
            .references
            .as_deref()
            .ok_or_else(|| Error::ColumnNotFound(lookup.to_string(), meta.name().to_string()))?;
        let table = storage.get_table(target)?;
        // Dangling or NULL keys behave like a LEFT OUTER JOIN miss.
        let related = match &row[position] {
            Value::Integer(id) => table.get(*id),
            _ => None,
        };
        match related {
            Some(related) => {
                meta = table.meta();
                row = related;
            }
            None => return Ok(Value::Null),
        }
    }
    Err(Error::ColumnNotFound(lookup.to_string(), meta.name().to_string()))
}

fn evaluate(storage: &InMemoryStorage, meta: &ModelMeta, row: &Row, expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Col(lookup) => resolve_lookup(storage, meta, row, lookup),
        Expr::Value(value) => Ok(value.clone()),
        Expr::JsonObject(pairs) => {
            let mut object = Map::new();
            for (key, expr) in pairs {
                object.insert(key.clone(), evaluate(storage, meta, row, expr)?.to_json());
            }
            Ok(Value::Json(JsonValue::Object(object)))
        }
    }
}

struct Join {
    path: String,
    alias: String,
    clause: String,
}

/// Renders queries as PostgreSQL-flavoured SQL.
struct SqlWriter<'a> {
    storage: &'a InMemoryStorage,
    base: &'a ModelMeta,
    joins: Vec<Join>,
}

impl<'a> SqlWriter<'a> {
    fn new(storage: &'a InMemoryStorage, base: &'a ModelMeta) -> Self {
        Self {
            storage,
            base,
            joins: Vec::new(),
        }
    }

    fn render(mut self, query: &Query) -> Result<String> {
        let mut columns = Vec::new();
        for (name, expr) in &query.extra_select {
            columns.push(format!("({}) AS \"{}\"", self.expr(expr)?, name));
        }
        if query.default_cols {
            for column in self.base.schema().columns() {
                columns.push(self.column(&column.attname())?);
            }
        } else {
            for name in &query.values_select {
                columns.push(self.column(name)?);
            }
        }
        for (name, expr) in &query.annotation_select {
            columns.push(format!("{} AS \"{}\"", self.expr(expr)?, name));
        }

        let mut conditions = Vec::new();
        for (expr, value) in &query.filters {
            let lhs = self.expr(expr)?;
            if value.is_null() {
                conditions.push(format!("{} IS NULL", lhs));
            } else {
                conditions.push(format!("{} = {}", lhs, sql_literal(value)));
            }
        }

        let mut ordering = Vec::new();
        for order in &query.order_by {
            let expr = self.expr(&query.resolve_ref(&order.lookup))?;
            let direction = if order.descending { "DESC" } else { "ASC" };
            ordering.push(format!("{} {}", expr, direction));
        }

        let mut sql = format!("SELECT {} FROM \"{}\"", columns.join(", "), self.base.name());
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.clause);
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        if !ordering.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&ordering.join(", "));
        }
        Ok(sql)
    }

    fn expr(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Col(lookup) => self.column(lookup),
            Expr::Value(value) => Ok(sql_literal(value)),
            Expr::JsonObject(pairs) => {
                let mut args = Vec::with_capacity(pairs.len() * 2);
                for (key, expr) in pairs {
                    args.push(format!("'{}'", key.replace('\'', "''")));
                    args.push(self.expr(expr)?);
                }
                Ok(format!("JSONB_BUILD_OBJECT({})", args.join(", ")))
            }
        }
    }

    fn column(&mut self, lookup: &str) -> Result<String> {
        let parts: Vec<&str> = lookup.split("__").collect();
        let mut meta = self.base;
        let mut alias = self.base.name().to_string();
        let mut path = String::new();

        for (idx, part) in parts.iter().enumerate() {
            let column = meta
                .schema()
                .get_column(part)
                .ok_or_else(|| Error::ColumnNotFound(lookup.to_string(), meta.name().to_string()))?;
            if idx + 1 == parts.len() {
                return Ok(format!("\"{}\".\"{}\"", alias, column.attname()));
            }
            let target = column
                .references
                .clone()
                .ok_or_else(|| Error::ColumnNotFound(lookup.to_string(), meta.name().to_string()))?;

            if !path.is_empty() {
                path.push_str("__");
            }
            path.push_str(part);

            let joined = match self.joins.iter().find(|join| join.path == path) {
                Some(join) => join.alias.clone(),
                None => {
                    let taken = target == self.base.name()
                        || self.joins.iter().any(|join| join.alias == target);
                    let join_alias = if taken {
                        format!("T{}", self.joins.len() + 2)
                    } else {
                        target.clone()
                    };
                    let table_ref = if join_alias == target {
                        format!("\"{}\"", target)
                    } else {
                        format!("\"{}\" \"{}\"", target, join_alias)
                    };
                    let clause = format!(
                        "LEFT OUTER JOIN {} ON (\"{}\".\"{}\" = \"{}\".\"id\")",
                        table_ref,
                        alias,
                        column.attname(),
                        join_alias
                    );
                    self.joins.push(Join {
                        path: path.clone(),
                        alias: join_alias.clone(),
                        clause,
                    });
                    join_alias
                }
            };

            alias = joined;
            meta = self.storage.get_table(&target)?.meta();
        }
        Err(Error::ColumnNotFound(lookup.to_string(), meta.name().to_string()))
    }
}

fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Text(v) => format!("'{}'", v.replace('\'', "''")),
        Value::Boolean(true) => "TRUE".to_string(),
        Value::Boolean(false) => "FALSE".to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(sql_literal).collect();
            format!("ARRAY[{}]", items.join(", "))
        }
        Value::Json(json) => format!("'{}'::jsonb", json.to_string().replace('\'', "''")),
    }
}
