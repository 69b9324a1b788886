use crate::core::FieldType;
use crate::query::{Expr, Typed};

/// Builds a JSON object from named expressions.
///
/// Objects nest, and record columns referenced inside are embedded as JSON
/// rather than as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonObject {
    pairs: Vec<(String, Expr)>,
}

impl JsonObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key. Setting an existing key again replaces its expression.
    pub fn field(mut self, key: impl Into<String>, expr: impl Into<Expr>) -> Self {
        let key = key.into();
        let expr = expr.into();
        match self.pairs.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = expr,
            None => self.pairs.push((key, expr)),
        }
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(key, _)| key.as_str())
    }

    pub fn output_field<F: FieldType>(self, field: F) -> Typed<F> {
        Expr::from(self).output_field(field)
    }
}

impl From<JsonObject> for Expr {
    fn from(object: JsonObject) -> Self {
        Expr::JsonObject(object.pairs)
    }
}
