use crate::core::{FieldType, Value};

/// A query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column lookup. Related columns are reached through foreign keys
    /// with `__`, e.g. `album__name`.
    Col(String),
    /// A literal value.
    Value(Value),
    /// `jsonb_build_object` over named sub-expressions, in order.
    JsonObject(Vec<(String, Expr)>),
}

impl Expr {
    pub fn col(lookup: impl Into<String>) -> Self {
        Self::Col(lookup.into())
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Attaches an output field that decodes the evaluated value.
    pub fn output_field<F: FieldType>(self, field: F) -> Typed<F> {
        Typed { expr: self, field }
    }

    /// All column lookups referenced by this expression.
    pub fn lookups(&self) -> Vec<&str> {
        let mut lookups = Vec::new();
        self.collect_lookups(&mut lookups);
        lookups
    }

    fn collect_lookups<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Col(lookup) => out.push(lookup),
            Self::Value(_) => {}
            Self::JsonObject(pairs) => {
                for (_, expr) in pairs {
                    expr.collect_lookups(out);
                }
            }
        }
    }
}

/// An expression together with the field type its result is decoded by.
#[derive(Debug, Clone)]
pub struct Typed<F> {
    pub expr: Expr,
    pub field: F,
}

/// Shorthand for [`Expr::col`].
pub fn col(lookup: impl Into<String>) -> Expr {
    Expr::col(lookup)
}

/// Shorthand for [`Expr::value`].
pub fn val(value: impl Into<Value>) -> Expr {
    Expr::value(value)
}
