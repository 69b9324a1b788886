use super::Expr;
use crate::core::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub lookup: String,
    pub descending: bool,
}

impl OrderBy {
    /// Parses `"name"` / `"-name"`.
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(lookup) => Self {
                lookup: lookup.to_string(),
                descending: true,
            },
            None => Self {
                lookup: spec.to_string(),
                descending: false,
            },
        }
    }
}

/// Description of a query against one model.
///
/// Result rows are laid out as extra-select columns, then either every model
/// column (`default_cols`) or the values-select columns, then annotations.
#[derive(Debug, Clone)]
pub struct Query {
    pub model: String,
    pub extra_select: Vec<(String, Expr)>,
    pub default_cols: bool,
    pub values_select: Vec<String>,
    pub annotation_select: Vec<(String, Expr)>,
    pub filters: Vec<(Expr, Value)>,
    pub order_by: Vec<OrderBy>,
}

impl Query {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            extra_select: Vec::new(),
            default_cols: true,
            values_select: Vec::new(),
            annotation_select: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn annotation(&self, name: &str) -> Option<&Expr> {
        self.annotation_select
            .iter()
            .find(|(alias, _)| alias == name)
            .map(|(_, expr)| expr)
    }

    pub fn extra(&self, name: &str) -> Option<&Expr> {
        self.extra_select
            .iter()
            .find(|(alias, _)| alias == name)
            .map(|(_, expr)| expr)
    }

    /// Resolves a name against the selected aliases before falling back to a
    /// column lookup.
    pub fn resolve_ref(&self, name: &str) -> Expr {
        self.annotation(name)
            .or_else(|| self.extra(name))
            .cloned()
            .unwrap_or_else(|| Expr::col(name))
    }
}
