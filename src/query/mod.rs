pub mod compiler;
pub mod expr;
pub mod iterable;
#[allow(clippy::module_inception)]
pub mod query;
pub mod queryset;

pub use compiler::{Compiler, ResultsIter};
pub use expr::{Expr, Typed, col, val};
pub use iterable::{FlatTypedIterable, Iterable, ModelIterable, ValuesIterable, ValuesRow};
pub use query::{OrderBy, Query};
pub use queryset::QuerySet;
