use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown field \"{field}\" on record \"{record}\"")]
    UnknownField { field: String, record: String },

    #[error("Missing field \"{field}\" on record \"{record}\"")]
    MissingField { field: String, record: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("The annotation '{0}' conflicts with a field on the model")]
    FieldConflict(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("{0} matching query does not exist")]
    DoesNotExist(String),

    #[error("get() returned more than one {0} -- it returned {1}")]
    MultipleObjectsReturned(String, usize),

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
