#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A path segment couldn't be resolved as a column (or, mid-path, as a
    /// reference column) of the table reached so far.
    #[error("Unresolved path segment '{segment}' on table '{table}'")]
    UnresolvedPath { segment: String, table: String },

    #[error("Unsupported predicate '{operator}' for path '{path}'")]
    UnsupportedPredicate { operator: String, path: String },

    #[error("Value {value} cannot be used as {expected:?} for column '{column}'")]
    InvalidValue {
        value: String,
        expected: catalog::ColumnType,
        column: String,
    },

    #[error(transparent)]
    Catalog(#[from] catalog::errors::CatalogError),

    #[error("Query execution failed: {source}")]
    Execution {
        #[source]
        source: tokio_postgres::Error,
    },
}

impl QueryError {
    pub fn execution(source: tokio_postgres::Error) -> QueryError {
        QueryError::Execution { source }
    }
}

pub type Result<T, E = QueryError> = std::result::Result<T, E>;
