#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Catalog(#[from] catalog::errors::CatalogError),

    #[error(transparent)]
    Query(#[from] queryexec::errors::QueryError),

    #[error(transparent)]
    Access(#[from] access::errors::AccessError),

    #[error("Failed to connect to postgres: {source}")]
    Connect {
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("Transaction failed: {source}")]
    Transaction {
        #[source]
        source: tokio_postgres::Error,
    },
}

impl EngineError {
    pub fn connect(source: tokio_postgres::Error) -> EngineError {
        EngineError::Connect { source }
    }

    pub fn transaction(source: tokio_postgres::Error) -> EngineError {
        EngineError::Transaction { source }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
