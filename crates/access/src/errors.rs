#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Unknown role '{role}' for schema '{schema}'. Declared roles are: {known:?}")]
    UnknownRole {
        role: String,
        schema: String,
        known: Vec<String>,
    },

    #[error("Role name '{0}' is not a recognized access tier")]
    UnknownTier(String),

    #[error("Permission mutation failed: {source}")]
    MutationFailed {
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("Failed to read membership state: {source}")]
    ReadFailed {
        #[source]
        source: tokio_postgres::Error,
    },
}

impl AccessError {
    pub fn mutation(source: tokio_postgres::Error) -> AccessError {
        AccessError::MutationFailed { source }
    }

    pub fn read(source: tokio_postgres::Error) -> AccessError {
        AccessError::ReadFailed { source }
    }
}

pub type Result<T, E = AccessError> = std::result::Result<T, E>;
