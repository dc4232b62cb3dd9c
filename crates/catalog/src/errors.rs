#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Table '{table}' not found in schema '{schema}'")]
    UnknownTable { schema: String, table: String },

    #[error("Column '{column}' not found on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Duplicate table '{table}' in schema '{schema}'")]
    DuplicateTable { schema: String, table: String },

    #[error("Duplicate column '{column}' on table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Reference column '{table}.{column}' targets unknown table '{target}'")]
    UnknownRefTable {
        table: String,
        column: String,
        target: String,
    },

    #[error("Reference column '{table}.{column}' targets unknown column '{target}.{target_column}'")]
    UnknownRefColumn {
        table: String,
        column: String,
        target: String,
        target_column: String,
    },

    #[error("Primary key column '{column}' does not exist on table '{table}'")]
    UnknownKeyColumn { table: String, column: String },
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
