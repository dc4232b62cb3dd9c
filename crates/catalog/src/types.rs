use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{CatalogError, Result};

/// Declared value type of a column.
///
/// Reference columns carry the type of the column they target (typically
/// [`Uuid`](ColumnType::Uuid) for identity-keyed targets).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Bool,
    Int,
    Decimal,
    Text,
    Uuid,
    Date,
    Timestamp,
}

/// Relationship kind of a column.
///
/// Closed set; the query compiler matches on this exhaustively so a new kind
/// fails compilation everywhere it needs handling instead of being silently
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnKind {
    /// Ordinary value column.
    Plain,
    /// Single reference to one row of `table`, matched on `column`.
    Ref { table: String, column: String },
    /// Array-valued reference to many rows of `table`.
    RefArray { table: String, column: String },
    /// Many-to-many reference realized through a link table. When
    /// `join_table` is absent the name is derived as
    /// `<owning-table>_<column>`.
    Mref {
        table: String,
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        join_table: Option<String>,
    },
}

impl ColumnKind {
    pub fn is_reference(&self) -> bool {
        match self {
            ColumnKind::Plain => false,
            ColumnKind::Ref { .. } | ColumnKind::RefArray { .. } | ColumnKind::Mref { .. } => true,
        }
    }

    /// Table a reference kind targets, if any.
    pub fn ref_table(&self) -> Option<&str> {
        match self {
            ColumnKind::Plain => None,
            ColumnKind::Ref { table, .. }
            | ColumnKind::RefArray { table, .. }
            | ColumnKind::Mref { table, .. } => Some(table),
        }
    }

    /// Column on the target table a reference kind matches on, if any.
    pub fn ref_column(&self) -> Option<&str> {
        match self {
            ColumnKind::Plain => None,
            ColumnKind::Ref { column, .. }
            | ColumnKind::RefArray { column, .. }
            | ColumnKind::Mref { column, .. } => Some(column),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ctype: ColumnType,
    #[serde(flatten)]
    pub kind: ColumnKind,
}

impl Column {
    pub fn plain(name: impl Into<String>, ctype: ColumnType) -> Column {
        Column {
            name: name.into(),
            ctype,
            kind: ColumnKind::Plain,
        }
    }

    pub fn reference(
        name: impl Into<String>,
        ctype: ColumnType,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Column {
        Column {
            name: name.into(),
            ctype,
            kind: ColumnKind::Ref {
                table: table.into(),
                column: column.into(),
            },
        }
    }

    pub fn reference_array(
        name: impl Into<String>,
        ctype: ColumnType,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Column {
        Column {
            name: name.into(),
            ctype,
            kind: ColumnKind::RefArray {
                table: table.into(),
                column: column.into(),
            },
        }
    }

    pub fn many_to_many(
        name: impl Into<String>,
        ctype: ColumnType,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Column {
        Column {
            name: name.into(),
            ctype,
            kind: ColumnKind::Mref {
                table: table.into(),
                column: column.into(),
                join_table: None,
            },
        }
    }

    /// Name of the link table backing this column if it's a many-to-many
    /// reference.
    pub fn mref_join_table(&self, owner: &str) -> Option<String> {
        match &self.kind {
            ColumnKind::Mref { join_table, .. } => Some(
                join_table
                    .clone()
                    .unwrap_or_else(|| format!("{}_{}", owner, self.name)),
            ),
            ColumnKind::Plain | ColumnKind::Ref { .. } | ColumnKind::RefArray { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    primary_key: Vec<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Table {
        Table {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: Column) -> Table {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Table {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| CatalogError::UnknownColumn {
            table: self.name.clone(),
            column: name.to_string(),
        })
    }

    /// Ordinary value columns, in declaration order.
    pub fn plain_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|c| matches!(c.kind, ColumnKind::Plain))
    }
}

/// In-memory description of one logical schema.
///
/// Insertion order of tables is preserved; it drives the deterministic
/// ordering of everything derived from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    name: String,
    tables: IndexMap<String, Table>,
}

impl SchemaCatalog {
    pub fn new(name: impl Into<String>) -> SchemaCatalog {
        SchemaCatalog {
            name: name.into(),
            tables: IndexMap::new(),
        }
    }

    pub fn add_table(&mut self, table: Table) -> Result<()> {
        if self.tables.contains_key(table.name()) {
            return Err(CatalogError::DuplicateTable {
                schema: self.name.clone(),
                table: table.name().to_string(),
            });
        }
        self.tables.insert(table.name().to_string(), table);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn require_table(&self, name: &str) -> Result<&Table> {
        self.table(name).ok_or_else(|| CatalogError::UnknownTable {
            schema: self.name.clone(),
            table: name.to_string(),
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|s| s.as_str())
    }

    /// Check every catalog invariant: unique column names, resolvable
    /// reference targets (table and column), and primary key columns that
    /// exist.
    pub fn validate(&self) -> Result<()> {
        for table in self.tables.values() {
            for (idx, column) in table.columns().iter().enumerate() {
                if table.columns()[..idx].iter().any(|c| c.name == column.name) {
                    return Err(CatalogError::DuplicateColumn {
                        table: table.name().to_string(),
                        column: column.name.clone(),
                    });
                }

                if let Some(target) = column.kind.ref_table() {
                    let target_table = self.table(target).ok_or_else(|| {
                        CatalogError::UnknownRefTable {
                            table: table.name().to_string(),
                            column: column.name.clone(),
                            target: target.to_string(),
                        }
                    })?;

                    let target_column = column.kind.ref_column().expect("reference kind");
                    // The identity column is implicit on every managed table.
                    if target_column != crate::ROW_ID
                        && target_table.column(target_column).is_none()
                    {
                        return Err(CatalogError::UnknownRefColumn {
                            table: table.name().to_string(),
                            column: column.name.clone(),
                            target: target.to_string(),
                            target_column: target_column.to_string(),
                        });
                    }
                }
            }

            for key in table.primary_key() {
                if table.column(key).is_none() {
                    return Err(CatalogError::UnknownKeyColumn {
                        table: table.name().to_string(),
                        column: key.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
