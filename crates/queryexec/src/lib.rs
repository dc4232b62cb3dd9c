//! Metadata-driven query compilation and execution.
//!
//! Callers build a [`Query`] (selected field paths, filters, sort, search)
//! against one root table, [`compile`] resolves it against a
//! [`SchemaCatalog`](catalog::SchemaCatalog) into a parameterized SQL
//! statement, and [`execute`] runs it on any postgres client or transaction,
//! materializing rows keyed by `/`-joined field paths.

pub mod errors;

mod compile;
mod exec;
mod path;
mod query;
mod value;

pub use compile::{compile, CompiledField, CompiledQuery};
pub use exec::{execute, retrieve_as, Row};
pub use path::Path;
pub use query::{Operator, Query, Sort, SortOrder, Where};
pub use value::Value;
