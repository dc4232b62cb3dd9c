//! Engine client, scoped transactions, and the top-level platform surface.
//!
//! [`Database`] owns one engine connection; [`SchemaHandle`] scopes it to a
//! logical schema's catalog and exposes query retrieval plus role
//! membership management. All membership mutation runs through
//! [`Engine::transaction`], the one scoped-transaction primitive: commit on
//! normal return, roll back on any error, no partial effects either way.

pub mod errors;

mod config;
mod database;
mod engine;

pub use config::ConnectOptions;
pub use database::{Database, SchemaHandle};
pub use engine::Engine;
pub use errors::EngineError;

// The platform surface in one import.
pub use access::{Member, Role};
pub use catalog::{Column, ColumnKind, ColumnType, SchemaCatalog, Table};
pub use queryexec::{Operator, Query, Row, Value};
