use access::{quote_ident, Member, Role};
use catalog::SchemaCatalog;
use queryexec::{Query, Row};
use tokio_postgres::types::FromSql;
use tokio_postgres::Transaction;
use tracing::info;

use crate::config::ConnectOptions;
use crate::engine::Engine;
use crate::errors::{EngineError, Result};

/// Top-level handle on the platform: one engine connection, many logical
/// schemas multiplexed inside it.
pub struct Database {
    engine: Engine,
}

impl Database {
    pub fn new(engine: Engine) -> Database {
        Database { engine }
    }

    pub async fn connect(opts: &ConnectOptions) -> Result<Database> {
        Ok(Database {
            engine: Engine::connect(opts).await?,
        })
    }

    pub fn engine(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Create the native schema and provision its role hierarchy, in one
    /// transaction.
    pub async fn create_schema(&mut self, name: &str) -> Result<()> {
        let schema = name.to_string();
        self.engine
            .transaction(move |tx: &Transaction<'_>| {
                Box::pin(async move {
                    tx.execute(
                        &format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(&schema)),
                        &[],
                    )
                    .await
                    .map_err(EngineError::transaction)?;
                    access::provision_schema_roles(tx, &schema).await?;
                    Ok(())
                })
            })
            .await?;
        info!(%name, "created schema");
        Ok(())
    }

    /// Drop the native schema and every role principal belonging to it, in
    /// one transaction.
    pub async fn drop_schema(&mut self, name: &str) -> Result<()> {
        let schema = name.to_string();
        self.engine
            .transaction(move |tx: &Transaction<'_>| {
                Box::pin(async move {
                    tx.execute(
                        &format!("DROP SCHEMA IF EXISTS {} CASCADE", quote_ident(&schema)),
                        &[],
                    )
                    .await
                    .map_err(EngineError::transaction)?;
                    access::drop_schema_roles(tx, &schema).await?;
                    Ok(())
                })
            })
            .await?;
        info!(%name, "dropped schema");
        Ok(())
    }

    /// Scope this connection to one schema's catalog snapshot.
    pub fn schema<'a>(&'a mut self, catalog: &'a SchemaCatalog) -> SchemaHandle<'a> {
        SchemaHandle {
            engine: &mut self.engine,
            catalog,
        }
    }
}

/// One logical schema: its catalog snapshot plus the connection to run
/// against. Queries execute directly; membership changes run inside one
/// transaction each.
pub struct SchemaHandle<'a> {
    engine: &'a mut Engine,
    catalog: &'a SchemaCatalog,
}

impl SchemaHandle<'_> {
    pub fn catalog(&self) -> &SchemaCatalog {
        self.catalog
    }

    pub fn name(&self) -> &str {
        self.catalog.name()
    }

    /// Start a query against one of this schema's tables.
    pub fn query(&self, table: &str) -> Query {
        Query::new(table)
    }

    /// Compile and run a query, materializing rows keyed by field path.
    pub async fn retrieve(&self, query: &Query) -> Result<Vec<Row>> {
        let compiled = queryexec::compile(self.catalog, query)?;
        let rows = queryexec::execute(self.engine.client(), &compiled).await?;
        Ok(rows)
    }

    /// Compile and run a query shaped to a single column, mapped into `T`.
    pub async fn retrieve_as<T>(&self, query: &Query, column: &str) -> Result<Vec<T>>
    where
        T: for<'r> FromSql<'r>,
    {
        let values =
            queryexec::retrieve_as(self.engine.client(), self.catalog, query, column).await?;
        Ok(values)
    }

    /// Roles declared for this schema.
    pub async fn roles(&self) -> Result<Vec<Role>> {
        let roles = access::list_roles(self.engine.client(), self.catalog.name()).await?;
        Ok(roles)
    }

    /// Current membership, recomputed from the engine's role catalog.
    pub async fn members(&self) -> Result<Vec<Member>> {
        let members = access::list_members(self.engine.client(), self.catalog.name()).await?;
        Ok(members)
    }

    /// The single role `user` holds here, if any.
    pub async fn role_of(&self, user: &str) -> Result<Option<Role>> {
        let role = access::role_of(self.engine.client(), self.catalog.name(), user).await?;
        Ok(role)
    }

    pub async fn add_member(&mut self, user: &str, role: Role) -> Result<()> {
        self.add_members(vec![Member::new(user, role)]).await
    }

    /// Grant each member its role, atomically: validation failures and
    /// engine rejections alike roll back the entire call.
    pub async fn add_members(&mut self, members: Vec<Member>) -> Result<()> {
        let schema = self.catalog.name().to_string();
        self.engine
            .transaction(move |tx: &Transaction<'_>| {
                Box::pin(async move {
                    access::add_members(tx, &schema, &members).await?;
                    Ok(())
                })
            })
            .await
    }

    /// Revoke the membership of every listed user; absent users are
    /// skipped.
    pub async fn remove_members(&mut self, members: Vec<Member>) -> Result<()> {
        let schema = self.catalog.name().to_string();
        self.engine
            .transaction(move |tx: &Transaction<'_>| {
                Box::pin(async move {
                    access::remove_members(tx, &schema, &members).await?;
                    Ok(())
                })
            })
            .await
    }

    /// Revoke whatever role `user` currently holds. A no-op when they hold
    /// none.
    pub async fn remove_member(&mut self, user: &str) -> Result<()> {
        match self.role_of(user).await? {
            Some(role) => self.remove_members(vec![Member::new(user, role)]).await,
            None => Ok(()),
        }
    }

    /// Ensure the full role hierarchy exists for this schema.
    pub async fn provision_roles(&mut self) -> Result<()> {
        let schema = self.catalog.name().to_string();
        self.engine
            .transaction(move |tx: &Transaction<'_>| {
                Box::pin(async move {
                    access::provision_schema_roles(tx, &schema).await?;
                    Ok(())
                })
            })
            .await
    }
}
