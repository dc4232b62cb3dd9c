use access::quote_ident;
use futures::future::BoxFuture;
use tokio_postgres::{Client, NoTls, Transaction};
use tracing::debug;

use crate::config::ConnectOptions;
use crate::errors::{EngineError, Result};

/// One connection to the backing postgres instance.
///
/// Each concurrent caller connects on its own; there is no pooling here.
// TODO: Connection pooling.
pub struct Engine {
    client: Client,
}

impl Engine {
    pub async fn connect(opts: &ConnectOptions) -> Result<Engine> {
        let conn_str = opts.connection_string();
        let (client, connection) = tokio_postgres::connect(&conn_str, NoTls)
            .await
            .map_err(EngineError::connect)?;

        // Drive the connection until the engine hangs up.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!(%e, "postgres connection errored");
            }
        });

        Ok(Engine { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Run `work` inside one transaction: commit on `Ok`, roll back on
    /// `Err`. Either every effect of `work` is visible afterwards or none
    /// is.
    pub async fn transaction<T, F>(&mut self, work: F) -> Result<T>
    where
        F: for<'t> FnOnce(&'t Transaction<'_>) -> BoxFuture<'t, Result<T>>,
    {
        self.transaction_inner(None, work).await
    }

    /// Like [`transaction`](Engine::transaction), impersonating `role` for
    /// the duration of the transaction.
    pub async fn transaction_as<T, F>(&mut self, role: &str, work: F) -> Result<T>
    where
        F: for<'t> FnOnce(&'t Transaction<'_>) -> BoxFuture<'t, Result<T>>,
    {
        self.transaction_inner(Some(role), work).await
    }

    async fn transaction_inner<T, F>(&mut self, role: Option<&str>, work: F) -> Result<T>
    where
        F: for<'t> FnOnce(&'t Transaction<'_>) -> BoxFuture<'t, Result<T>>,
    {
        let tx = self
            .client
            .transaction()
            .await
            .map_err(EngineError::transaction)?;

        if let Some(role) = role {
            // LOCAL scope expires with the transaction, commit or rollback;
            // no reset statement needed.
            tx.execute(&format!("SET LOCAL ROLE {}", quote_ident(role)), &[])
                .await
                .map_err(EngineError::transaction)?;
        }

        match work(&tx).await {
            Ok(value) => {
                tx.commit().await.map_err(EngineError::transaction)?;
                Ok(value)
            }
            Err(err) => {
                // Surface the work's error; a failed rollback only gets
                // logged.
                if let Err(e) = tx.rollback().await {
                    debug!(%e, "rollback failed");
                }
                Err(err)
            }
        }
    }
}
