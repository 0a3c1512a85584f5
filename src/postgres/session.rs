use async_trait::async_trait;
use tokio_postgres::tls::NoTlsStream;
use tokio_postgres::{Client, Connection, NoTls, Socket};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SqlError;
use crate::provision::Session;

/// A single `tokio-postgres` connection.
///
/// The connection driver runs on its own task. Dropping the session drops
/// the client, after which the driver sends `Terminate` and finishes, so the
/// socket is closed cleanly on every exit path.
pub struct PgSession {
    client: Client,
}

impl PgSession {
    pub(crate) fn spawn(client: Client, connection: Connection<Socket, NoTlsStream>) -> Self {
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("postgres connection closed with error: {e}");
            }
        });
        Self { client }
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        debug!("closing postgres connection");
    }
}

#[async_trait]
impl Session for PgSession {
    async fn execute(&self, cancel: &CancellationToken, statement: &str) -> Result<(), SqlError> {
        tokio::select! {
            res = self.client.batch_execute(statement) => res.map_err(SqlError::from),
            () = cancel.cancelled() => {
                // Best effort: ask the server to stop working on the statement.
                if let Err(e) = self.client.cancel_token().cancel_query(NoTls).await {
                    warn!("sending cancel request failed: {e}");
                }
                Err(SqlError::Cancelled)
            }
        }
    }
}
