use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{Connector, Session};
use crate::error::ProvisionError;
use crate::model::ConnectionConfig;

/// Open the administrative connection used for role and database creation.
/// No application database is selected.
///
/// # Errors
/// Returns [`ProvisionError::Connection`] if the server cannot be reached.
pub async fn connect_privileged<C>(
    connector: &C,
    cancel: &CancellationToken,
    config: &ConnectionConfig,
) -> Result<Box<dyn Session>, ProvisionError>
where
    C: Connector + ?Sized,
{
    open(connector, cancel, config, None).await
}

/// Open a connection scoped to `database`, with the same credentials as the
/// privileged connection.
///
/// # Errors
/// Returns [`ProvisionError::Connection`] if the server cannot be reached or
/// the database does not accept the connection.
pub async fn connect_database<C>(
    connector: &C,
    cancel: &CancellationToken,
    config: &ConnectionConfig,
    database: &str,
) -> Result<Box<dyn Session>, ProvisionError>
where
    C: Connector + ?Sized,
{
    open(connector, cancel, config, Some(database)).await
}

async fn open<C>(
    connector: &C,
    cancel: &CancellationToken,
    config: &ConnectionConfig,
    database: Option<&str>,
) -> Result<Box<dyn Session>, ProvisionError>
where
    C: Connector + ?Sized,
{
    debug!(host = %config.host, port = config.port, user = %config.user, database, "connecting");
    connector
        .connect(cancel, config, database)
        .await
        .map_err(|source| ProvisionError::Connection {
            host: config.host.clone(),
            port: config.port,
            database: database.map(str::to_string),
            source,
        })
}
