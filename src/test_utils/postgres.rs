use postgresql_embedded::PostgreSQL;
use tokio_util::sync::CancellationToken;

use crate::model::ConnectionConfig;
use crate::postgres::PostgresConnector;
use crate::provision::{Session, connect_privileged};

/// Represents a running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub port: u16,
    /// Superuser credentials for the instance
    pub admin: ConnectionConfig,
}

/// Set up and start an embedded `PostgreSQL` instance.
///
/// # Errors
/// Returns an error if the embedded server cannot be set up or started, or
/// if the post-start connectivity check fails.
pub async fn setup_postgres_embedded() -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    let mut postgresql = PostgreSQL::default();

    // Bundled binaries, no download
    postgresql.setup().await?;
    postgresql.start().await?;

    let settings = postgresql.settings();
    let port = settings.port;
    let admin = ConnectionConfig {
        host: settings.host.clone(),
        port,
        user: settings.username.clone(),
        password: settings.password.clone(),
    };

    // Quick connection test
    let cancel = CancellationToken::new();
    let session = connect_privileged(&PostgresConnector::new(), &cancel, &admin).await?;
    session.execute(&cancel, "SELECT 1").await?;
    drop(session);

    Ok(EmbeddedPostgres {
        postgresql,
        port,
        admin,
    })
}

/// Stop a previously started embedded `PostgreSQL` instance.
pub async fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    let _ = postgresql.stop().await;
}

/// Run a query returning one text column per row, as the embedded superuser
/// connected to `database`.
///
/// # Errors
/// Returns an error if connecting or querying fails.
pub async fn query_strings(
    admin: &ConnectionConfig,
    database: Option<&str>,
    sql: &str,
    params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let pg = PostgresConnector::new().pg_config(admin, database);
    let (client, connection) = pg.connect(tokio_postgres::NoTls).await?;
    let driver = tokio::spawn(connection);
    let rows = client.query(sql, params).await?;
    drop(client);
    let _ = driver.await;
    Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
}
