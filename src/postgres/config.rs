use std::time::Duration;

use async_trait::async_trait;
use tokio_postgres::{Config as PgConfig, NoTls};
use tokio_util::sync::CancellationToken;

use super::session::PgSession;
use crate::error::SqlError;
use crate::model::ConnectionConfig;
use crate::provision::{Connector, Session};

/// [`Connector`] for PostgreSQL over `tokio-postgres`.
///
/// Connections are made without TLS.
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    application_name: String,
    connect_timeout: Option<Duration>,
}

impl Default for PostgresConnector {
    fn default() -> Self {
        Self {
            application_name: env!("CARGO_PKG_NAME").to_string(),
            connect_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl PostgresConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// `None` waits for the operating system's TCP timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Connection target for `config`, optionally scoped to `database`.
    #[must_use]
    pub fn pg_config(&self, config: &ConnectionConfig, database: Option<&str>) -> PgConfig {
        let mut pg = PgConfig::new();
        pg.host(&config.host)
            .port(config.port)
            .user(&config.user)
            .password(&config.password)
            .application_name(&self.application_name);
        if let Some(timeout) = self.connect_timeout {
            pg.connect_timeout(timeout);
        }
        if let Some(database) = database {
            pg.dbname(database);
        }
        pg
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn connect(
        &self,
        cancel: &CancellationToken,
        config: &ConnectionConfig,
        database: Option<&str>,
    ) -> Result<Box<dyn Session>, SqlError> {
        let pg = self.pg_config(config, database);
        let (client, connection) = tokio::select! {
            res = pg.connect(NoTls) => res?,
            () = cancel.cancelled() => return Err(SqlError::Cancelled),
        };
        Ok(Box::new(PgSession::spawn(client, connection)))
    }
}
