// Provisioning steps, each issuing plain SQL over a `Session`:
// - connect: privileged and database-scoped connections
// - role: idempotent login role creation
// - database: grant-then-create database ownership
// - extension: ordered, fail-fast extension creation

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SqlError;
use crate::model::ConnectionConfig;

pub mod connect;
pub mod database;
pub mod extension;
pub mod role;

pub use connect::{connect_database, connect_privileged};
pub use database::{DatabaseStrategy, GrantThenCreate};
pub use extension::ensure_extensions;
pub use role::ensure_role;

/// An open server connection able to run statements one at a time.
///
/// Statements run outside any explicit transaction. Dropping the session
/// releases the underlying connection.
#[async_trait]
pub trait Session: Send + Sync {
    /// Run `statement` with the simple query protocol.
    ///
    /// # Errors
    /// Returns [`SqlError::Server`] for server-reported failures,
    /// [`SqlError::Client`] for transport failures, and
    /// [`SqlError::Cancelled`] if `cancel` fires first.
    async fn execute(&self, cancel: &CancellationToken, statement: &str) -> Result<(), SqlError>;
}

/// Opens sessions against a server.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect with the credentials in `config`. `database` selects the
    /// target database; `None` uses the server default for the user.
    ///
    /// # Errors
    /// Returns a [`SqlError`] if the connection cannot be established or
    /// `cancel` fires first.
    async fn connect(
        &self,
        cancel: &CancellationToken,
        config: &ConnectionConfig,
        database: Option<&str>,
    ) -> Result<Box<dyn Session>, SqlError>;
}

#[async_trait]
impl<T: Connector + ?Sized> Connector for std::sync::Arc<T> {
    async fn connect(
        &self,
        cancel: &CancellationToken,
        config: &ConnectionConfig,
        database: Option<&str>,
    ) -> Result<Box<dyn Session>, SqlError> {
        (**self).connect(cancel, config, database).await
    }
}
