use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, error, info, info_span};

use crate::config::{UnresolvedConfig, physical_id_hint};
use crate::error::{ProvisionError, ProvisionFailure};
use crate::provision::{
    Connector, DatabaseStrategy, GrantThenCreate, connect_database, connect_privileged,
    ensure_extensions, ensure_role,
};
use crate::secrets::{SecretStore, expand};

/// Provisions a role, a database owned by it, and the database's
/// extensions from one set of resource properties.
///
/// Every collaborator is handed in at construction; nothing is read from
/// process-wide state.
pub struct Provisioner<S, C> {
    secrets: S,
    connector: C,
    databases: Box<dyn DatabaseStrategy>,
    span: Span,
}

impl<S, C> Provisioner<S, C>
where
    S: SecretStore,
    C: Connector,
{
    /// Uses [`GrantThenCreate`] for database creation and the caller's
    /// current span as the parent of every request span.
    pub fn new(secrets: S, connector: C) -> Self {
        Self {
            secrets,
            connector,
            databases: Box::new(GrantThenCreate),
            span: Span::current(),
        }
    }

    #[must_use]
    pub fn with_database_strategy(mut self, strategy: impl DatabaseStrategy + 'static) -> Self {
        self.databases = Box::new(strategy);
        self
    }

    /// Parent span for request logging.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Run the full provisioning sequence for `properties`.
    ///
    /// Returns `<host>/<database>` on success. On failure the same
    /// identifier, as far as it can be derived, travels with the error.
    ///
    /// # Errors
    /// Returns a [`ProvisionFailure`] wrapping the first failing stage.
    pub async fn provision(
        &self,
        cancel: &CancellationToken,
        properties: &Value,
    ) -> Result<String, ProvisionFailure> {
        let unresolved = match UnresolvedConfig::decode(properties) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!(parent: &self.span, error = %e, resource_properties = %properties, "decoding config failed");
                return Err(ProvisionFailure::new(
                    physical_id_hint(properties),
                    ProvisionError::Schema(e),
                ));
            }
        };
        let physical_id = unresolved.physical_id();

        let span = info_span!(parent: &self.span, "provision", physical_id = %physical_id);
        match self.run(cancel, unresolved).instrument(span).await {
            Ok(()) => Ok(physical_id),
            Err(e) => Err(ProvisionFailure::new(physical_id, e)),
        }
    }

    async fn run(
        &self,
        cancel: &CancellationToken,
        unresolved: UnresolvedConfig,
    ) -> Result<(), ProvisionError> {
        let cfg = expand(&self.secrets, cancel, unresolved).await?;

        let admin = connect_privileged(&self.connector, cancel, &cfg.connection).await?;

        info!(user = %cfg.user.name, "creating user");
        ensure_role(cancel, admin.as_ref(), &cfg.user.name, &cfg.user.password).await?;

        info!(db_name = %cfg.database_name, "creating database");
        self.databases
            .create_database_owned_by(
                cancel,
                admin.as_ref(),
                &cfg.connection.user,
                &cfg.database_name,
                &cfg.user.name,
            )
            .await?;

        // Release the privileged connection before opening a second one.
        drop(admin);

        info!(db_name = %cfg.database_name, user = %cfg.user.name, "created user and database");

        if cfg.extensions.is_empty() {
            return Ok(());
        }
        let db = connect_database(&self.connector, cancel, &cfg.connection, &cfg.database_name)
            .await?;
        ensure_extensions(cancel, db.as_ref(), &cfg.database_name, &cfg.extensions).await
    }
}
