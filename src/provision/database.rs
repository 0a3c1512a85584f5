use async_trait::async_trait;
use tokio_postgres::error::SqlState;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::Session;
use crate::error::{ProvisionError, SqlError};
use crate::postgres::quote::quote_identifier;

/// How a database owned by a given role gets created on the target server.
#[async_trait]
pub trait DatabaseStrategy: Send + Sync {
    /// Create `database` owned by `owner`, connected as `super_user`.
    /// Must succeed when the database already exists.
    ///
    /// # Errors
    /// Returns [`ProvisionError::Grant`] or
    /// [`ProvisionError::DatabaseCreation`] depending on the failing step.
    async fn create_database_owned_by(
        &self,
        cancel: &CancellationToken,
        session: &dyn Session,
        super_user: &str,
        database: &str,
        owner: &str,
    ) -> Result<(), ProvisionError>;
}

/// Grant the owner role to the connected user, then create the database.
///
/// Managed offerings such as RDS do not hand out a real superuser, and the
/// server only lets a member of a role create a database owned by it.
/// `CREATE DATABASE` cannot run inside a transaction, so the two steps are
/// separate statements and "already exists" (42P04) counts as success.
///
/// TODO: an existing database whose owner lacks access is neither detected
/// nor repaired.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantThenCreate;

#[must_use]
pub fn grant_role_statement(role: &str, member: &str) -> String {
    format!("GRANT {} TO {}", quote_identifier(role), quote_identifier(member))
}

#[must_use]
pub fn create_database_statement(database: &str, owner: &str) -> String {
    format!(
        "CREATE DATABASE {} OWNER {}",
        quote_identifier(database),
        quote_identifier(owner)
    )
}

fn is_duplicate_database(err: &SqlError) -> bool {
    err.code() == Some(&SqlState::DUPLICATE_DATABASE)
}

#[async_trait]
impl DatabaseStrategy for GrantThenCreate {
    async fn create_database_owned_by(
        &self,
        cancel: &CancellationToken,
        session: &dyn Session,
        super_user: &str,
        database: &str,
        owner: &str,
    ) -> Result<(), ProvisionError> {
        session
            .execute(cancel, &grant_role_statement(owner, super_user))
            .await
            .map_err(|source| ProvisionError::Grant {
                role: owner.to_string(),
                super_user: super_user.to_string(),
                source,
            })?;

        match session
            .execute(cancel, &create_database_statement(database, owner))
            .await
        {
            Ok(()) => Ok(()),
            Err(err) if is_duplicate_database(&err) => {
                info!(db_name = database, "database already exists");
                Ok(())
            }
            Err(source) => Err(ProvisionError::DatabaseCreation {
                database: database.to_string(),
                owner: owner.to_string(),
                source,
            }),
        }
    }
}
