use tokio_util::sync::CancellationToken;
use tracing::info;

use super::Session;
use crate::error::ProvisionError;
use crate::postgres::quote::quote_identifier;

#[must_use]
pub fn create_extension_statement(name: &str) -> String {
    format!("CREATE EXTENSION IF NOT EXISTS {}", quote_identifier(name))
}

/// Create each extension in `names`, in order, inside the database the
/// session is connected to. Stops at the first failure; extensions created
/// before it stay in place.
///
/// # Errors
/// Returns [`ProvisionError::Extension`] naming the failing extension.
pub async fn ensure_extensions(
    cancel: &CancellationToken,
    session: &dyn Session,
    database: &str,
    names: &[String],
) -> Result<(), ProvisionError> {
    for name in names {
        session
            .execute(cancel, &create_extension_statement(name))
            .await
            .map_err(|source| ProvisionError::Extension {
                extension: name.clone(),
                database: database.to_string(),
                source,
            })?;
        info!(db_name = database, extension = %name, "extension ensured");
    }
    Ok(())
}
