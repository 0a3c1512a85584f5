//! Secret indirection.
//!
//! Passwords never travel in resource properties; the properties carry keys
//! into a secret store and [`expand`] swaps them for values at request time.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::UnresolvedConfig;
use crate::error::ProvisionError;
use crate::model::{ConnectionConfig, RuntimeConfig, UserConfig};

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("secret {0:?} not found")]
    NotFound(String),

    #[error("secret lookup cancelled")]
    Cancelled,

    #[error("secret backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// The one capability provisioning needs from a secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    /// Returns a [`SecretStoreError`] if the key is unknown, the backend
    /// fails, or `cancel` fires first.
    async fn get_secret(
        &self,
        cancel: &CancellationToken,
        key: &str,
        with_decryption: bool,
    ) -> Result<String, SecretStoreError>;
}

#[async_trait]
impl<T: SecretStore + ?Sized> SecretStore for Arc<T> {
    async fn get_secret(
        &self,
        cancel: &CancellationToken,
        key: &str,
        with_decryption: bool,
    ) -> Result<String, SecretStoreError> {
        (**self).get_secret(cancel, key, with_decryption).await
    }
}

#[async_trait]
impl<T: SecretStore + ?Sized> SecretStore for &T {
    async fn get_secret(
        &self,
        cancel: &CancellationToken,
        key: &str,
        with_decryption: bool,
    ) -> Result<String, SecretStoreError> {
        (**self).get_secret(cancel, key, with_decryption).await
    }
}

/// Which password a secret reference stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef {
    UserPassword,
    SuperUserPassword,
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretRef::UserPassword => f.write_str("user password"),
            SecretRef::SuperUserPassword => f.write_str("super user password"),
        }
    }
}

/// Resolve both password references of `config`.
///
/// The user password is fetched first, then the privileged password. Both
/// lookups request decryption and both must succeed.
///
/// # Errors
/// Returns [`ProvisionError::SecretResolution`] naming the reference that
/// failed.
pub async fn expand<S>(
    store: &S,
    cancel: &CancellationToken,
    config: UnresolvedConfig,
) -> Result<RuntimeConfig, ProvisionError>
where
    S: SecretStore + ?Sized,
{
    let user_password = lookup(
        store,
        cancel,
        SecretRef::UserPassword,
        &config.user.password_parameter,
    )
    .await?;
    let connection_password = lookup(
        store,
        cancel,
        SecretRef::SuperUserPassword,
        &config.connection.password_parameter,
    )
    .await?;

    Ok(RuntimeConfig {
        database_name: config.database_name,
        user: UserConfig {
            name: config.user.name,
            password: user_password,
        },
        connection: ConnectionConfig {
            host: config.connection.host,
            port: config.connection.port,
            user: config.connection.user,
            password: connection_password,
        },
        extensions: config.extensions,
    })
}

async fn lookup<S>(
    store: &S,
    cancel: &CancellationToken,
    reference: SecretRef,
    key: &str,
) -> Result<String, ProvisionError>
where
    S: SecretStore + ?Sized,
{
    debug!(parameter = key, %reference, "loading secret");
    store
        .get_secret(cancel, key, true)
        .await
        .map_err(|source| ProvisionError::SecretResolution {
            reference,
            key: key.to_string(),
            source,
        })
}

/// In-memory secret store.
///
/// Values are held as plaintext, so `with_decryption` has nothing to do.
#[derive(Clone, Default)]
pub struct StaticSecretStore {
    values: HashMap<String, String>,
}

impl StaticSecretStore {
    #[must_use]
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Load a JSON object of `key -> value` strings.
    ///
    /// # Errors
    /// Returns [`SecretStoreError::Io`] if the file cannot be read and
    /// [`SecretStoreError::Json`] if it is not a flat string map.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SecretStoreError> {
        let raw = std::fs::read_to_string(path)?;
        let values: HashMap<String, String> = serde_json::from_str(&raw)?;
        Ok(Self { values })
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl fmt::Debug for StaticSecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSecretStore")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_secret(
        &self,
        cancel: &CancellationToken,
        key: &str,
        _with_decryption: bool,
    ) -> Result<String, SecretStoreError> {
        if cancel.is_cancelled() {
            return Err(SecretStoreError::Cancelled);
        }
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| SecretStoreError::NotFound(key.to_string()))
    }
}
