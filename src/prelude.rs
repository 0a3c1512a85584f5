//! Convenient imports for common functionality.
//!
//! Everything needed to wire a [`Provisioner`] and feed it lifecycle events.

pub use crate::config::UnresolvedConfig;
pub use crate::error::{ProvisionError, ProvisionFailure, SqlError};
pub use crate::lifecycle::{LifecycleEvent, LifecycleResponse, RequestType, ResponseStatus};
pub use crate::model::{ConnectionConfig, RuntimeConfig, UserConfig};
pub use crate::postgres::PostgresConnector;
pub use crate::provision::{Connector, DatabaseStrategy, GrantThenCreate, Session};
pub use crate::secrets::{SecretStore, SecretStoreError, StaticSecretStore};
pub use crate::service::Provisioner;

pub use tokio_util::sync::CancellationToken;
