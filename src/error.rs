use std::error::Error as StdError;

use thiserror::Error;
use tokio_postgres::error::SqlState;

use crate::secrets::{SecretRef, SecretStoreError};

/// Failure of a single statement or connection attempt against the server.
#[derive(Debug, Error)]
pub enum SqlError {
    /// The server answered with an error response.
    #[error("{message} (SQLSTATE {})", .code.code())]
    Server { code: SqlState, message: String },

    /// Transport, protocol or client-side failure.
    #[error(transparent)]
    Client(tokio_postgres::Error),

    #[error("statement cancelled")]
    Cancelled,
}

impl SqlError {
    /// SQLSTATE reported by the server, if the server produced this error.
    #[must_use]
    pub fn code(&self) -> Option<&SqlState> {
        match self {
            SqlError::Server { code, .. } => Some(code),
            SqlError::Client(_) | SqlError::Cancelled => None,
        }
    }
}

impl From<tokio_postgres::Error> for SqlError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.as_db_error() {
            Some(db) => SqlError::Server {
                code: db.code().clone(),
                message: db.message().to_string(),
            },
            None => SqlError::Client(err),
        }
    }
}

/// Stage-level provisioning failure.
///
/// Messages name the stage and its identifiers; the cause is kept as the
/// error source so a printed chain shows each cause once.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("decoding resource properties failed")]
    Schema(#[from] serde_json::Error),

    #[error("loading parameter {key:?} for the {reference} failed")]
    SecretResolution {
        reference: SecretRef,
        key: String,
        #[source]
        source: SecretStoreError,
    },

    #[error("connecting to postgres at {host}:{port}{} failed", database_suffix(.database.as_deref()))]
    Connection {
        host: String,
        port: u16,
        database: Option<String>,
        #[source]
        source: SqlError,
    },

    #[error("creating role {role:?} failed")]
    RoleProvisioning {
        role: String,
        #[source]
        source: SqlError,
    },

    #[error("granting role {role:?} to superuser {super_user:?} failed")]
    Grant {
        role: String,
        super_user: String,
        #[source]
        source: SqlError,
    },

    #[error("creating database {database:?} owned by {owner:?} failed")]
    DatabaseCreation {
        database: String,
        owner: String,
        #[source]
        source: SqlError,
    },

    #[error("creating extension {extension:?} in database {database:?} failed")]
    Extension {
        extension: String,
        database: String,
        #[source]
        source: SqlError,
    },

    #[error("unsupported request type {0:?}")]
    UnsupportedRequestType(String),
}

fn database_suffix(database: Option<&str>) -> String {
    database.map(|db| format!("/{db}")).unwrap_or_default()
}

/// A failed request together with the identifier reported back to the
/// lifecycle tracker.
#[derive(Debug, Error)]
#[error("provisioning {physical_id} failed")]
pub struct ProvisionFailure {
    pub physical_id: String,
    #[source]
    pub error: ProvisionError,
}

impl ProvisionFailure {
    #[must_use]
    pub fn new(physical_id: impl Into<String>, error: ProvisionError) -> Self {
        Self {
            physical_id: physical_id.into(),
            error,
        }
    }

    /// Full cause chain joined by `": "`.
    #[must_use]
    pub fn reason(&self) -> String {
        let mut parts = vec![self.error.to_string()];
        let mut current: Option<&(dyn StdError + 'static)> = self.error.source();
        while let Some(cause) = current {
            parts.push(cause.to_string());
            current = cause.source();
        }
        parts.join(": ")
    }
}
