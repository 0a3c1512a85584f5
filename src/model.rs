use std::fmt;

/// Fully materialized configuration for one request.
///
/// Holds plaintext passwords, so `Debug` redacts them and nothing in this
/// crate serializes it.
#[derive(Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub database_name: String,
    pub user: UserConfig,
    pub connection: ConnectionConfig,
    pub extensions: Vec<String>,
}

/// Privileged connection used for role and database creation.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

/// Login role to create; also the owner of the new database.
#[derive(Clone, PartialEq, Eq)]
pub struct UserConfig {
    pub name: String,
    pub password: String,
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("database_name", &self.database_name)
            .field("user", &self.user)
            .field("connection", &self.connection)
            .field("extensions", &self.extensions)
            .finish()
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &REDACTED)
            .finish()
    }
}

impl fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserConfig")
            .field("name", &self.name)
            .field("password", &REDACTED)
            .finish()
    }
}
