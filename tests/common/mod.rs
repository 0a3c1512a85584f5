#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pg_provisioner::prelude::*;
use serde_json::{Value, json};
use tokio_postgres::error::SqlState;

/// Secret store that records every lookup.
#[derive(Default)]
pub struct RecordingSecretStore {
    values: HashMap<String, String>,
    calls: Mutex<Vec<(String, bool)>>,
}

impl RecordingSecretStore {
    pub fn with(values: &[(&str, &str)]) -> Self {
        Self {
            values: values
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretStore for RecordingSecretStore {
    async fn get_secret(
        &self,
        cancel: &CancellationToken,
        key: &str,
        with_decryption: bool,
    ) -> Result<String, SecretStoreError> {
        self.calls
            .lock()
            .unwrap()
            .push((key.to_string(), with_decryption));
        if cancel.is_cancelled() {
            return Err(SecretStoreError::Cancelled);
        }
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| SecretStoreError::NotFound(key.to_string()))
    }
}

/// One observable interaction with the fake server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect { user: String, database: Option<String> },
    Execute { database: Option<String>, sql: String },
    Close { database: Option<String> },
}

#[derive(Default)]
struct ServerState {
    events: Vec<Event>,
    databases: BTreeSet<String>,
    extensions: BTreeMap<String, Vec<String>>,
    broken_extensions: BTreeSet<String>,
    failures: Vec<(String, SqlState)>,
    refuse_connections: bool,
}

/// In-process stand-in for a PostgreSQL server.
///
/// Records connects, statements and closes in order, tracks which databases
/// and extensions exist, and can be told to fail statements.
#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(self, name: &str) -> Self {
        self.state.lock().unwrap().databases.insert(name.to_string());
        self
    }

    /// Extensions whose creation fails as if the control file were missing.
    pub fn with_broken_extension(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .broken_extensions
            .insert(name.to_string());
        self
    }

    /// Fail every statement containing `needle` with `code`.
    pub fn failing_statements(self, needle: &str, code: SqlState) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((needle.to_string(), code));
        self
    }

    pub fn refusing_connections(self) -> Self {
        self.state.lock().unwrap().refuse_connections = true;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Execute { sql, .. } => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn connects(&self) -> Vec<Option<String>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Connect { database, .. } => Some(database),
                _ => None,
            })
            .collect()
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.state.lock().unwrap().databases.contains(name)
    }

    pub fn extensions_in(&self, database: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .extensions
            .get(database)
            .cloned()
            .unwrap_or_default()
    }

    /// Open a session directly, bypassing any connector bookkeeping.
    pub fn session(&self, database: Option<&str>) -> FakeSession {
        FakeSession {
            database: database.map(str::to_string),
            state: Arc::clone(&self.state),
        }
    }
}

#[async_trait]
impl Connector for FakeServer {
    async fn connect(
        &self,
        cancel: &CancellationToken,
        config: &ConnectionConfig,
        database: Option<&str>,
    ) -> Result<Box<dyn Session>, SqlError> {
        if cancel.is_cancelled() {
            return Err(SqlError::Cancelled);
        }
        {
            let mut state = self.state.lock().unwrap();
            if state.refuse_connections {
                return Err(SqlError::Server {
                    code: SqlState::INVALID_PASSWORD,
                    message: format!("password authentication failed for user \"{}\"", config.user),
                });
            }
            state.events.push(Event::Connect {
                user: config.user.clone(),
                database: database.map(str::to_string),
            });
        }
        Ok(Box::new(self.session(database)))
    }
}

pub struct FakeSession {
    database: Option<String>,
    state: Arc<Mutex<ServerState>>,
}

fn unquote(token: &str) -> String {
    token
        .trim()
        .trim_start_matches('"')
        .trim_end_matches('"')
        .replace("\"\"", "\"")
}

#[async_trait]
impl Session for FakeSession {
    async fn execute(&self, cancel: &CancellationToken, statement: &str) -> Result<(), SqlError> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Execute {
            database: self.database.clone(),
            sql: statement.to_string(),
        });
        if cancel.is_cancelled() {
            return Err(SqlError::Cancelled);
        }
        if let Some((_, code)) = state
            .failures
            .iter()
            .find(|(needle, _)| statement.contains(needle.as_str()))
        {
            return Err(SqlError::Server {
                code: code.clone(),
                message: format!("injected failure for {statement:?}"),
            });
        }

        if let Some(rest) = statement.strip_prefix("CREATE DATABASE ") {
            let name = unquote(rest.split(" OWNER ").next().unwrap_or_default());
            if !state.databases.insert(name.clone()) {
                return Err(SqlError::Server {
                    code: SqlState::DUPLICATE_DATABASE,
                    message: format!("database \"{name}\" already exists"),
                });
            }
        } else if let Some(rest) = statement.strip_prefix("CREATE EXTENSION IF NOT EXISTS ") {
            let name = unquote(rest);
            if state.broken_extensions.contains(&name) {
                return Err(SqlError::Server {
                    code: SqlState::UNDEFINED_FILE,
                    message: format!("extension \"{name}\" is not available"),
                });
            }
            let database = self.database.clone().unwrap_or_default();
            let installed = state.extensions.entry(database).or_default();
            if !installed.contains(&name) {
                installed.push(name);
            }
        }
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.events.push(Event::Close {
                database: self.database.clone(),
            });
        }
    }
}

pub fn scenario_properties() -> Value {
    json!({
        "ServiceToken": "arn:aws:lambda:eu-central-1:123456789012:function:pg-provisioner",
        "DatabaseName": "app",
        "User": {"Name": "appuser", "PasswordParameter": "/p/u"},
        "Connection": {
            "Host": "db.local",
            "Port": 5432,
            "User": "admin",
            "PasswordParameter": "/p/a"
        },
        "Extensions": ["uuid-ossp"]
    })
}

pub fn scenario_secrets() -> RecordingSecretStore {
    RecordingSecretStore::with(&[("/p/u", "userpass"), ("/p/a", "adminpass")])
}

pub fn admin_connection() -> ConnectionConfig {
    ConnectionConfig {
        host: "db.local".into(),
        port: 5432,
        user: "admin".into(),
        password: "adminpass".into(),
    }
}
