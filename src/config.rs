use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::Value;

/// Resource properties as delivered by the lifecycle transport, before any
/// secret reference has been resolved.
///
/// The schema is closed: every struct rejects fields it does not know, so a
/// typo or a renamed property fails loudly instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
pub struct UnresolvedConfig {
    /// Echoed by the transport; unused by provisioning.
    #[serde(default)]
    pub service_token: String,
    pub database_name: String,
    pub user: UserParameters,
    pub connection: ConnectionParameters,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
pub struct UserParameters {
    pub name: String,
    /// Secret store key holding the new role's password.
    pub password_parameter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
pub struct ConnectionParameters {
    pub host: String,
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    pub user: String,
    /// Secret store key holding the privileged user's password.
    pub password_parameter: String,
}

impl UnresolvedConfig {
    /// Decode raw resource properties.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if a required field is missing, a value
    /// has the wrong type, or the input carries an unknown field.
    pub fn decode(raw: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(raw)
    }

    /// Identifier reported to the lifecycle tracker: `<host>/<database>`.
    #[must_use]
    pub fn physical_id(&self) -> String {
        format!("{}/{}", self.connection.host, self.database_name)
    }
}

/// Best-effort `<host>/<database>` for properties that failed to decode.
#[must_use]
pub fn physical_id_hint(raw: &Value) -> String {
    let host = raw
        .get("Connection")
        .and_then(|c| c.get("Host"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let database = raw
        .get("DatabaseName")
        .and_then(Value::as_str)
        .unwrap_or_default();
    format!("{host}/{database}")
}

// Lifecycle transports commonly stringify every scalar, so the port is the
// one field accepted both as a number and as a decimal string.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    struct PortVisitor;

    impl Visitor<'_> for PortVisitor {
        type Value = u16;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a port number between 0 and 65535, as an integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u16, E> {
            u16::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u16, E> {
            u16::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u16, E> {
            v.trim()
                .parse::<u16>()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(PortVisitor)
}
