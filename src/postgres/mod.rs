// PostgreSQL backend:
// - config: connection targets and the `Connector` implementation
// - session: a single connection implementing `Session`
// - quote: identifier and literal quoting for DDL

pub mod config;
pub mod quote;
pub mod session;

pub use config::PostgresConnector;
pub use quote::{quote_identifier, quote_literal};
pub use session::PgSession;
