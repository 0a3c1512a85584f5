/// Test utilities for provisioning against a real `PostgreSQL` server
pub mod postgres;

pub use postgres::*;
