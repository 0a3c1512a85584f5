pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod postgres;
pub mod prelude;
pub mod provision;
pub mod secrets;
pub mod service;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use error::{ProvisionError, ProvisionFailure, SqlError};
pub use lifecycle::{LifecycleEvent, LifecycleResponse, RequestType, ResponseStatus};
pub use service::Provisioner;
