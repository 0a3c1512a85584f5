//! Lifecycle entry point: Create/Update provision, Delete acknowledges.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{ProvisionError, ProvisionFailure};
use crate::provision::Connector;
use crate::secrets::SecretStore;
use crate::service::Provisioner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestType::Create => "Create",
            RequestType::Update => "Update",
            RequestType::Delete => "Delete",
        })
    }
}

impl FromStr for RequestType {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Create" => Ok(RequestType::Create),
            "Update" => Ok(RequestType::Update),
            "Delete" => Ok(RequestType::Delete),
            other => Err(ProvisionError::UnsupportedRequestType(other.to_string())),
        }
    }
}

/// A lifecycle event as delivered by the trigger transport. Fields the
/// provisioner has no use for are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    /// Kept as text so unknown types surface as
    /// [`ProvisionError::UnsupportedRequestType`] rather than a parse error.
    pub request_type: String,
    #[serde(default)]
    pub resource_properties: Value,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub stack_id: Option<String>,
    #[serde(default)]
    pub logical_resource_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// What the transport reports back for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleResponse {
    pub status: ResponseStatus,
    pub physical_resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,
}

impl<S, C> Provisioner<S, C>
where
    S: SecretStore,
    C: Connector,
{
    /// Dispatch one lifecycle request.
    ///
    /// Create and Update provision; Delete returns `physical_resource_id`
    /// unchanged without touching the secret store or the server.
    ///
    /// # Errors
    /// Returns a [`ProvisionFailure`] from [`Provisioner::provision`].
    pub async fn handle_request(
        &self,
        cancel: &CancellationToken,
        request_type: RequestType,
        properties: &Value,
        physical_resource_id: Option<&str>,
    ) -> Result<String, ProvisionFailure> {
        match request_type {
            RequestType::Create | RequestType::Update => self.provision(cancel, properties).await,
            RequestType::Delete => {
                let id = physical_resource_id.unwrap_or_default().to_string();
                info!(physical_id = %id, "delete requested, leaving database in place");
                Ok(id)
            }
        }
    }

    /// Handle a full event and build the response for the transport.
    pub async fn respond(&self, cancel: &CancellationToken, event: LifecycleEvent) -> LifecycleResponse {
        info!(request_type = %event.request_type, request_id = ?event.request_id, "triggered by new event");

        let physical_id = event.physical_resource_id.as_deref();
        let outcome = match event.request_type.parse::<RequestType>() {
            Ok(request_type) => {
                self.handle_request(cancel, request_type, &event.resource_properties, physical_id)
                    .await
            }
            Err(e) => Err(ProvisionFailure::new(physical_id.unwrap_or_default(), e)),
        };

        let (status, physical_resource_id, reason) = match outcome {
            Ok(id) => (ResponseStatus::Success, id, None),
            Err(failure) => {
                let reason = failure.reason();
                (ResponseStatus::Failed, failure.physical_id, Some(reason))
            }
        };
        LifecycleResponse {
            status,
            physical_resource_id,
            reason,
            request_id: event.request_id,
            stack_id: event.stack_id,
            logical_resource_id: event.logical_resource_id,
        }
    }
}
