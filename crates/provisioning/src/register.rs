//! `gateway-add-openapi`: register a converted `OpenAPI` description as a gateway target.

use crate::config::load_gateway_config;
use crate::control::{GatewayControl, TargetHandle};
use crate::error::{ProvisioningError, Result};
use crate::target::{CredentialInjection, TargetDescriptor};
use std::path::Path;

/// Read a JSON API description and return it re-serialized for an inline payload.
pub fn read_description(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| ProvisioningError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: serde_json::Value = serde_json::from_slice(&bytes).map_err(|source| {
        ProvisioningError::MalformedDescription {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(serde_json::to_string(&doc)?)
}

/// Register `description_path` against the gateway recorded in `config_path`.
///
/// The artifact is only read. Registration errors are returned as the provider reported them.
pub async fn register_openapi_target<C>(
    control: &C,
    config_path: &Path,
    description_path: &Path,
    credentials: CredentialInjection,
    name: Option<String>,
) -> Result<TargetHandle>
where
    C: GatewayControl + ?Sized,
{
    let config = load_gateway_config(config_path)?;
    let document = read_description(description_path)?;

    let target = TargetDescriptor::openapi_inline(document, Some(credentials)).with_name(name);
    target.validate()?;

    let gateway = control.get_gateway(&config.gateway_id).await?;
    let handle = control.create_target(&gateway, &target).await?;
    tracing::info!(
        gateway_id = %gateway.gateway_id,
        target_id = %handle.target_id,
        name = %handle.name,
        "OpenAPI target added"
    );
    Ok(handle)
}
