//! `gateway-cleanup`: delete the gateway and its authorizer.

use crate::config::{GatewayConfig, load_gateway_config};
use crate::control::GatewayControl;
use crate::error::Result;
use std::path::Path;

/// Delete the remote resources recorded in `config_path`. The artifact itself is left alone.
pub async fn decommission<C>(control: &C, config_path: &Path) -> Result<GatewayConfig>
where
    C: GatewayControl + ?Sized,
{
    let config = load_gateway_config(config_path)?;
    tracing::info!(gateway_id = %config.gateway_id, "deleting gateway");
    control
        .delete_gateway(&config.gateway_id, &config.client_info)
        .await?;
    Ok(config)
}
