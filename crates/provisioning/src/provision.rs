//! `gateway-setup`: authorizer -> gateway -> permissions -> default target -> artifact.

use crate::config::{GatewayConfig, save_gateway_config};
use crate::control::{GatewayControl, GatewayHandle, GatewaySpec, TargetHandle};
use crate::error::Result;
use crate::target::TargetDescriptor;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Fixed wait after fixing the auto-created role, for IAM propagation.
pub const PERMISSION_SETTLE: Duration = Duration::from_secs(30);

pub const DEFAULT_AUTHORIZER_NAME: &str = "TestGateway";

#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    /// Recorded in the artifact for later steps.
    pub region: String,
    /// Logical name of the authorizer (also its OAuth resource server id).
    pub authorizer_name: String,
    pub gateway_name: Option<String>,
    pub role_arn: Option<String>,
    pub enable_semantic_search: bool,
    pub settle: Duration,
}

impl ProvisionOptions {
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            authorizer_name: DEFAULT_AUTHORIZER_NAME.to_string(),
            gateway_name: None,
            role_arn: None,
            enable_semantic_search: true,
            settle: PERMISSION_SETTLE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Provisioned {
    pub config: GatewayConfig,
    pub gateway: GatewayHandle,
    pub default_target: TargetHandle,
}

/// Run the whole setup sequence and write the artifact to `config_path`.
///
/// Any failure stops the sequence. Resources created before the failure are left in place and
/// the artifact is not written.
pub async fn provision<C>(
    control: &C,
    options: &ProvisionOptions,
    config_path: &Path,
) -> Result<Provisioned>
where
    C: GatewayControl + ?Sized,
{
    info!(authorizer = %options.authorizer_name, "creating OAuth authorizer");
    let authorizer = control
        .create_oauth_authorizer(&options.authorizer_name)
        .await?;
    info!(client_id = %authorizer.client_info.client_id, "authorizer created");

    info!("creating gateway");
    let gateway = control
        .create_gateway(&GatewaySpec {
            name: options.gateway_name.clone(),
            role_arn: options.role_arn.clone(),
            description: Some("Gateway provisioned by gateway-setup".to_string()),
            authorizer: authorizer.authorizer.clone(),
            enable_semantic_search: options.enable_semantic_search,
        })
        .await?;
    info!(gateway_id = %gateway.gateway_id, gateway_url = %gateway.gateway_url, "gateway created");

    if options.role_arn.is_none() {
        control.fix_permissions(&gateway).await?;
        info!(
            settle_secs = options.settle.as_secs(),
            "waiting for IAM propagation"
        );
        tokio::time::sleep(options.settle).await;
        info!("IAM permissions configured");
    }

    info!("adding Lambda target");
    let default_target = control
        .create_target(&gateway, &TargetDescriptor::managed_function())
        .await?;
    info!(target_id = %default_target.target_id, name = %default_target.name, "Lambda target added");

    let config = GatewayConfig {
        gateway_url: gateway.gateway_url.clone(),
        gateway_id: gateway.gateway_id.clone(),
        region: options.region.clone(),
        client_info: authorizer.client_info,
    };
    save_gateway_config(config_path, &config)?;
    info!(path = %config_path.display(), "configuration saved");

    Ok(Provisioned {
        config,
        gateway,
        default_target,
    })
}
