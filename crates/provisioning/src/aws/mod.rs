//! [`GatewayControl`] backed by the AWS SDK (Cognito, IAM, Lambda, Bedrock `AgentCore`).
//!
//! Credentials and region come from an explicit [`SdkConfig`]; nothing here reads or mutates
//! process-wide AWS state.

mod cognito;
mod gateway;
mod iam;
mod lambda;

use crate::config::ClientInfo;
use crate::control::{
    AuthorizerSetup, GatewayControl, GatewayHandle, GatewaySpec, TargetHandle,
};
use crate::error::{ProvisioningError, Result};
use crate::target::{TargetDescriptor, TargetPayload, TargetType};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_smithy_types::error::display::DisplayErrorContext;
use std::time::Duration;

pub use lambda::{DEMO_FUNCTION_NAME, demo_tools};

/// Resolve credentials for `profile` (or the default chain) in `region`.
pub async fn load_sdk_config(region: &str, profile: Option<&str>) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    loader.load().await
}

/// Waits inside multi-resource operations. Both are fixed sleeps.
#[derive(Debug, Clone, Copy)]
pub struct AwsSettle {
    /// After creating the demo function's execution role, before creating the function.
    pub lambda_role: Duration,
    /// After deleting targets, before deleting the gateway.
    pub target_deletion: Duration,
}

impl Default for AwsSettle {
    fn default() -> Self {
        Self {
            lambda_role: Duration::from_secs(10),
            target_deletion: Duration::from_secs(5),
        }
    }
}

pub struct AwsGatewayControl {
    region: String,
    settle: AwsSettle,
    cognito: aws_sdk_cognitoidentityprovider::Client,
    iam: aws_sdk_iam::Client,
    lambda: aws_sdk_lambda::Client,
    agentcore: aws_sdk_bedrockagentcorecontrol::Client,
}

impl AwsGatewayControl {
    /// # Errors
    ///
    /// Fails if `sdk` carries no region.
    pub fn new(sdk: &SdkConfig) -> Result<Self> {
        let region = sdk
            .region()
            .map(ToString::to_string)
            .ok_or_else(|| ProvisioningError::Provider("no AWS region configured".to_string()))?;
        Ok(Self {
            region,
            settle: AwsSettle::default(),
            cognito: aws_sdk_cognitoidentityprovider::Client::new(sdk),
            iam: aws_sdk_iam::Client::new(sdk),
            lambda: aws_sdk_lambda::Client::new(sdk),
            agentcore: aws_sdk_bedrockagentcorecontrol::Client::new(sdk),
        })
    }

    #[must_use]
    pub fn with_settle(mut self, settle: AwsSettle) -> Self {
        self.settle = settle;
        self
    }
}

#[async_trait]
impl GatewayControl for AwsGatewayControl {
    async fn create_oauth_authorizer(&self, name: &str) -> Result<AuthorizerSetup> {
        cognito::create_authorizer(&self.cognito, &self.region, name).await
    }

    async fn create_gateway(&self, spec: &GatewaySpec) -> Result<GatewayHandle> {
        let role_arn = match &spec.role_arn {
            Some(arn) => arn.clone(),
            None => iam::ensure_gateway_role(&self.iam).await?,
        };
        let name = spec
            .name
            .clone()
            .unwrap_or_else(|| format!("TestGateway{}", random_suffix()));
        gateway::create_gateway(&self.agentcore, spec, &name, &role_arn).await
    }

    async fn get_gateway(&self, gateway_id: &str) -> Result<GatewayHandle> {
        gateway::get_gateway(&self.agentcore, gateway_id).await
    }

    async fn fix_permissions(&self, gateway: &GatewayHandle) -> Result<()> {
        let role_arn = gateway.role_arn.as_deref().ok_or_else(|| {
            ProvisioningError::Provider(format!(
                "gateway '{}' reports no execution role",
                gateway.gateway_id
            ))
        })?;
        iam::fix_gateway_role(&self.iam, &self.region, role_arn).await
    }

    async fn create_target(
        &self,
        gateway: &GatewayHandle,
        target: &TargetDescriptor,
    ) -> Result<TargetHandle> {
        target.validate()?;
        let name = target
            .name
            .clone()
            .unwrap_or_else(|| format!("TestGatewayTarget{}", random_suffix()));

        if target.target_type == TargetType::ManagedFunction && target.payload.is_none() {
            let function_arn =
                lambda::ensure_demo_function(&self.lambda, &self.iam, self.settle.lambda_role)
                    .await?;
            let mut target = target.clone();
            target.payload = Some(TargetPayload::Lambda {
                function_arn,
                tools: demo_tools(),
            });
            return gateway::create_target(&self.agentcore, gateway, &target, &name).await;
        }
        gateway::create_target(&self.agentcore, gateway, target, &name).await
    }

    async fn delete_gateway(&self, gateway_id: &str, client: &ClientInfo) -> Result<()> {
        gateway::delete_gateway(&self.agentcore, gateway_id, self.settle.target_deletion).await?;
        cognito::delete_authorizer(&self.cognito, client).await
    }
}

/// Eight lowercase hex characters.
fn random_suffix() -> String {
    let mut s = uuid::Uuid::new_v4().simple().to_string();
    s.truncate(8);
    s
}

/// Wrap an SDK error with the operation name, keeping the full provider message.
fn provider_error<E>(operation: &'static str) -> impl FnOnce(E) -> ProvisioningError
where
    E: std::error::Error,
{
    move |e| ProvisioningError::Provider(format!("{operation}: {}", DisplayErrorContext(e)))
}

fn build_error(e: impl std::fmt::Display) -> ProvisioningError {
    ProvisioningError::Provider(format!("invalid request: {e}"))
}
