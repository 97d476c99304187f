#![allow(dead_code)]

use agentcore_gateway_provisioning::ClientInfo;
use agentcore_gateway_provisioning::control::{
    AuthorizerConfig, AuthorizerSetup, GatewayControl, GatewayHandle, GatewaySpec, TargetHandle,
};
use agentcore_gateway_provisioning::error::{ProvisioningError, Result};
use agentcore_gateway_provisioning::target::TargetDescriptor;
use async_trait::async_trait;
use parking_lot::Mutex;

/// One provider call, as seen by [`RecordingControl`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateAuthorizer(String),
    CreateGateway { role_arn: Option<String>, semantic: bool },
    GetGateway(String),
    FixPermissions(String),
    CreateTarget(TargetDescriptor),
    DeleteGateway { gateway_id: String, client_id: String, user_pool_id: String },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateAuthorizer(_) => "create_oauth_authorizer",
            Self::CreateGateway { .. } => "create_gateway",
            Self::GetGateway(_) => "get_gateway",
            Self::FixPermissions(_) => "fix_permissions",
            Self::CreateTarget(_) => "create_target",
            Self::DeleteGateway { .. } => "delete_gateway",
        }
    }
}

/// In-memory provider that logs every call and can fail one of them.
#[derive(Default)]
pub struct RecordingControl {
    calls: Mutex<Vec<Call>>,
    fail_on: Option<&'static str>,
}

impl RecordingControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the call named `operation` (see [`Call::name`]) with a provider error.
    pub fn failing_on(operation: &'static str) -> Self {
        Self {
            calls: Mutex::default(),
            fail_on: Some(operation),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls.lock().iter().map(Call::name).collect()
    }

    fn record(&self, call: Call) -> Result<()> {
        let name = call.name();
        self.calls.lock().push(call);
        if self.fail_on == Some(name) {
            return Err(ProvisioningError::Provider(format!(
                "{name}: ValidationException: injected failure"
            )));
        }
        Ok(())
    }
}

pub fn gateway_handle(gateway_id: &str) -> GatewayHandle {
    GatewayHandle {
        gateway_id: gateway_id.to_string(),
        gateway_url: format!("https://{gateway_id}.gateway.example.com/mcp"),
        role_arn: Some("arn:aws:iam::123456789012:role/AgentCoreGatewayExecutionRole".to_string()),
    }
}

#[async_trait]
impl GatewayControl for RecordingControl {
    async fn create_oauth_authorizer(&self, name: &str) -> Result<AuthorizerSetup> {
        self.record(Call::CreateAuthorizer(name.to_string()))?;
        Ok(AuthorizerSetup {
            authorizer: AuthorizerConfig {
                discovery_url: "https://idp.example.com/.well-known/openid-configuration"
                    .to_string(),
                allowed_clients: vec!["client-1".to_string()],
                allowed_audience: Vec::new(),
            },
            client_info: ClientInfo {
                client_id: "client-1".to_string(),
                client_secret: "secret-1".to_string(),
                user_pool_id: "us-east-1_TestPool".to_string(),
                token_endpoint: "https://idp.example.com/oauth2/token".to_string(),
                scope: format!("{name}/invoke"),
                domain_prefix: "agentcore-abc123".to_string(),
                extra: serde_json::Map::new(),
            },
        })
    }

    async fn create_gateway(&self, spec: &GatewaySpec) -> Result<GatewayHandle> {
        self.record(Call::CreateGateway {
            role_arn: spec.role_arn.clone(),
            semantic: spec.enable_semantic_search,
        })?;
        Ok(gateway_handle("testgateway-abc123"))
    }

    async fn get_gateway(&self, gateway_id: &str) -> Result<GatewayHandle> {
        self.record(Call::GetGateway(gateway_id.to_string()))?;
        Ok(gateway_handle(gateway_id))
    }

    async fn fix_permissions(&self, gateway: &GatewayHandle) -> Result<()> {
        self.record(Call::FixPermissions(gateway.gateway_id.clone()))
    }

    async fn create_target(
        &self,
        _gateway: &GatewayHandle,
        target: &TargetDescriptor,
    ) -> Result<TargetHandle> {
        self.record(Call::CreateTarget(target.clone()))?;
        Ok(TargetHandle {
            target_id: "TARGET0001".to_string(),
            name: target
                .name
                .clone()
                .unwrap_or_else(|| "TestGatewayTarget0001".to_string()),
        })
    }

    async fn delete_gateway(&self, gateway_id: &str, client: &ClientInfo) -> Result<()> {
        self.record(Call::DeleteGateway {
            gateway_id: gateway_id.to_string(),
            client_id: client.client_id.clone(),
            user_pool_id: client.user_pool_id.clone(),
        })
    }
}
