//! Provider seam for gateway management.

use crate::config::ClientInfo;
use crate::error::Result;
use crate::target::TargetDescriptor;
use async_trait::async_trait;

/// JWT validation settings the gateway enforces on inbound MCP calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizerConfig {
    /// OIDC discovery document of the issuer.
    pub discovery_url: String,
    pub allowed_clients: Vec<String>,
    pub allowed_audience: Vec<String>,
}

/// Result of creating an OAuth authorizer.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizerSetup {
    pub authorizer: AuthorizerConfig,
    pub client_info: ClientInfo,
}

#[derive(Debug, Clone)]
pub struct GatewaySpec {
    /// Generated when `None`.
    pub name: Option<String>,
    /// Created (and later fixed up) when `None`.
    pub role_arn: Option<String>,
    pub description: Option<String>,
    pub authorizer: AuthorizerConfig,
    pub enable_semantic_search: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayHandle {
    pub gateway_id: String,
    pub gateway_url: String,
    pub role_arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHandle {
    pub target_id: String,
    pub name: String,
}

/// Management API of the hosted gateway and its identity provider.
///
/// Implementations surface provider failures as [`crate::ProvisioningError::Provider`] with the
/// provider's own message and never retry.
#[async_trait]
pub trait GatewayControl: Send + Sync {
    /// Create an identity provider client usable with the client-credentials grant.
    async fn create_oauth_authorizer(&self, name: &str) -> Result<AuthorizerSetup>;

    async fn create_gateway(&self, spec: &GatewaySpec) -> Result<GatewayHandle>;

    async fn get_gateway(&self, gateway_id: &str) -> Result<GatewayHandle>;

    /// Grant the gateway's auto-created role what it needs to reach its targets.
    ///
    /// Changes propagate asynchronously; callers wait before relying on them.
    async fn fix_permissions(&self, gateway: &GatewayHandle) -> Result<()>;

    async fn create_target(
        &self,
        gateway: &GatewayHandle,
        target: &TargetDescriptor,
    ) -> Result<TargetHandle>;

    /// Delete the gateway, its targets and the authorizer behind `client`.
    async fn delete_gateway(&self, gateway_id: &str, client: &ClientInfo) -> Result<()>;
}
