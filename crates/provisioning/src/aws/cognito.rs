use super::{build_error, provider_error, random_suffix};
use crate::config::ClientInfo;
use crate::control::{AuthorizerConfig, AuthorizerSetup};
use crate::error::{ProvisioningError, Result};
use aws_sdk_cognitoidentityprovider::Client;
use aws_sdk_cognitoidentityprovider::types::{OAuthFlowType, ResourceServerScopeType};
use tracing::{debug, info, warn};

const INVOKE_SCOPE: &str = "invoke";

pub(super) fn discovery_url(region: &str, user_pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}/.well-known/openid-configuration")
}

pub(super) fn token_endpoint(region: &str, domain_prefix: &str) -> String {
    format!("https://{domain_prefix}.auth.{region}.amazoncognito.com/oauth2/token")
}

/// User pool + hosted domain + resource server + confidential client (client-credentials).
pub(super) async fn create_authorizer(
    client: &Client,
    region: &str,
    name: &str,
) -> Result<AuthorizerSetup> {
    let suffix = random_suffix();

    let pool = client
        .create_user_pool()
        .pool_name(format!("agentcore-gateway-{suffix}"))
        .send()
        .await
        .map_err(provider_error("CreateUserPool"))?;
    let user_pool_id = pool
        .user_pool()
        .and_then(|p| p.id())
        .ok_or_else(|| ProvisioningError::Provider("CreateUserPool returned no pool id".into()))?
        .to_string();
    debug!(%user_pool_id, "created user pool");

    let domain_prefix = format!("agentcore-{suffix}");
    client
        .create_user_pool_domain()
        .domain(&domain_prefix)
        .user_pool_id(&user_pool_id)
        .send()
        .await
        .map_err(provider_error("CreateUserPoolDomain"))?;

    let scope = ResourceServerScopeType::builder()
        .scope_name(INVOKE_SCOPE)
        .scope_description("Invoke tools exposed by the gateway")
        .build()
        .map_err(build_error)?;
    client
        .create_resource_server()
        .user_pool_id(&user_pool_id)
        .identifier(name)
        .name(name)
        .scopes(scope)
        .send()
        .await
        .map_err(provider_error("CreateResourceServer"))?;

    let scope_name = format!("{name}/{INVOKE_SCOPE}");
    let created = client
        .create_user_pool_client()
        .user_pool_id(&user_pool_id)
        .client_name(format!("agentcore-client-{suffix}"))
        .generate_secret(true)
        .allowed_o_auth_flows(OAuthFlowType::ClientCredentials)
        .allowed_o_auth_scopes(&scope_name)
        .allowed_o_auth_flows_user_pool_client(true)
        .supported_identity_providers("COGNITO")
        .send()
        .await
        .map_err(provider_error("CreateUserPoolClient"))?;
    let app = created.user_pool_client().ok_or_else(|| {
        ProvisioningError::Provider("CreateUserPoolClient returned no client".into())
    })?;
    let (Some(client_id), Some(client_secret)) = (app.client_id(), app.client_secret()) else {
        return Err(ProvisioningError::Provider(
            "CreateUserPoolClient returned no client credentials".into(),
        ));
    };
    info!(%user_pool_id, %client_id, "OAuth authorizer ready");

    Ok(AuthorizerSetup {
        authorizer: AuthorizerConfig {
            discovery_url: discovery_url(region, &user_pool_id),
            allowed_clients: vec![client_id.to_string()],
            allowed_audience: Vec::new(),
        },
        client_info: ClientInfo {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token_endpoint: token_endpoint(region, &domain_prefix),
            user_pool_id,
            scope: scope_name,
            domain_prefix,
            extra: serde_json::Map::new(),
        },
    })
}

/// Remove the hosted domain, then the pool (which takes its clients with it).
pub(super) async fn delete_authorizer(client: &Client, info: &ClientInfo) -> Result<()> {
    if info.domain_prefix.is_empty() {
        warn!(user_pool_id = %info.user_pool_id, "no domain prefix recorded; skipping domain deletion");
    } else {
        client
            .delete_user_pool_domain()
            .domain(&info.domain_prefix)
            .user_pool_id(&info.user_pool_id)
            .send()
            .await
            .map_err(provider_error("DeleteUserPoolDomain"))?;
    }
    client
        .delete_user_pool()
        .user_pool_id(&info.user_pool_id)
        .send()
        .await
        .map_err(provider_error("DeleteUserPool"))?;
    info!(user_pool_id = %info.user_pool_id, "authorizer deleted");
    Ok(())
}
