//! Bedrock `AgentCore` control plane calls.

use super::{build_error, provider_error};
use crate::control::{GatewayHandle, GatewaySpec, TargetHandle};
use crate::error::{ProvisioningError, Result};
use crate::target::{CredentialInjection, TargetDescriptor, TargetPayload, ToolSchema};
use aws_sdk_bedrockagentcorecontrol::Client;
use aws_sdk_bedrockagentcorecontrol::types::{
    ApiKeyCredentialLocation, ApiSchemaConfiguration, AuthorizerConfiguration, AuthorizerType,
    CredentialProvider, CredentialProviderConfiguration, CredentialProviderType,
    CustomJwtAuthorizerConfiguration, GatewayApiKeyCredentialProvider,
    GatewayProtocolConfiguration, GatewayProtocolType, McpGatewayConfiguration,
    McpLambdaTargetConfiguration, McpTargetConfiguration, S3Configuration, SchemaDefinition,
    SchemaType, SearchType, TargetConfiguration, ToolDefinition,
};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

pub(super) async fn create_gateway(
    client: &Client,
    spec: &GatewaySpec,
    name: &str,
    role_arn: &str,
) -> Result<GatewayHandle> {
    let jwt = CustomJwtAuthorizerConfiguration::builder()
        .discovery_url(&spec.authorizer.discovery_url)
        .set_allowed_clients(non_empty(&spec.authorizer.allowed_clients))
        .set_allowed_audience(non_empty(&spec.authorizer.allowed_audience))
        .build()
        .map_err(build_error)?;

    let mut request = client
        .create_gateway()
        .name(name)
        .role_arn(role_arn)
        .protocol_type(GatewayProtocolType::from("MCP"))
        .authorizer_type(AuthorizerType::from("CUSTOM_JWT"))
        .authorizer_configuration(AuthorizerConfiguration::CustomJwtAuthorizer(jwt))
        .set_description(spec.description.clone());
    if spec.enable_semantic_search {
        request = request.protocol_configuration(GatewayProtocolConfiguration::Mcp(
            McpGatewayConfiguration::builder()
                .search_type(SearchType::from("SEMANTIC"))
                .build(),
        ));
    }
    let out = request
        .send()
        .await
        .map_err(provider_error("CreateGateway"))?;

    let handle = handle(out.gateway_id(), out.gateway_url(), out.role_arn())?;
    info!(gateway_id = %handle.gateway_id, gateway_url = %handle.gateway_url, "gateway created");
    Ok(handle)
}

pub(super) async fn get_gateway(client: &Client, gateway_id: &str) -> Result<GatewayHandle> {
    let out = client
        .get_gateway()
        .gateway_identifier(gateway_id)
        .send()
        .await
        .map_err(provider_error("GetGateway"))?;
    handle(out.gateway_id(), out.gateway_url(), out.role_arn())
}

fn handle(gateway_id: &str, gateway_url: Option<&str>, role_arn: Option<&str>) -> Result<GatewayHandle> {
    let gateway_url = gateway_url.filter(|u| !u.is_empty()).ok_or_else(|| {
        ProvisioningError::Provider(format!("gateway '{gateway_id}' reports no endpoint URL"))
    })?;
    Ok(GatewayHandle {
        gateway_id: gateway_id.to_string(),
        gateway_url: gateway_url.to_string(),
        role_arn: role_arn.map(str::to_string),
    })
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

/// `target` must already be validated and carry a payload.
pub(super) async fn create_target(
    client: &Client,
    gateway: &GatewayHandle,
    target: &TargetDescriptor,
    name: &str,
) -> Result<TargetHandle> {
    let payload = target.payload.as_ref().ok_or_else(|| {
        ProvisioningError::InvalidTarget("target has no payload to register".to_string())
    })?;

    let (mcp, credentials) = match payload {
        TargetPayload::InlineOpenApi(document) => (
            McpTargetConfiguration::OpenApiSchema(ApiSchemaConfiguration::InlinePayload(
                document.clone(),
            )),
            openapi_credentials(client, name, target.credentials.as_ref()).await?,
        ),
        TargetPayload::OpenApiS3 {
            uri,
            bucket_owner_account_id,
        } => (
            McpTargetConfiguration::OpenApiSchema(ApiSchemaConfiguration::S3(
                S3Configuration::builder()
                    .uri(uri)
                    .set_bucket_owner_account_id(bucket_owner_account_id.clone())
                    .build(),
            )),
            openapi_credentials(client, name, target.credentials.as_ref()).await?,
        ),
        TargetPayload::Lambda {
            function_arn,
            tools,
        } => {
            let definitions = tools
                .iter()
                .map(tool_definition)
                .collect::<Result<Vec<_>>>()?;
            let lambda = McpLambdaTargetConfiguration::builder()
                .lambda_arn(function_arn)
                .tool_schema(aws_sdk_bedrockagentcorecontrol::types::ToolSchema::InlinePayload(
                    definitions,
                ))
                .build()
                .map_err(build_error)?;
            let role = CredentialProviderConfiguration::builder()
                .credential_provider_type(CredentialProviderType::from("GATEWAY_IAM_ROLE"))
                .build()
                .map_err(build_error)?;
            (McpTargetConfiguration::Lambda(lambda), vec![role])
        }
    };

    let out = client
        .create_gateway_target()
        .gateway_identifier(&gateway.gateway_id)
        .name(name)
        .set_description(target.description.clone())
        .target_configuration(TargetConfiguration::Mcp(mcp))
        .set_credential_provider_configurations((!credentials.is_empty()).then_some(credentials))
        .send()
        .await
        .map_err(provider_error("CreateGatewayTarget"))?;

    info!(
        gateway_id = %gateway.gateway_id,
        target_id = %out.target_id(),
        target = name,
        kind = target.target_type.as_str(),
        "gateway target created"
    );
    Ok(TargetHandle {
        target_id: out.target_id().to_string(),
        name: name.to_string(),
    })
}

/// Store the API key with the provider and reference it from the target.
async fn openapi_credentials(
    client: &Client,
    target_name: &str,
    credentials: Option<&CredentialInjection>,
) -> Result<Vec<CredentialProviderConfiguration>> {
    let Some(creds) = credentials else {
        return Ok(Vec::new());
    };
    let provider = client
        .create_api_key_credential_provider()
        .name(format!("{target_name}-api-key"))
        .api_key(&creds.api_key)
        .send()
        .await
        .map_err(provider_error("CreateApiKeyCredentialProvider"))?;
    debug!(provider_arn = %provider.credential_provider_arn(), "API key credential provider created");

    Ok(vec![api_key_credential_config(
        provider.credential_provider_arn(),
        creds,
    )?])
}

fn api_key_credential_config(
    provider_arn: &str,
    creds: &CredentialInjection,
) -> Result<CredentialProviderConfiguration> {
    let api_key = GatewayApiKeyCredentialProvider::builder()
        .provider_arn(provider_arn)
        .credential_parameter_name(&creds.credential_parameter_name)
        .credential_location(ApiKeyCredentialLocation::from(
            creds.credential_location.as_str(),
        ))
        .build()
        .map_err(build_error)?;
    CredentialProviderConfiguration::builder()
        .credential_provider_type(CredentialProviderType::from("API_KEY"))
        .credential_provider(CredentialProvider::ApiKeyCredentialProvider(api_key))
        .build()
        .map_err(build_error)
}

fn tool_definition(tool: &ToolSchema) -> Result<ToolDefinition> {
    ToolDefinition::builder()
        .name(&tool.name)
        .description(&tool.description)
        .input_schema(schema_definition(&tool.input_schema, &tool.name)?)
        .build()
        .map_err(build_error)
}

/// Convert a JSON Schema fragment into the gateway's inline schema shape.
///
/// Only scalar and object types are mapped; `array` is rejected.
fn schema_definition(schema: &Value, path: &str) -> Result<SchemaDefinition> {
    let unsupported =
        |reason: String| ProvisioningError::InvalidTarget(format!("tool schema '{path}': {reason}"));

    let Value::Object(map) = schema else {
        return Err(unsupported("schema must be a JSON object".to_string()));
    };
    let kind = match map.get("type") {
        None => "object",
        Some(Value::String(s)) => s.as_str(),
        Some(other) => return Err(unsupported(format!("unsupported type {other}"))),
    };
    if !matches!(kind, "object" | "string" | "number" | "integer" | "boolean") {
        return Err(unsupported(format!("type '{kind}' is not supported")));
    }

    let mut properties = HashMap::new();
    if let Some(props) = map.get("properties") {
        let Value::Object(props) = props else {
            return Err(unsupported("properties must be an object".to_string()));
        };
        for (name, sub) in props {
            properties.insert(name.clone(), schema_definition(sub, &format!("{path}.{name}"))?);
        }
    }
    let required = match map.get("required") {
        None => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| unsupported("required must list strings".to_string()))
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        Some(_) => return Err(unsupported("required must be an array".to_string())),
    };

    SchemaDefinition::builder()
        .r#type(SchemaType::from(kind))
        .set_properties((!properties.is_empty()).then_some(properties))
        .set_required(required)
        .set_description(map.get("description").and_then(Value::as_str).map(str::to_string))
        .build()
        .map_err(build_error)
}

/// Delete every target (all pages), wait `settle`, then delete the gateway.
pub(super) async fn delete_gateway(client: &Client, gateway_id: &str, settle: Duration) -> Result<()> {
    let mut target_ids = Vec::new();
    let mut next_token: Option<String> = None;
    loop {
        let page = client
            .list_gateway_targets()
            .gateway_identifier(gateway_id)
            .set_next_token(next_token.take())
            .send()
            .await
            .map_err(provider_error("ListGatewayTargets"))?;
        target_ids.extend(page.items().iter().map(|t| t.target_id().to_string()));
        match page.next_token() {
            Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
            _ => break,
        }
    }

    for target_id in &target_ids {
        client
            .delete_gateway_target()
            .gateway_identifier(gateway_id)
            .target_id(target_id)
            .send()
            .await
            .map_err(provider_error("DeleteGatewayTarget"))?;
        debug!(gateway_id, target_id = %target_id, "target deleted");
    }
    if !target_ids.is_empty() {
        debug!(settle_secs = settle.as_secs(), "waiting for target deletion to settle");
        tokio::time::sleep(settle).await;
    }

    client
        .delete_gateway()
        .gateway_identifier(gateway_id)
        .send()
        .await
        .map_err(provider_error("DeleteGateway"))?;
    info!(gateway_id, targets = target_ids.len(), "gateway deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_schema_maps_nested_properties() {
        let def = schema_definition(
            &json!({
                "type": "object",
                "properties": {
                    "location": { "type": "string", "description": "City name" },
                    "days": { "type": "integer" }
                },
                "required": ["location"]
            }),
            "get_weather",
        )
        .expect("convert");
        assert_eq!(def.r#type().as_str(), "object");
        let props = def.properties().expect("properties");
        assert_eq!(props.len(), 2);
        assert_eq!(props["days"].r#type().as_str(), "integer");
    }

    #[test]
    fn api_key_config_references_the_provider() {
        let creds = CredentialInjection {
            api_key: "k-123".to_string(),
            credential_location: crate::target::CredentialLocation::Header,
            credential_parameter_name: "x-api-key".to_string(),
        };
        let arn = "arn:aws:bedrock-agentcore:us-east-1:123456789012:token-vault/default/apikey/w";

        let config = api_key_credential_config(arn, &creds).expect("config");

        assert_eq!(config.credential_provider_type().as_str(), "API_KEY");
        let rendered = format!("{config:?}");
        assert!(rendered.contains(arn), "{rendered}");
        assert!(rendered.contains("x-api-key"), "{rendered}");
        assert!(rendered.contains("Header"), "{rendered}");
        assert!(!rendered.contains("k-123"), "{rendered}");
    }

    #[test]
    fn array_schemas_are_rejected_with_their_path() {
        let err = schema_definition(
            &json!({
                "type": "object",
                "properties": { "tags": { "type": "array", "items": { "type": "string" } } }
            }),
            "tag_things",
        )
        .expect_err("array");
        assert!(err.to_string().contains("tag_things.tags"), "{err}");
    }

    #[test]
    fn demo_tools_convert() {
        for tool in super::super::demo_tools() {
            tool_definition(&tool).expect("demo tool converts");
        }
    }

    #[test]
    fn gateway_without_url_is_a_provider_error() {
        let err = handle("gw-1", None, None).expect_err("no url");
        assert!(matches!(err, ProvisioningError::Provider(_)));
    }
}
