use super::provider_error;
use super::lambda::DEMO_FUNCTION_NAME;
use crate::error::{ProvisioningError, Result};
use aws_sdk_iam::Client;
use serde_json::json;
use tracing::{debug, info};

pub(super) const GATEWAY_ROLE_NAME: &str = "AgentCoreGatewayExecutionRole";
const GATEWAY_SERVICE_PRINCIPAL: &str = "bedrock-agentcore.amazonaws.com";
const LAMBDA_INVOKE_POLICY: &str = "AgentCoreLambdaInvokePolicy";

pub(super) struct EnsuredRole {
    pub arn: String,
    pub created: bool,
}

/// Trust policy letting `service` assume a role, optionally pinned to one account.
pub(super) fn trust_policy(service: &str, source_account: Option<&str>) -> String {
    let mut statement = json!({
        "Effect": "Allow",
        "Principal": { "Service": service },
        "Action": "sts:AssumeRole"
    });
    if let Some(account) = source_account {
        statement["Condition"] = json!({ "StringEquals": { "aws:SourceAccount": account } });
    }
    json!({ "Version": "2012-10-17", "Statement": [statement] }).to_string()
}

/// `arn:aws:iam::<account>:role/<path/>name` -> `name`.
pub(super) fn role_name_from_arn(arn: &str) -> Option<&str> {
    let (_, resource) = arn.split_once(":role/")?;
    resource.rsplit('/').next().filter(|s| !s.is_empty())
}

pub(super) fn account_from_arn(arn: &str) -> Option<&str> {
    arn.split(':').nth(4).filter(|s| !s.is_empty())
}

/// Create `name` with `trust`, or reuse it if it already exists.
pub(super) async fn ensure_role(
    client: &Client,
    name: &str,
    trust: &str,
    description: &str,
) -> Result<EnsuredRole> {
    match client
        .create_role()
        .role_name(name)
        .assume_role_policy_document(trust)
        .description(description)
        .send()
        .await
    {
        Ok(out) => {
            let role = out.role().ok_or_else(|| {
                ProvisioningError::Provider(format!("CreateRole returned no role for '{name}'"))
            })?;
            info!(role = %name, "created IAM role");
            Ok(EnsuredRole {
                arn: role.arn().to_string(),
                created: true,
            })
        }
        Err(e)
            if e.as_service_error()
                .is_some_and(|se| se.is_entity_already_exists_exception()) =>
        {
            debug!(role = %name, "IAM role already exists; reusing it");
            let out = client
                .get_role()
                .role_name(name)
                .send()
                .await
                .map_err(provider_error("GetRole"))?;
            let role = out.role().ok_or_else(|| {
                ProvisioningError::Provider(format!("GetRole returned no role for '{name}'"))
            })?;
            Ok(EnsuredRole {
                arn: role.arn().to_string(),
                created: false,
            })
        }
        Err(e) => Err(provider_error("CreateRole")(e)),
    }
}

pub(super) async fn ensure_gateway_role(client: &Client) -> Result<String> {
    let role = ensure_role(
        client,
        GATEWAY_ROLE_NAME,
        &trust_policy(GATEWAY_SERVICE_PRINCIPAL, None),
        "Execution role for the AgentCore gateway",
    )
    .await?;
    Ok(role.arn)
}

/// Pin the trust policy to the role's account and allow invoking the demo function.
pub(super) async fn fix_gateway_role(client: &Client, region: &str, role_arn: &str) -> Result<()> {
    let (Some(role_name), Some(account)) = (role_name_from_arn(role_arn), account_from_arn(role_arn))
    else {
        return Err(ProvisioningError::Provider(format!(
            "cannot parse role ARN '{role_arn}'"
        )));
    };

    client
        .update_assume_role_policy()
        .role_name(role_name)
        .policy_document(trust_policy(GATEWAY_SERVICE_PRINCIPAL, Some(account)))
        .send()
        .await
        .map_err(provider_error("UpdateAssumeRolePolicy"))?;

    let invoke = json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Action": ["lambda:InvokeFunction"],
            "Resource": format!("arn:aws:lambda:{region}:{account}:function:{DEMO_FUNCTION_NAME}")
        }]
    });
    client
        .put_role_policy()
        .role_name(role_name)
        .policy_name(LAMBDA_INVOKE_POLICY)
        .policy_document(invoke.to_string())
        .send()
        .await
        .map_err(provider_error("PutRolePolicy"))?;
    info!(role = %role_name, "gateway role permissions updated");
    Ok(())
}
