use super::iam::{EnsuredRole, ensure_role, trust_policy};
use super::provider_error;
use crate::error::{ProvisioningError, Result};
use crate::target::ToolSchema;
use aws_sdk_lambda::Client;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{FunctionCode, Runtime};
use serde_json::json;
use std::io::Write as _;
use std::time::Duration;
use tracing::{debug, info};

/// Function created when a Lambda target is registered without a payload.
pub const DEMO_FUNCTION_NAME: &str = "AgentCoreLambdaTestFunction";
const DEMO_ROLE_NAME: &str = "AgentCoreTestLambdaRole";
const BASIC_EXECUTION_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";
const DEMO_SOURCE: &str = include_str!("../../assets/demo_lambda.py");

/// Tools implemented by the demo function.
#[must_use]
pub fn demo_tools() -> Vec<ToolSchema> {
    vec![
        ToolSchema {
            name: "get_weather".to_string(),
            description: "Get weather for a location".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "location": { "type": "string" } },
                "required": ["location"]
            }),
        },
        ToolSchema {
            name: "get_time".to_string(),
            description: "Get time for a timezone".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "timezone": { "type": "string" } },
                "required": ["timezone"]
            }),
        },
    ]
}

fn package_source() -> Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    zip.start_file("lambda_function.py", options)
        .map_err(std::io::Error::other)?;
    zip.write_all(DEMO_SOURCE.as_bytes())?;
    let cursor = zip.finish().map_err(std::io::Error::other)?;
    Ok(cursor.into_inner())
}

/// Create (or reuse) the demo function and return its ARN.
///
/// A freshly created execution role is not assumable by Lambda right away, hence `role_settle`.
pub(super) async fn ensure_demo_function(
    lambda: &Client,
    iam: &aws_sdk_iam::Client,
    role_settle: Duration,
) -> Result<String> {
    let EnsuredRole { arn: role_arn, created } = ensure_role(
        iam,
        DEMO_ROLE_NAME,
        &trust_policy("lambda.amazonaws.com", None),
        "Execution role for the AgentCore demo Lambda function",
    )
    .await?;
    if created {
        iam.attach_role_policy()
            .role_name(DEMO_ROLE_NAME)
            .policy_arn(BASIC_EXECUTION_POLICY)
            .send()
            .await
            .map_err(provider_error("AttachRolePolicy"))?;
        debug!(settle_secs = role_settle.as_secs(), "waiting for Lambda role propagation");
        tokio::time::sleep(role_settle).await;
    }

    let created = lambda
        .create_function()
        .function_name(DEMO_FUNCTION_NAME)
        .runtime(Runtime::Python312)
        .role(&role_arn)
        .handler("lambda_function.lambda_handler")
        .code(FunctionCode::builder().zip_file(Blob::new(package_source()?)).build())
        .description("Demo tools (get_weather, get_time) for an AgentCore gateway")
        .timeout(30)
        .send()
        .await;

    let arn = match created {
        Ok(out) => out.function_arn().map(str::to_string),
        Err(e)
            if e.as_service_error()
                .is_some_and(|se| se.is_resource_conflict_exception()) =>
        {
            debug!(function = DEMO_FUNCTION_NAME, "demo function already exists; reusing it");
            lambda
                .get_function()
                .function_name(DEMO_FUNCTION_NAME)
                .send()
                .await
                .map_err(provider_error("GetFunction"))?
                .configuration()
                .and_then(|c| c.function_arn())
                .map(str::to_string)
        }
        Err(e) => return Err(provider_error("CreateFunction")(e)),
    };

    let arn = arn.ok_or_else(|| {
        ProvisioningError::Provider(format!("no ARN reported for '{DEMO_FUNCTION_NAME}'"))
    })?;
    info!(function_arn = %arn, "demo Lambda function ready");
    Ok(arn)
}
