mod common;

use agentcore_gateway_provisioning::config::load_gateway_config;
use agentcore_gateway_provisioning::decommission::decommission;
use agentcore_gateway_provisioning::provision::{PERMISSION_SETTLE, ProvisionOptions, provision};
use agentcore_gateway_provisioning::register::register_openapi_target;
use agentcore_gateway_provisioning::target::{
    CredentialInjection, CredentialLocation, TargetPayload, TargetType,
};
use agentcore_gateway_provisioning::ProvisioningError;
use agentcore_test_support::{sample_gateway_config, write_json};
use anyhow::Context as _;
use common::{Call, RecordingControl};
use serde_json::json;
use std::time::Duration;
use tempfile::tempdir;

fn quick_options() -> ProvisionOptions {
    let mut options = ProvisionOptions::new("us-west-2");
    options.settle = Duration::ZERO;
    options
}

fn api_key() -> CredentialInjection {
    CredentialInjection {
        api_key: "k-123".to_string(),
        credential_location: CredentialLocation::QueryParameter,
        credential_parameter_name: "appid".to_string(),
    }
}

#[tokio::test]
async fn provision_runs_steps_in_order_and_writes_artifact() -> anyhow::Result<()> {
    let dir = tempdir().context("create temp dir")?;
    let path = dir.path().join("nested").join("gateway_config.json");
    let control = RecordingControl::new();

    let out = provision(&control, &quick_options(), &path).await?;

    assert_eq!(
        control.call_names(),
        [
            "create_oauth_authorizer",
            "create_gateway",
            "fix_permissions",
            "create_target"
        ]
    );
    match &control.calls()[3] {
        Call::CreateTarget(t) => {
            assert_eq!(t.target_type, TargetType::ManagedFunction);
            assert!(t.payload.is_none());
            assert!(t.credentials.is_none());
        }
        other => anyhow::bail!("unexpected call {other:?}"),
    }

    let saved = load_gateway_config(&path)?;
    assert_eq!(saved, out.config);
    assert_eq!(saved.gateway_id, "testgateway-abc123");
    assert_eq!(saved.region, "us-west-2");
    assert_eq!(saved.client_info.scope, "TestGateway/invoke");
    Ok(())
}

#[tokio::test]
async fn explicit_role_skips_permission_fix() -> anyhow::Result<()> {
    let dir = tempdir().context("create temp dir")?;
    let path = dir.path().join("gateway_config.json");
    let control = RecordingControl::new();
    let mut options = quick_options();
    options.role_arn = Some("arn:aws:iam::123456789012:role/Existing".to_string());

    provision(&control, &options, &path).await?;

    assert!(!control.call_names().contains(&"fix_permissions"));
    assert!(path.exists());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn auto_created_role_waits_the_full_settle() -> anyhow::Result<()> {
    let dir = tempdir().context("create temp dir")?;
    let path = dir.path().join("gateway_config.json");
    let control = RecordingControl::new();
    let options = ProvisionOptions::new("us-west-2");
    assert_eq!(options.settle, PERMISSION_SETTLE);

    let started = tokio::time::Instant::now();
    provision(&control, &options, &path).await?;

    assert_eq!(started.elapsed(), PERMISSION_SETTLE);
    assert_eq!(PERMISSION_SETTLE, Duration::from_secs(30));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn explicit_role_does_not_wait() -> anyhow::Result<()> {
    let dir = tempdir().context("create temp dir")?;
    let path = dir.path().join("gateway_config.json");
    let control = RecordingControl::new();
    let mut options = ProvisionOptions::new("us-west-2");
    options.role_arn = Some("arn:aws:iam::123456789012:role/Existing".to_string());

    let started = tokio::time::Instant::now();
    provision(&control, &options, &path).await?;

    assert_eq!(started.elapsed(), Duration::ZERO);
    Ok(())
}

#[tokio::test]
async fn failed_step_leaves_no_artifact() -> anyhow::Result<()> {
    let dir = tempdir().context("create temp dir")?;
    let path = dir.path().join("gateway_config.json");
    let control = RecordingControl::failing_on("create_target");

    let err = provision(&control, &quick_options(), &path)
        .await
        .expect_err("target creation fails");

    assert!(matches!(err, ProvisioningError::Provider(_)));
    assert!(!path.exists());
    Ok(())
}

#[tokio::test]
async fn registration_without_artifact_makes_no_calls() -> anyhow::Result<()> {
    let dir = tempdir().context("create temp dir")?;
    let description = write_json(dir.path(), "openapi.json", &json!({"openapi": "3.0.0"}))?;
    let control = RecordingControl::new();

    let err = register_openapi_target(
        &control,
        &dir.path().join("missing.json"),
        &description,
        api_key(),
        None,
    )
    .await
    .expect_err("missing config");

    assert!(err.is_missing_config());
    assert!(control.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn registration_sends_description_and_credentials() -> anyhow::Result<()> {
    let dir = tempdir().context("create temp dir")?;
    let config = write_json(
        dir.path(),
        "gateway_config.json",
        &sample_gateway_config("https://gw.example.com/mcp", "https://idp.example.com/token"),
    )?;
    let description = write_json(
        dir.path(),
        "openapi.json",
        &json!({"openapi": "3.0.0", "info": {"title": "Weather", "version": "1"}, "paths": {}}),
    )?;
    let control = RecordingControl::new();

    let handle = register_openapi_target(
        &control,
        &config,
        &description,
        api_key(),
        Some("weather".to_string()),
    )
    .await?;

    assert_eq!(handle.name, "weather");
    let calls = control.calls();
    assert_eq!(calls[0], Call::GetGateway("testgateway-abc123".to_string()));
    let Call::CreateTarget(target) = &calls[1] else {
        anyhow::bail!("expected create_target, got {:?}", calls[1]);
    };
    assert_eq!(target.target_type, TargetType::DescribedRestApi);
    assert_eq!(target.credentials, Some(api_key()));
    let Some(TargetPayload::InlineOpenApi(doc)) = &target.payload else {
        anyhow::bail!("expected inline payload");
    };
    let doc: serde_json::Value = serde_json::from_str(doc)?;
    assert_eq!(doc["info"]["title"], "Weather");
    Ok(())
}

#[tokio::test]
async fn failed_registration_keeps_artifact_untouched() -> anyhow::Result<()> {
    let dir = tempdir().context("create temp dir")?;
    let config = write_json(
        dir.path(),
        "gateway_config.json",
        &sample_gateway_config("https://gw.example.com/mcp", "https://idp.example.com/token"),
    )?;
    let before = std::fs::read(&config)?;
    let description = write_json(dir.path(), "openapi.json", &json!({"openapi": "3.0.0"}))?;
    let control = RecordingControl::failing_on("create_target");

    let err = register_openapi_target(&control, &config, &description, api_key(), None)
        .await
        .expect_err("provider rejects target");

    assert!(err.to_string().contains("injected failure"), "{err}");
    assert_eq!(std::fs::read(&config)?, before);
    Ok(())
}

#[tokio::test]
async fn malformed_description_is_rejected_before_any_call() -> anyhow::Result<()> {
    let dir = tempdir().context("create temp dir")?;
    let config = write_json(
        dir.path(),
        "gateway_config.json",
        &sample_gateway_config("https://gw.example.com/mcp", "https://idp.example.com/token"),
    )?;
    let description = dir.path().join("openapi.json");
    std::fs::write(&description, "openapi: 3.0.0\n")?;
    let control = RecordingControl::new();

    let err = register_openapi_target(&control, &config, &description, api_key(), None)
        .await
        .expect_err("yaml is not json");

    assert!(matches!(err, ProvisioningError::MalformedDescription { .. }));
    assert!(control.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn decommission_passes_recorded_client() -> anyhow::Result<()> {
    let dir = tempdir().context("create temp dir")?;
    let config = write_json(
        dir.path(),
        "gateway_config.json",
        &sample_gateway_config("https://gw.example.com/mcp", "https://idp.example.com/token"),
    )?;
    let control = RecordingControl::new();

    decommission(&control, &config).await?;

    assert_eq!(
        control.calls(),
        [Call::DeleteGateway {
            gateway_id: "testgateway-abc123".to_string(),
            client_id: "client-1".to_string(),
            user_pool_id: "us-east-1_TestPool".to_string(),
        }]
    );
    assert!(config.exists());
    Ok(())
}

#[tokio::test]
async fn decommission_without_artifact_makes_no_calls() -> anyhow::Result<()> {
    let dir = tempdir().context("create temp dir")?;
    let control = RecordingControl::new();

    let err = decommission(&control, &dir.path().join("gateway_config.json"))
        .await
        .expect_err("missing config");

    assert!(err.is_missing_config());
    assert!(control.calls().is_empty());
    Ok(())
}
