use agentcore_gateway_cli::args::{ArtifactArgs, AwsArgs, LogArgs};
use agentcore_gateway_cli::register::RegisterArgs;
use agentcore_gateway_cli::{exit, telemetry};
use agentcore_gateway_provisioning::aws::{AwsGatewayControl, load_sdk_config};
use agentcore_gateway_provisioning::register::register_openapi_target;
use anyhow::Context as _;
use clap::Parser;
use owo_colors::OwoColorize as _;
use std::process::ExitCode;

/// Register a JSON OpenAPI description as a target of the configured gateway
#[derive(Parser, Debug)]
#[command(name = "gateway-add-openapi", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    aws: AwsArgs,

    #[command(flatten)]
    artifact: ArtifactArgs,

    #[command(flatten)]
    log: LogArgs,

    #[command(flatten)]
    register: RegisterArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let color = !cli.log.no_color;
    exit::report(run(cli).await, color)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    telemetry::init(&cli.log)?;
    let (config, credentials) = cli.register.prepare(&cli.artifact.path)?;

    let region = cli.aws.region_or(Some(&config.region));
    let sdk = load_sdk_config(&region, cli.aws.profile.as_deref()).await;
    let control = AwsGatewayControl::new(&sdk)?;

    let target = register_openapi_target(
        &control,
        &cli.artifact.path,
        &cli.register.description,
        credentials,
        cli.register.target_name,
    )
    .await
    .with_context(|| format!("register '{}'", cli.register.description.display()))?;

    let check = if cli.log.no_color {
        "OK".to_string()
    } else {
        "✓".green().to_string()
    };
    println!("{check} OpenAPI target '{}' added ({})", target.name, target.target_id);
    println!("Run gateway-agent and ask for something the API provides.");
    Ok(())
}
