use agentcore_gateway_cli::args::{ArtifactArgs, AwsArgs, LogArgs};
use agentcore_gateway_cli::{exit, telemetry};
use agentcore_gateway_provisioning::aws::{AwsGatewayControl, load_sdk_config};
use agentcore_gateway_provisioning::config::load_gateway_config;
use agentcore_gateway_provisioning::decommission::decommission;
use anyhow::Context as _;
use clap::Parser;
use owo_colors::OwoColorize as _;
use std::process::ExitCode;

/// Delete the configured gateway, its targets and its authorizer
#[derive(Parser, Debug)]
#[command(name = "gateway-cleanup", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    aws: AwsArgs,

    #[command(flatten)]
    artifact: ArtifactArgs,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let color = !cli.log.no_color;
    exit::report(run(cli).await, color)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    telemetry::init(&cli.log)?;
    let config = load_gateway_config(&cli.artifact.path)?;

    let region = cli.aws.region_or(Some(&config.region));
    let sdk = load_sdk_config(&region, cli.aws.profile.as_deref()).await;
    let control = AwsGatewayControl::new(&sdk)?;

    let deleted = decommission(&control, &cli.artifact.path)
        .await
        .context("delete gateway")?;

    let check = if cli.log.no_color {
        "OK".to_string()
    } else {
        "✓".green().to_string()
    };
    println!("{check} Gateway '{}' and its authorizer deleted", deleted.gateway_id);
    println!("  {} was left in place.", cli.artifact.path.display());
    Ok(())
}
