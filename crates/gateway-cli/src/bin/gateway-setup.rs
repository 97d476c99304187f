use agentcore_gateway_cli::args::{ArtifactArgs, AwsArgs, LogArgs};
use agentcore_gateway_cli::{exit, telemetry};
use agentcore_gateway_provisioning::aws::{AwsGatewayControl, load_sdk_config};
use agentcore_gateway_provisioning::provision::{
    DEFAULT_AUTHORIZER_NAME, PERMISSION_SETTLE, ProvisionOptions, provision,
};
use anyhow::Context as _;
use clap::Parser;
use owo_colors::OwoColorize as _;
use std::process::ExitCode;
use std::time::Duration;

/// Create an OAuth authorizer, an AgentCore gateway and a demo Lambda target
#[derive(Parser, Debug)]
#[command(name = "gateway-setup", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    aws: AwsArgs,

    #[command(flatten)]
    artifact: ArtifactArgs,

    #[command(flatten)]
    log: LogArgs,

    /// Name of the OAuth resource server (the token scope is `<name>/invoke`)
    #[arg(long, default_value = DEFAULT_AUTHORIZER_NAME)]
    authorizer_name: String,

    /// Gateway name (generated when omitted)
    #[arg(long)]
    gateway_name: Option<String>,

    /// Existing execution role for the gateway; skips creating and patching one
    #[arg(long)]
    role_arn: Option<String>,

    /// Do not enable semantic tool search on the gateway
    #[arg(long)]
    no_semantic_search: bool,

    /// Seconds to wait for IAM changes to propagate
    #[arg(long, default_value_t = PERMISSION_SETTLE.as_secs())]
    settle_secs: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let color = !cli.log.no_color;
    exit::report(run(cli).await, color)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    telemetry::init(&cli.log)?;
    let region = cli.aws.region_or(None);
    let sdk = load_sdk_config(&region, cli.aws.profile.as_deref()).await;
    let control = AwsGatewayControl::new(&sdk)?;

    let options = ProvisionOptions {
        authorizer_name: cli.authorizer_name,
        gateway_name: cli.gateway_name,
        role_arn: cli.role_arn,
        enable_semantic_search: !cli.no_semantic_search,
        settle: Duration::from_secs(cli.settle_secs),
        ..ProvisionOptions::new(region)
    };
    let done = provision(&control, &options, &cli.artifact.path)
        .await
        .context("provision gateway")?;

    let check = if cli.log.no_color {
        "OK".to_string()
    } else {
        "✓".green().to_string()
    };
    println!("{check} Gateway ready");
    println!("  Gateway URL:   {}", done.config.gateway_url);
    println!("  Gateway ID:    {}", done.config.gateway_id);
    println!("  Lambda target: {}", done.default_target.name);
    println!("  Configuration: {}", cli.artifact.path.display());
    println!();
    println!("Next: run gateway-agent to chat with the gateway's tools.");
    Ok(())
}
