use agentcore_gateway_agent::agent::DEFAULT_MAX_TOOL_ROUNDS;
use agentcore_gateway_agent::bedrock::{BedrockModel, DEFAULT_MODEL_ID};
use agentcore_gateway_agent::runner::{Runner, RunnerSettings};
use agentcore_gateway_cli::args::{ArtifactArgs, AwsArgs, LogArgs};
use agentcore_gateway_cli::{exit, telemetry};
use agentcore_gateway_provisioning::aws::load_sdk_config;
use agentcore_gateway_provisioning::token::TokenClient;
use clap::Parser;
use owo_colors::OwoColorize as _;
use std::process::ExitCode;
use tokio::io::BufReader;

/// Chat with a Bedrock model that can call the gateway's tools
#[derive(Parser, Debug)]
#[command(name = "gateway-agent", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    aws: AwsArgs,

    #[command(flatten)]
    artifact: ArtifactArgs,

    #[command(flatten)]
    log: LogArgs,

    /// Bedrock model or inference profile id
    #[arg(long, env = "BEDROCK_MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    model_id: String,

    /// System prompt sent with every model call
    #[arg(long)]
    system_prompt: Option<String>,

    /// Tool-calling rounds allowed per user turn
    #[arg(long, default_value_t = DEFAULT_MAX_TOOL_ROUNDS)]
    max_tool_rounds: usize,

    /// Output token limit per model call
    #[arg(long)]
    max_tokens: Option<i32>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let color = !cli.log.no_color;
    exit::report(run(cli).await, color)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    telemetry::init(&cli.log)?;
    let color = !cli.log.no_color;
    let settings = RunnerSettings {
        config_path: cli.artifact.path.clone(),
        model_id: cli.model_id,
        system_prompt: cli.system_prompt,
        max_tool_rounds: cli.max_tool_rounds,
        max_tokens: cli.max_tokens,
        color,
    };

    println!("Getting access token...");
    let http = reqwest::Client::new();
    let authenticated = Runner::new(settings)
        .authenticate(&TokenClient::new(http.clone()))
        .await?;
    println!("Access token obtained");

    let listed = authenticated.list_tools(http).await?;
    let config = listed.config().clone();
    let model_id = listed.settings().model_id.clone();
    let names: Vec<String> = listed.tools().iter().map(|t| t.name.to_string()).collect();

    let rule = "-".repeat(60);
    if color {
        println!("\n{}", "AgentCore Gateway agent".bold());
    } else {
        println!("\nAgentCore Gateway agent");
    }
    println!("Gateway URL: {}", config.gateway_url);
    println!("Model: {model_id}");
    println!("{rule}");
    println!("Available tools: {}", names.join(", "));
    println!("{rule}");
    println!("Type 'exit', 'quit' or 'bye' to leave.");

    let region = cli.aws.region_or(Some(&config.region));
    let sdk = load_sdk_config(&region, cli.aws.profile.as_deref()).await;
    let model = BedrockModel::new(&sdk, model_id).with_max_tokens(listed.settings().max_tokens);

    let mut stdout = tokio::io::stdout();
    listed
        .start(model)
        .run(BufReader::new(tokio::io::stdin()), &mut stdout)
        .await?;
    Ok(())
}
