use clap::Args;
use std::path::PathBuf;

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Args, Debug, Clone)]
pub struct AwsArgs {
    /// AWS region (defaults to the region recorded in the configuration, then us-east-1)
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Named profile from the shared AWS config files
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,
}

impl AwsArgs {
    /// Explicit region, else `recorded`, else [`DEFAULT_REGION`].
    #[must_use]
    pub fn region_or(&self, recorded: Option<&str>) -> String {
        self.region
            .as_deref()
            .or(recorded)
            .unwrap_or(DEFAULT_REGION)
            .to_string()
    }
}

#[derive(Args, Debug, Clone)]
pub struct ArtifactArgs {
    /// Gateway configuration written by gateway-setup
    #[arg(
        long = "config",
        env = "AGENTCORE_GATEWAY_CONFIG",
        default_value = agentcore_gateway_provisioning::DEFAULT_CONFIG_FILE
    )]
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Log filter, e.g. `info` or `agentcore_gateway_agent=debug`
    #[arg(long = "log-level", env = "AGENTCORE_LOG", default_value = "info")]
    pub level: String,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,
}
