//! Flags for `gateway-add-openapi`.

use agentcore_gateway_provisioning::GatewayConfig;
use agentcore_gateway_provisioning::config::load_gateway_config;
use agentcore_gateway_provisioning::target::{CredentialInjection, CredentialLocation};
use clap::Args;
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "AGENTCORE_TARGET_API_KEY";

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    /// JSON OpenAPI description (see openapi-to-json)
    #[arg(long, default_value = "openapi.json")]
    pub description: PathBuf,

    /// API key the gateway sends to the target API
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Where the key goes: QUERY_PARAMETER or HEADER
    #[arg(long, default_value = "QUERY_PARAMETER")]
    pub credential_location: CredentialLocation,

    /// Query parameter or header name carrying the key
    #[arg(long, default_value = "api_key")]
    pub credential_parameter_name: String,

    /// Target name (generated when omitted)
    #[arg(long)]
    pub target_name: Option<String>,
}

impl RegisterArgs {
    /// Load the artifact, then resolve the credentials.
    ///
    /// A missing artifact is reported before a missing key.
    pub fn prepare(
        &self,
        config_path: &Path,
    ) -> anyhow::Result<(GatewayConfig, CredentialInjection)> {
        let config = load_gateway_config(config_path)?;
        let Some(api_key) = self.api_key.clone().filter(|key| !key.is_empty()) else {
            anyhow::bail!("an API key is required: pass --api-key or set {API_KEY_ENV}");
        };
        let credentials = CredentialInjection {
            api_key,
            credential_location: self.credential_location,
            credential_parameter_name: self.credential_parameter_name.clone(),
        };
        Ok((config, credentials))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::{FAILURE, MISSING_CONFIG, exit_code};
    use agentcore_test_support::{sample_gateway_config, write_json};
    use clap::Parser;
    use tempfile::tempdir;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        register: RegisterArgs,
    }

    fn parse(args: &[&str]) -> RegisterArgs {
        let argv = std::iter::once("gateway-add-openapi").chain(args.iter().copied());
        TestCli::try_parse_from(argv).expect("parse").register
    }

    #[test]
    fn parses_without_any_flags() {
        let args = parse(&[]);
        assert_eq!(args.description, PathBuf::from("openapi.json"));
        assert_eq!(args.credential_location, CredentialLocation::QueryParameter);
        assert_eq!(args.credential_parameter_name, "api_key");
    }

    #[test]
    fn missing_artifact_is_reported_before_missing_key() {
        let dir = tempdir().expect("tempdir");
        let mut args = parse(&[]);
        args.api_key = None;

        let err = args
            .prepare(&dir.path().join("gateway_config.json"))
            .expect_err("must fail");
        assert_eq!(exit_code(&err), MISSING_CONFIG, "{err:#}");
    }

    #[test]
    fn missing_key_fails_after_artifact_loads() {
        let dir = tempdir().expect("tempdir");
        let config = sample_gateway_config(
            "https://gw.example.com/mcp",
            "https://auth.example.com/oauth2/token",
        );
        let path = write_json(dir.path(), "gateway_config.json", &config).expect("write config");
        let mut args = parse(&[]);
        args.api_key = None;

        let err = args.prepare(&path).expect_err("must fail");
        assert_eq!(exit_code(&err), FAILURE);
        assert!(err.to_string().contains(API_KEY_ENV), "{err:#}");
    }

    #[test]
    fn key_and_location_flow_into_credentials() {
        let dir = tempdir().expect("tempdir");
        let config = sample_gateway_config(
            "https://gw.example.com/mcp",
            "https://auth.example.com/oauth2/token",
        );
        let path = write_json(dir.path(), "gateway_config.json", &config).expect("write config");
        let args = parse(&[
            "--api-key",
            "k-1",
            "--credential-location",
            "HEADER",
            "--credential-parameter-name",
            "x-api-key",
        ]);

        let (loaded, creds) = args.prepare(&path).expect("prepare");
        assert_eq!(loaded.gateway_url, "https://gw.example.com/mcp");
        assert_eq!(creds.api_key, "k-1");
        assert_eq!(creds.credential_location, CredentialLocation::Header);
        assert_eq!(creds.credential_parameter_name, "x-api-key");
    }
}
