//! Process exit codes.

use agentcore_gateway_agent::AgentError;
use agentcore_gateway_provisioning::ProvisioningError;
use owo_colors::OwoColorize as _;
use std::process::ExitCode;

/// `EX_CONFIG` from sysexits: the configuration artifact is missing.
pub const MISSING_CONFIG: u8 = 78;
pub const FAILURE: u8 = 1;

#[must_use]
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let missing = err.chain().any(|cause| {
        cause
            .downcast_ref::<ProvisioningError>()
            .is_some_and(ProvisioningError::is_missing_config)
            || cause
                .downcast_ref::<AgentError>()
                .is_some_and(AgentError::is_missing_config)
    });
    if missing { MISSING_CONFIG } else { FAILURE }
}

/// Print `result`'s error (if any) to stderr and turn it into an exit code.
pub fn report(result: anyhow::Result<()>, color: bool) -> ExitCode {
    let Err(err) = result else {
        return ExitCode::SUCCESS;
    };
    let code = exit_code(&err);
    if color {
        eprintln!("{} {err:#}", "error:".red().bold());
    } else {
        eprintln!("error: {err:#}");
    }
    ExitCode::from(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;
    use std::path::PathBuf;

    fn missing() -> ProvisioningError {
        ProvisioningError::MissingConfig {
            path: PathBuf::from("gateway_config.json"),
        }
    }

    #[test]
    fn missing_config_maps_to_78_through_context() {
        let err = Err::<(), _>(missing()).context("load gateway").unwrap_err();
        assert_eq!(exit_code(&err), MISSING_CONFIG);
    }

    #[test]
    fn missing_config_inside_agent_error_maps_to_78() {
        let err = anyhow::Error::new(AgentError::from(missing()));
        assert_eq!(exit_code(&err), MISSING_CONFIG);
    }

    #[test]
    fn other_errors_map_to_1() {
        let err = anyhow::Error::new(ProvisioningError::Provider(
            "CreateGateway: AccessDeniedException".to_string(),
        ));
        assert_eq!(exit_code(&err), FAILURE);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), FAILURE);
    }
}
