use crate::error::{ProvisioningError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use url::Url;

/// Default artifact location, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gateway_config.json";

/// Handoff written by `gateway-setup` and read by every later step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub gateway_url: String,
    pub gateway_id: String,
    pub region: String,
    pub client_info: ClientInfo,
}

/// OAuth client issued by the authorizer, plus what is needed to find and delete it again.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: String,
    pub client_secret: String,
    pub user_pool_id: String,
    pub token_endpoint: String,
    pub scope: String,
    pub domain_prefix: String,
    /// Keys written by other tools are carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl fmt::Debug for ClientInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientInfo")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_pool_id", &self.user_pool_id)
            .field("token_endpoint", &self.token_endpoint)
            .field("scope", &self.scope)
            .field("domain_prefix", &self.domain_prefix)
            .finish_non_exhaustive()
    }
}

impl GatewayConfig {
    /// Check the fields later steps rely on. Returns the first problem found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let required = [
            ("gateway_id", self.gateway_id.as_str()),
            ("gateway_url", self.gateway_url.as_str()),
            ("region", self.region.as_str()),
            ("client_info.client_id", self.client_info.client_id.as_str()),
            (
                "client_info.client_secret",
                self.client_info.client_secret.as_str(),
            ),
            (
                "client_info.user_pool_id",
                self.client_info.user_pool_id.as_str(),
            ),
            (
                "client_info.token_endpoint",
                self.client_info.token_endpoint.as_str(),
            ),
            ("client_info.scope", self.client_info.scope.as_str()),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(format!("'{field}' must not be empty"));
        }
        for (field, value) in [
            ("gateway_url", &self.gateway_url),
            ("client_info.token_endpoint", &self.client_info.token_endpoint),
        ] {
            let url = Url::parse(value).map_err(|e| format!("'{field}' is not a URL: {e}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!("'{field}' must be an http(s) URL"));
            }
        }
        Ok(())
    }
}

/// Load and validate the artifact.
///
/// # Errors
///
/// [`ProvisioningError::MissingConfig`] if the file does not exist, `MalformedConfig` /
/// `InvalidConfig` if it cannot be used.
pub fn load_gateway_config(path: &Path) -> Result<GatewayConfig> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ProvisioningError::MissingConfig {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(ProvisioningError::ReadFile {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let cfg: GatewayConfig =
        serde_json::from_slice(&bytes).map_err(|source| ProvisioningError::MalformedConfig {
            path: path.to_path_buf(),
            source,
        })?;
    cfg.validate()
        .map_err(|reason| ProvisioningError::InvalidConfig {
            path: path.to_path_buf(),
            reason,
        })?;
    Ok(cfg)
}

/// Write the artifact, replacing whatever was there.
pub fn save_gateway_config(path: &Path, cfg: &GatewayConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(cfg)?;
    std::fs::write(path, bytes)?;
    tracing::debug!(path = %path.display(), gateway_id = %cfg.gateway_id, "saved gateway config");
    Ok(())
}
