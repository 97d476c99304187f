use agentcore_gateway_provisioning::ProvisioningError;
use rmcp::transport::streamable_http_client::StreamableHttpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Configuration or token acquisition failed.
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    #[error("gateway transport error: {0}")]
    Transport(String),

    /// The gateway answered with something that is not valid MCP for the request.
    #[error("MCP protocol error: {0}")]
    Protocol(String),

    /// A JSON-RPC error object returned by the gateway.
    #[error("gateway returned error {code}: {message}")]
    Rpc { code: i32, message: String },

    #[error("model error: {0}")]
    Model(String),

    #[error("model requested tools for more than {0} rounds in one turn")]
    ToolRoundLimit(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// The configuration artifact does not exist.
    #[must_use]
    pub fn is_missing_config(&self) -> bool {
        matches!(self, Self::Provisioning(e) if e.is_missing_config())
    }
}

impl From<StreamableHttpError<reqwest::Error>> for AgentError {
    fn from(e: StreamableHttpError<reqwest::Error>) -> Self {
        Self::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
