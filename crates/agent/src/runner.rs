//! Session lifecycle: load configuration, authenticate, list tools, then chat.
//!
//! Each stage is a distinct type so steps cannot be skipped or repeated:
//!
//! ```text
//! Runner<Uninitialized> -> Runner<Authenticated> -> Runner<ToolsListed> -> Runner<Interactive<M>>
//! ```

use crate::agent::{Agent, DEFAULT_MAX_TOOL_ROUNDS};
use crate::bedrock::DEFAULT_MODEL_ID;
use crate::channel::GatewayChannel;
use crate::error::Result;
use crate::model::{ChatModel, ToolSpec};
use crate::repl::{ReplStyle, run_interactive};
use crate::tools::list_all_tools;
use agentcore_gateway_provisioning::DEFAULT_CONFIG_FILE;
use agentcore_gateway_provisioning::config::{GatewayConfig, load_gateway_config};
use agentcore_gateway_provisioning::token::{AccessToken, TokenSource};
use rmcp::model::Tool;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub config_path: PathBuf,
    pub model_id: String,
    pub system_prompt: Option<String>,
    pub max_tool_rounds: usize,
    pub max_tokens: Option<i32>,
    pub color: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            model_id: DEFAULT_MODEL_ID.to_string(),
            system_prompt: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            max_tokens: None,
            color: false,
        }
    }
}

pub struct Uninitialized;

pub struct Authenticated {
    config: GatewayConfig,
    token: AccessToken,
}

pub struct ToolsListed {
    config: GatewayConfig,
    channel: GatewayChannel,
    tools: Vec<Tool>,
}

pub struct Interactive<M> {
    agent: Agent<M, GatewayChannel>,
}

pub struct Runner<S> {
    settings: RunnerSettings,
    state: S,
}

impl<S> Runner<S> {
    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }
}

impl Runner<Uninitialized> {
    #[must_use]
    pub fn new(settings: RunnerSettings) -> Self {
        Self {
            settings,
            state: Uninitialized,
        }
    }

    /// Load the configuration artifact and mint an access token.
    ///
    /// A missing artifact surfaces as [`crate::AgentError::is_missing_config`].
    pub async fn authenticate<T>(self, tokens: &T) -> Result<Runner<Authenticated>>
    where
        T: TokenSource + ?Sized,
    {
        let config = load_gateway_config(&self.settings.config_path)?;
        info!(gateway_id = %config.gateway_id, "requesting access token");
        let token = tokens.access_token(&config.client_info).await?;
        Ok(Runner {
            settings: self.settings,
            state: Authenticated { config, token },
        })
    }
}

impl Runner<Authenticated> {
    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }

    /// Open the MCP session and enumerate every tool.
    pub async fn list_tools(self, http: reqwest::Client) -> Result<Runner<ToolsListed>> {
        let Authenticated { config, token } = self.state;
        info!(gateway_url = %config.gateway_url, "connecting to gateway");
        let channel = GatewayChannel::connect(http, &config.gateway_url, &token).await?;

        let tools = match list_all_tools(&channel).await {
            Ok(tools) => tools,
            Err(e) => {
                close_quietly(channel).await;
                return Err(e);
            }
        };
        info!(tools = tools.len(), "tools listed");
        Ok(Runner {
            settings: self.settings,
            state: ToolsListed {
                config,
                channel,
                tools,
            },
        })
    }
}

impl Runner<ToolsListed> {
    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }

    pub fn tools(&self) -> &[Tool] {
        &self.state.tools
    }

    /// Bind `model` and the listed tools into an agent.
    pub fn start<M>(self, model: M) -> Runner<Interactive<M>>
    where
        M: ChatModel,
    {
        let ToolsListed { channel, tools, .. } = self.state;
        let specs = tools.iter().map(ToolSpec::from_mcp).collect();
        let agent = Agent::new(model, channel, specs)
            .with_system_prompt(self.settings.system_prompt.clone())
            .with_max_tool_rounds(self.settings.max_tool_rounds);
        Runner {
            settings: self.settings,
            state: Interactive { agent },
        }
    }
}

impl<M> Runner<Interactive<M>>
where
    M: ChatModel,
{
    /// Chat until the user leaves, then close the MCP session.
    ///
    /// A failed turn still closes the session before the error is returned.
    pub async fn run<R, W>(self, input: R, output: &mut W) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let style = ReplStyle {
            color: self.settings.color,
        };
        let mut agent = self.state.agent;
        let outcome = run_interactive(input, output, &mut agent, style).await;
        let channel = agent.into_tools();
        match outcome {
            Ok(turns) => {
                channel.close().await?;
                info!(turns, "session ended");
                Ok(turns)
            }
            Err(e) => {
                close_quietly(channel).await;
                Err(e)
            }
        }
    }
}

async fn close_quietly(channel: GatewayChannel) {
    if let Err(e) = channel.close().await {
        warn!(error = %e, "failed to close MCP session");
    }
}
