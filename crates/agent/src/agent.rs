//! Model/tool loop for one conversation.

use crate::error::{AgentError, Result};
use crate::model::{ChatModel, ContentBlock, Message, Role, StopReason, ToolResult, ToolSpec};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Upper bound on model calls that request tools within a single user turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 25;

/// Text returned to the model for one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub text: String,
    /// The tool ran and reported failure; the model sees it as an error result.
    pub is_error: bool,
}

#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolOutcome>;
}

pub struct Agent<M, I> {
    model: M,
    tools: I,
    specs: Vec<ToolSpec>,
    system_prompt: Option<String>,
    history: Vec<Message>,
    max_tool_rounds: usize,
}

impl<M, I> Agent<M, I>
where
    M: ChatModel,
    I: ToolInvoker,
{
    pub fn new(model: M, tools: I, specs: Vec<ToolSpec>) -> Self {
        Self {
            model,
            tools,
            specs,
            system_prompt: None,
            history: Vec::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    #[must_use]
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn tool_specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Give back the tool invoker, e.g. to close its session.
    pub fn into_tools(self) -> I {
        self.tools
    }

    /// Run one user turn to completion and return the model's final text.
    ///
    /// History is kept across turns.
    pub async fn send(&mut self, input: &str) -> Result<String> {
        self.history.push(Message::user_text(input));

        for round in 0..=self.max_tool_rounds {
            let reply = self
                .model
                .converse(self.system_prompt.as_deref(), &self.history, &self.specs)
                .await?;
            let calls: Vec<_> = reply.message.tool_uses().cloned().collect();
            self.history.push(reply.message);

            if reply.stop_reason != StopReason::ToolUse || calls.is_empty() {
                if let StopReason::MaxTokens | StopReason::Other(_) = &reply.stop_reason {
                    warn!(stop_reason = ?reply.stop_reason, "model stopped early");
                }
                return Ok(self.last_text());
            }
            if round == self.max_tool_rounds {
                return Err(AgentError::ToolRoundLimit(self.max_tool_rounds));
            }

            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                info!(tool = %call.name, "calling tool");
                debug!(tool = %call.name, input = %call.input, "tool input");
                let outcome = self.tools.invoke(&call.name, call.input).await?;
                if outcome.is_error {
                    warn!(tool = %call.name, "tool reported an error");
                }
                results.push(ContentBlock::ToolResult(ToolResult {
                    tool_use_id: call.id,
                    content: outcome.text,
                    is_error: outcome.is_error,
                }));
            }
            self.history.push(Message {
                role: Role::User,
                content: results,
            });
        }
        Err(AgentError::ToolRoundLimit(self.max_tool_rounds))
    }

    fn last_text(&self) -> String {
        self.history
            .last()
            .map(Message::text)
            .unwrap_or_default()
    }
}
