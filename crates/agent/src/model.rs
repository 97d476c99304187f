//! Provider-neutral conversation types and the model seam.

use crate::error::Result;
use async_trait::async_trait;
use rmcp::model::Tool;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolUse {
    /// Model-assigned id echoed back in the matching [`ToolResult`].
    pub id: String,
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub content: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    ToolUse(ToolUse),
    ToolResult(ToolResult),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text(text.into())],
        }
    }

    /// Concatenated text blocks.
    #[must_use]
    pub fn text(&self) -> String {
        let texts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        texts.join("\n")
    }

    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUse> {
        self.content.iter().filter_map(|b| match b {
            ContentBlock::ToolUse(u) => Some(u),
            _ => None,
        })
    }
}

/// A tool as advertised to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolSpec {
    #[must_use]
    pub fn from_mcp(tool: &Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            // Bedrock rejects empty descriptions.
            description: tool
                .description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(&*tool.name)
                .to_string(),
            input_schema: Value::Object((*tool.input_schema).clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

impl StopReason {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "end_turn" | "stop_sequence" => Self::EndTurn,
            "tool_use" => Self::ToolUse,
            "max_tokens" => Self::MaxTokens,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub message: Message,
    pub stop_reason: StopReason,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One model call over the full history. Returns the assistant message.
    async fn converse(
        &self,
        system: Option<&str>,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelReply>;
}
