//! [`ChatModel`] over the Bedrock runtime Converse API.

use crate::error::{AgentError, Result};
use crate::model::{
    ChatModel, ContentBlock, Message, ModelReply, Role, StopReason, ToolResult, ToolSpec, ToolUse,
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::types::{
    self as br, ConversationRole, InferenceConfiguration, SystemContentBlock, ToolConfiguration,
    ToolInputSchema, ToolResultBlock, ToolResultContentBlock, ToolResultStatus, ToolSpecification,
    ToolUseBlock,
};
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::{Document, Number};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Cross-region inference profile for Claude 3.7 Sonnet.
pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-3-7-sonnet-20250219-v1:0";

pub struct BedrockModel {
    client: Client,
    model_id: String,
    max_tokens: Option<i32>,
}

impl BedrockModel {
    #[must_use]
    pub fn new(sdk: &SdkConfig, model_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(sdk),
            model_id: model_id.into(),
            max_tokens: None,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: Option<i32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn request_error(e: impl std::fmt::Display) -> AgentError {
    AgentError::Model(format!("invalid request: {e}"))
}

#[async_trait]
impl ChatModel for BedrockModel {
    async fn converse(
        &self,
        system: Option<&str>,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelReply> {
        let messages = history
            .iter()
            .map(to_bedrock_message)
            .collect::<Result<Vec<_>>>()?;

        let mut request = self
            .client
            .converse()
            .model_id(&self.model_id)
            .set_messages(Some(messages));
        if let Some(system) = system {
            request = request.system(SystemContentBlock::Text(system.to_string()));
        }
        if !tools.is_empty() {
            let specs = tools
                .iter()
                .map(to_bedrock_tool)
                .collect::<Result<Vec<_>>>()?;
            request = request.tool_config(
                ToolConfiguration::builder()
                    .set_tools(Some(specs))
                    .build()
                    .map_err(request_error)?,
            );
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request
                .inference_config(InferenceConfiguration::builder().max_tokens(max_tokens).build());
        }

        let out = request
            .send()
            .await
            .map_err(|e| AgentError::Model(DisplayErrorContext(e).to_string()))?;

        let stop_reason = StopReason::parse(out.stop_reason().as_str());
        let Some(br::ConverseOutput::Message(message)) = out.output() else {
            return Err(AgentError::Model("response carried no message".to_string()));
        };
        let message = from_bedrock_message(message)?;
        debug!(
            model = %self.model_id,
            stop_reason = ?stop_reason,
            tool_uses = message.tool_uses().count(),
            "model replied"
        );
        Ok(ModelReply {
            message,
            stop_reason,
        })
    }
}

fn to_bedrock_message(message: &Message) -> Result<br::Message> {
    let role = match message.role {
        Role::User => ConversationRole::User,
        Role::Assistant => ConversationRole::Assistant,
    };
    let content = message
        .content
        .iter()
        .map(|block| -> Result<br::ContentBlock> {
            Ok(match block {
                ContentBlock::Text(text) => br::ContentBlock::Text(text.clone()),
                ContentBlock::ToolUse(u) => br::ContentBlock::ToolUse(
                    ToolUseBlock::builder()
                        .tool_use_id(&u.id)
                        .name(&u.name)
                        .input(value_to_document(&u.input))
                        .build()
                        .map_err(request_error)?,
                ),
                ContentBlock::ToolResult(r) => br::ContentBlock::ToolResult(
                    ToolResultBlock::builder()
                        .tool_use_id(&r.tool_use_id)
                        .content(ToolResultContentBlock::Text(r.content.clone()))
                        .status(if r.is_error {
                            ToolResultStatus::Error
                        } else {
                            ToolResultStatus::Success
                        })
                        .build()
                        .map_err(request_error)?,
                ),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    br::Message::builder()
        .role(role)
        .set_content(Some(content))
        .build()
        .map_err(request_error)
}

fn from_bedrock_message(message: &br::Message) -> Result<Message> {
    let role = match message.role() {
        ConversationRole::User => Role::User,
        _ => Role::Assistant,
    };
    let mut content = Vec::with_capacity(message.content().len());
    for block in message.content() {
        match block {
            br::ContentBlock::Text(text) => content.push(ContentBlock::Text(text.clone())),
            br::ContentBlock::ToolUse(u) => content.push(ContentBlock::ToolUse(ToolUse {
                id: u.tool_use_id().to_string(),
                name: u.name().to_string(),
                input: document_to_value(u.input()),
            })),
            br::ContentBlock::ToolResult(r) => {
                let text = r
                    .content()
                    .iter()
                    .filter_map(|c| match c {
                        ToolResultContentBlock::Text(t) => Some(t.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                content.push(ContentBlock::ToolResult(ToolResult {
                    tool_use_id: r.tool_use_id().to_string(),
                    content: text,
                    is_error: r.status() == Some(&ToolResultStatus::Error),
                }));
            }
            // Reasoning and other block kinds are not replayed.
            other => debug!(block = ?other, "ignoring unsupported content block"),
        }
    }
    Ok(Message { role, content })
}

fn to_bedrock_tool(spec: &ToolSpec) -> Result<br::Tool> {
    let spec = ToolSpecification::builder()
        .name(&spec.name)
        .description(&spec.description)
        .input_schema(ToolInputSchema::Json(value_to_document(&spec.input_schema)))
        .build()
        .map_err(request_error)?;
    Ok(br::Tool::ToolSpec(spec))
}

pub(crate) fn value_to_document(value: &Value) -> Document {
    match value {
        Value::Null => Document::Null,
        Value::Bool(b) => Document::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(Number::NegInt(i))
            } else {
                n.as_f64()
                    .map_or(Document::Null, |f| Document::Number(Number::Float(f)))
            }
        }
        Value::String(s) => Document::String(s.clone()),
        Value::Array(items) => Document::Array(items.iter().map(value_to_document).collect()),
        Value::Object(map) => Document::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_document(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

pub(crate) fn document_to_value(document: &Document) -> Value {
    match document {
        Document::Null => Value::Null,
        Document::Bool(b) => Value::Bool(*b),
        Document::Number(Number::PosInt(u)) => Value::from(*u),
        Document::Number(Number::NegInt(i)) => Value::from(*i),
        Document::Number(Number::Float(f)) => {
            serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number)
        }
        Document::String(s) => Value::String(s.clone()),
        Document::Array(items) => Value::Array(items.iter().map(document_to_value).collect()),
        Document::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), document_to_value(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn documents_preserve_json_values() {
        let value = json!({
            "location": "Seattle",
            "days": 3,
            "offset": -2,
            "ratio": 0.5,
            "flags": [true, null],
            "nested": { "unit": "C" }
        });
        assert_eq!(document_to_value(&value_to_document(&value)), value);
    }

    #[test]
    fn tool_results_carry_error_status() {
        let message = Message {
            role: Role::User,
            content: vec![ContentBlock::ToolResult(ToolResult {
                tool_use_id: "tu-1".to_string(),
                content: "boom".to_string(),
                is_error: true,
            })],
        };
        let converted = to_bedrock_message(&message).expect("convert");
        let br::ContentBlock::ToolResult(block) = &converted.content()[0] else {
            panic!("expected a tool result block");
        };
        assert_eq!(block.status(), Some(&ToolResultStatus::Error));
        assert_eq!(from_bedrock_message(&converted).expect("back"), message);
    }
}
