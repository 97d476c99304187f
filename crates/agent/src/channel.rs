//! MCP session with the gateway over streamable HTTP.

use crate::agent::{ToolInvoker, ToolOutcome};
use crate::error::{AgentError, Result};
use crate::streamable_http;
use crate::tools::{ToolPage, ToolSource};
use agentcore_gateway_provisioning::token::AccessToken;
use async_trait::async_trait;
use futures::StreamExt as _;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rmcp::model::{
    CallToolResult, ClientJsonRpcMessage, ListToolsResult, RawContent, ServerJsonRpcMessage,
    ServerResult,
};
use rmcp::transport::streamable_http_client::StreamableHttpPostResponse;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::{debug, warn};

pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// An initialized MCP session bound to one gateway URL and access token.
pub struct GatewayChannel {
    http: reqwest::Client,
    url: String,
    headers: HeaderMap,
    session_id: Option<String>,
    next_id: AtomicI64,
}

impl std::fmt::Debug for GatewayChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayChannel")
            .field("url", &self.url)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl GatewayChannel {
    /// Run the `initialize` handshake and send `notifications/initialized`.
    pub async fn connect(http: reqwest::Client, url: &str, token: &AccessToken) -> Result<Self> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.secret()))
            .map_err(|_| AgentError::Protocol("access token is not a valid header value".into()))?;
        bearer.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let init: ClientJsonRpcMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION")
                }
            }
        }))?;
        let resp = streamable_http::post_message(&http, url, &init, None, &headers).await?;
        let (msg, session_id) = resp.expect_initialized::<reqwest::Error>().await?;
        if let ServerJsonRpcMessage::Error(e) = msg {
            return Err(AgentError::Rpc {
                code: e.error.code.0,
                message: e.error.message.to_string(),
            });
        }
        debug!(url, session_id = ?session_id, "MCP session initialized");

        // The session is not usable until the client confirms initialization.
        let initialized: ClientJsonRpcMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))?;
        match streamable_http::post_message(
            &http,
            url,
            &initialized,
            session_id.as_deref(),
            &headers,
        )
        .await?
        {
            StreamableHttpPostResponse::Accepted => {}
            other => warn!(response = ?other, "unexpected response to notifications/initialized"),
        }

        Ok(Self {
            http,
            url: url.to_string(),
            headers,
            session_id,
            next_id: AtomicI64::new(1),
        })
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    async fn request(&self, method: &str, params: Value) -> Result<ServerResult> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let message: ClientJsonRpcMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        }))?;
        let resp = streamable_http::post_message(
            &self.http,
            &self.url,
            &message,
            self.session_id.as_deref(),
            &self.headers,
        )
        .await?;
        read_first_response(resp).await
    }

    /// Fetch one page of `tools/list`.
    pub async fn list_tools_page(&self, cursor: Option<&str>) -> Result<ToolPage> {
        let params = match cursor {
            Some(cursor) => json!({ "cursor": cursor }),
            None => json!({}),
        };
        let result = self.request("tools/list", params).await?;
        let result: ListToolsResult = serde_json::from_value(serde_json::to_value(result)?)
            .map_err(|e| AgentError::Protocol(format!("tools/list result: {e}")))?;
        Ok(ToolPage {
            tools: result.tools,
            next_cursor: result.next_cursor,
        })
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let arguments = match arguments {
            Value::Object(map) => Value::Object(map),
            Value::Null => json!({}),
            other => {
                return Err(AgentError::Protocol(format!(
                    "tool arguments must be an object, got {other}"
                )));
            }
        };
        let result = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        serde_json::from_value(serde_json::to_value(result)?)
            .map_err(|e| AgentError::Protocol(format!("tools/call result: {e}")))
    }

    /// End the session. Only issues a request when the gateway assigned a session id.
    pub async fn close(self) -> Result<()> {
        if let Some(session_id) = &self.session_id {
            streamable_http::delete_session(&self.http, &self.url, session_id, &self.headers)
                .await?;
            debug!(session_id = %session_id, "MCP session closed");
        }
        Ok(())
    }
}

async fn read_first_response(resp: StreamableHttpPostResponse) -> Result<ServerResult> {
    match resp {
        StreamableHttpPostResponse::Json(msg, ..) => response_result(msg)?
            .ok_or_else(|| AgentError::Protocol("expected a JSON-RPC response".into())),
        StreamableHttpPostResponse::Sse(mut stream, ..) => {
            while let Some(event) = stream.next().await {
                let event = event.map_err(|e| AgentError::Transport(e.to_string()))?;
                let payload = event.data.unwrap_or_default();
                if payload.trim().is_empty() {
                    continue;
                }
                let msg: ServerJsonRpcMessage = serde_json::from_str(&payload)?;
                // Notifications and server requests may precede the response.
                if let Some(result) = response_result(msg)? {
                    return Ok(result);
                }
            }
            Err(AgentError::Protocol("event stream ended without a response".into()))
        }
        StreamableHttpPostResponse::Accepted => Err(AgentError::Protocol(
            "request was accepted without a response".into(),
        )),
    }
}

fn response_result(msg: ServerJsonRpcMessage) -> Result<Option<ServerResult>> {
    match msg {
        ServerJsonRpcMessage::Response(r) => Ok(Some(r.result)),
        ServerJsonRpcMessage::Error(e) => Err(AgentError::Rpc {
            code: e.error.code.0,
            message: e.error.message.to_string(),
        }),
        _ => Ok(None),
    }
}

/// Flatten a tool result into text for the model.
pub(crate) fn outcome_from_result(result: &CallToolResult) -> ToolOutcome {
    let mut parts = Vec::with_capacity(result.content.len());
    for content in &result.content {
        match &content.raw {
            RawContent::Text(t) => parts.push(t.text.clone()),
            other => parts.push(serde_json::to_string(other).unwrap_or_default()),
        }
    }
    if parts.is_empty()
        && let Some(structured) = &result.structured_content
    {
        parts.push(structured.to_string());
    }
    ToolOutcome {
        text: parts.join("\n"),
        is_error: result.is_error.unwrap_or(false),
    }
}

#[async_trait]
impl ToolSource for GatewayChannel {
    async fn list_tools_page(&self, cursor: Option<String>) -> Result<ToolPage> {
        GatewayChannel::list_tools_page(self, cursor.as_deref()).await
    }
}

#[async_trait]
impl ToolInvoker for GatewayChannel {
    async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolOutcome> {
        match self.call_tool(name, arguments).await {
            Ok(result) => Ok(outcome_from_result(&result)),
            // Unknown tool or rejected arguments: let the model see it and recover.
            Err(AgentError::Rpc { code, message }) => Ok(ToolOutcome {
                text: format!("error {code}: {message}"),
                is_error: true,
            }),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_joins_text_and_keeps_error_flag() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "first" },
                { "type": "text", "text": "second" }
            ],
            "isError": true
        }))
        .expect("result");
        let outcome = outcome_from_result(&result);
        assert_eq!(outcome.text, "first\nsecond");
        assert!(outcome.is_error);
    }

    #[test]
    fn structured_content_is_used_when_there_is_no_text() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [],
            "structuredContent": { "temp": 21 }
        }))
        .expect("result");
        let outcome = outcome_from_result(&result);
        assert_eq!(outcome.text, r#"{"temp":21}"#);
        assert!(!outcome.is_error);
    }
}
