//! Access tokens for the gateway's MCP endpoint (OAuth2 client-credentials grant).

use crate::config::ClientInfo;
use crate::error::{ProvisioningError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

/// Bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self, client: &ClientInfo) -> Result<AccessToken>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Mints tokens from the authorizer's token endpoint.
#[derive(Clone, Default)]
pub struct TokenClient {
    http: reqwest::Client,
}

impl TokenClient {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl TokenSource for TokenClient {
    async fn access_token(&self, client: &ClientInfo) -> Result<AccessToken> {
        let resp = self
            .http
            .post(&client.token_endpoint)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("scope", client.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProvisioningError::Provider(format!("POST token endpoint: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<response body unreadable: {e}>"));
            return Err(ProvisioningError::Provider(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ProvisioningError::Provider(format!("parse token response: {e}")))?;
        tracing::debug!(
            client_id = %client.client_id,
            expires_in = ?token.expires_in,
            "obtained access token"
        );
        Ok(AccessToken(token.access_token))
    }
}
