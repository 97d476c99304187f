//! Target registration requests.

use crate::error::{ProvisioningError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of backend a gateway target routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    /// A Lambda function.
    ManagedFunction,
    /// A REST API described by an `OpenAPI` document.
    DescribedRestApi,
}

impl TargetType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManagedFunction => "lambda",
            Self::DescribedRestApi => "openApiSchema",
        }
    }
}

/// One tool served by a Lambda target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema of the tool input (`type: object`).
    pub input_schema: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TargetPayload {
    /// Full `OpenAPI` document serialized as JSON.
    InlineOpenApi(String),
    /// `OpenAPI` document stored in S3.
    OpenApiS3 {
        uri: String,
        bucket_owner_account_id: Option<String>,
    },
    /// An existing function and the tools it implements.
    Lambda {
        function_arn: String,
        tools: Vec<ToolSchema>,
    },
}

/// Where the gateway places the API key on outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialLocation {
    QueryParameter,
    Header,
}

impl CredentialLocation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QueryParameter => "QUERY_PARAMETER",
            Self::Header => "HEADER",
        }
    }
}

impl fmt::Display for CredentialLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialLocation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("QUERY_PARAMETER") || s.eq_ignore_ascii_case("query") {
            Ok(Self::QueryParameter)
        } else if s.eq_ignore_ascii_case("HEADER") {
            Ok(Self::Header)
        } else {
            Err(format!(
                "unknown credential location '{s}' (expected QUERY_PARAMETER or HEADER)"
            ))
        }
    }
}

/// API key the gateway injects into every call to the target.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialInjection {
    pub api_key: String,
    pub credential_location: CredentialLocation,
    pub credential_parameter_name: String,
}

impl fmt::Debug for CredentialInjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialInjection")
            .field("api_key", &"<redacted>")
            .field("credential_location", &self.credential_location)
            .field("credential_parameter_name", &self.credential_parameter_name)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetDescriptor {
    /// Generated by the provider implementation when `None`.
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_type: TargetType,
    pub payload: Option<TargetPayload>,
    pub credentials: Option<CredentialInjection>,
}

impl TargetDescriptor {
    /// Lambda target with nothing specified; the provider supplies a function.
    #[must_use]
    pub fn managed_function() -> Self {
        Self {
            name: None,
            description: None,
            target_type: TargetType::ManagedFunction,
            payload: None,
            credentials: None,
        }
    }

    /// REST API target from an inline `OpenAPI` JSON document.
    #[must_use]
    pub fn openapi_inline(document: String, credentials: Option<CredentialInjection>) -> Self {
        Self {
            name: None,
            description: None,
            target_type: TargetType::DescribedRestApi,
            payload: Some(TargetPayload::InlineOpenApi(document)),
            credentials,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Reject combinations the gateway cannot represent.
    pub fn validate(&self) -> Result<()> {
        match (self.target_type, &self.payload) {
            (TargetType::ManagedFunction, None | Some(TargetPayload::Lambda { .. }))
            | (
                TargetType::DescribedRestApi,
                Some(TargetPayload::InlineOpenApi(_) | TargetPayload::OpenApiS3 { .. }),
            ) => {}
            (TargetType::DescribedRestApi, None) => {
                return Err(ProvisioningError::InvalidTarget(
                    "an OpenAPI target needs a payload".to_string(),
                ));
            }
            (t, Some(_)) => {
                return Err(ProvisioningError::InvalidTarget(format!(
                    "payload does not match target type '{}'",
                    t.as_str()
                )));
            }
        }
        if self.target_type == TargetType::ManagedFunction && self.credentials.is_some() {
            return Err(ProvisioningError::InvalidTarget(
                "Lambda targets use the gateway role; API key credentials are not supported"
                    .to_string(),
            ));
        }
        if let Some(creds) = &self.credentials {
            if creds.api_key.is_empty() {
                return Err(ProvisioningError::InvalidTarget(
                    "api_key must not be empty".to_string(),
                ));
            }
            if creds.credential_parameter_name.trim().is_empty() {
                return Err(ProvisioningError::InvalidTarget(
                    "credential_parameter_name must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
