//! Client configuration
//!
//! The host passes its installation parameters as a JSON object with camelCase
//! keys; [`ClientConfig`] deserializes straight from it.

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::{PickerError, Result};

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// GraphQL endpoint of the store
    pub api_endpoint: String,
    /// App token sent in the `Authorization-Bearer` header
    pub api_token: String,
    /// When disabled, every fetch ignores the channel the caller passes
    #[serde(default = "default_channel_filter", deserialize_with = "bool_or_string")]
    pub enable_channel_filter: bool,
}

fn default_channel_filter() -> bool {
    true
}

// The host stores every installation parameter as a string, so this flag
// arrives as "true"/"false"; plain booleans are accepted as well.
fn bool_or_string<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "enableChannelFilter must be \"true\" or \"false\", got \"{other}\""
            ))),
        },
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("api_endpoint", &self.api_endpoint)
            .field("api_token", &"<redacted>")
            .field("enable_channel_filter", &self.enable_channel_filter)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_endpoint: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            api_token: api_token.into(),
            enable_channel_filter: true,
        }
    }

    pub fn with_channel_filter(mut self, enabled: bool) -> Self {
        self.enable_channel_filter = enabled;
        self
    }

    /// Parse installation parameters
    pub fn from_json(parameters: serde_json::Value) -> Result<Self> {
        serde_json::from_value(parameters).map_err(|e| PickerError::Config(e.to_string()))
    }

    /// Check that both endpoint and token are present
    pub fn validate(&self) -> Result<()> {
        if self.api_endpoint.trim().is_empty() {
            return Err(PickerError::Config("Missing API Endpoint".to_string()));
        }
        if self.api_token.trim().is_empty() {
            return Err(PickerError::Config("Missing API Token".to_string()));
        }
        Ok(())
    }
}
