//! Selection token encoding
//!
//! A selection token is the string the host CMS stores in its field value for
//! every picked entity. Tokens written by earlier releases must keep decoding,
//! so the layout is frozen:
//!
//! ```text
//! {"ID":"<raw id>","Type":"<Category|Collection|Product|Variant>","Channel":"<channel slug>"}
//! ```

use serde::{Deserialize, Serialize};

use crate::types::EntityType;
use crate::{PickerError, Result};

/// Components of a selection token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecodedToken {
    #[serde(rename = "ID")]
    pub raw_id: String,
    #[serde(rename = "Type")]
    pub entity_type: EntityType,
    #[serde(rename = "Channel")]
    pub channel: String,
}

impl DecodedToken {
    pub fn new(
        raw_id: impl Into<String>,
        entity_type: EntityType,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            raw_id: raw_id.into(),
            entity_type,
            channel: channel.into(),
        }
    }

    pub fn encode(&self) -> String {
        TokenCodec::encode(&self.raw_id, self.entity_type, &self.channel)
    }
}

/// Selection token encoding/decoding
pub struct TokenCodec;

impl TokenCodec {
    /// Encode an entity reference into a token
    pub fn encode(raw_id: &str, entity_type: EntityType, channel: &str) -> String {
        #[derive(Serialize)]
        struct Wire<'a> {
            #[serde(rename = "ID")]
            raw_id: &'a str,
            #[serde(rename = "Type")]
            entity_type: EntityType,
            #[serde(rename = "Channel")]
            channel: &'a str,
        }

        // Serializing string fields and a unit enum variant cannot fail.
        serde_json::to_string(&Wire {
            raw_id,
            entity_type,
            channel,
        })
        .unwrap_or_default()
    }

    /// Decode a token previously produced by [`TokenCodec::encode`]
    pub fn decode(token: &str) -> Result<DecodedToken> {
        let trimmed = token.trim();
        // Derived struct deserialization would also take a positional array.
        if !trimmed.starts_with('{') {
            return Err(PickerError::MalformedToken(format!(
                "expected a JSON object: {}",
                abbreviate(token)
            )));
        }
        serde_json::from_str(trimmed)
            .map_err(|e| PickerError::MalformedToken(format!("{e}: {}", abbreviate(token))))
    }
}

fn abbreviate(token: &str) -> String {
    const MAX_LEN: usize = 80;
    if token.chars().count() <= MAX_LEN {
        token.to_owned()
    } else {
        format!("{}...", token.chars().take(MAX_LEN).collect::<String>())
    }
}
