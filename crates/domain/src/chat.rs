//! Minimal view of an OpenAI-style chat-completion request body.
//!
//! The proxy treats request bodies as opaque JSON except for the three
//! fields it needs: `model`, `messages`, and `stream`. Everything else is
//! preserved verbatim through [`ChatBody::rebuild`] so unknown fields
//! survive the round trip to the upstream untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Messages
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single chat message.
///
/// `content` stays a raw [`Value`] because OpenAI clients send both plain
/// strings and structured content-part arrays; the proxy only ever reads
/// it as text (query extraction) or replaces it wholesale (injection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    /// Omitted entirely when the client never sent it (e.g. assistant
    /// tool-call messages).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub content: Value,
    /// Fields we don't model (`name`, `tool_calls`, `tool_call_id`, …).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ChatMessage {
    /// Build a plain-text message with the given role.
    pub fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_owned(),
            content: Value::String(content.into()),
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == "user"
    }

    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }

    /// The message content as text, if it carries any.
    ///
    /// String content is returned as-is. Structured content-part arrays
    /// are flattened by concatenating their `text` parts.
    pub fn content_text(&self) -> Option<String> {
        match &self.content {
            Value::String(s) => Some(s.clone()),
            Value::Array(parts) => {
                let texts: Vec<&str> = parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect();
                if texts.is_empty() {
                    None
                } else {
                    Some(texts.join("\n"))
                }
            }
            _ => None,
        }
    }

    /// Replace the content with a plain string.
    pub fn set_text(&mut self, text: String) {
        self.content = Value::String(text);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request body
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parsed view of a chat-completion request body.
///
/// Holds the full JSON document alongside the typed fields, so the
/// forwarded body can be rebuilt with every unknown top-level field
/// intact.
#[derive(Debug, Clone)]
pub struct ChatBody {
    /// The complete parsed document.
    raw: Value,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

impl ChatBody {
    /// Parse a request body.
    ///
    /// Requires a JSON object with a string `model` and an array
    /// `messages`; `stream` defaults to false.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let raw: Value = serde_json::from_slice(bytes)?;

        let model = raw
            .get("model")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Other("missing required field: model".into()))?
            .to_owned();

        let messages_val = raw
            .get("messages")
            .ok_or_else(|| Error::Other("missing required field: messages".into()))?;
        let messages: Vec<ChatMessage> = serde_json::from_value(messages_val.clone())?;

        let stream = raw.get("stream").and_then(Value::as_bool).unwrap_or(false);

        Ok(Self {
            raw,
            model,
            messages,
            stream,
        })
    }

    /// Serialize the body for forwarding, overriding `model` and
    /// `messages` while keeping every other top-level field as received.
    pub fn rebuild(&self, upstream_model: &str, messages: &[ChatMessage]) -> Result<Vec<u8>> {
        let mut doc = self.raw.clone();
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| Error::Other("request body is not a JSON object".into()))?;
        obj.insert("model".into(), Value::String(upstream_model.to_owned()));
        obj.insert("messages".into(), serde_json::to_value(messages)?);
        Ok(serde_json::to_vec(&doc)?)
    }
}
