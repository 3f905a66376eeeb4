//! Wire types for the assistant backend's REST surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /chat` body. `creative_context` is always sent, as `null` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub creative_context: Option<String>,
}

/// Response type tags understood by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseKind {
    Text,
    Error,
    ImageResults,
    Code,
    Creative,
    Logs,
    Memory,
    Other(String),
}

impl ResponseKind {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "text" => Self::Text,
            "error" => Self::Error,
            "image_results" => Self::ImageResults,
            "code" => Self::Code,
            "creative" => Self::Creative,
            "logs" => Self::Logs,
            "memory" => Self::Memory,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Error => "error",
            Self::ImageResults => "image_results",
            Self::Code => "code",
            Self::Creative => "creative",
            Self::Logs => "logs",
            Self::Memory => "memory",
            Self::Other(s) => s,
        }
    }
}

/// `POST /chat` and `POST /upload_document` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl ChatResponse {
    pub fn new(kind: &str, content: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.to_string()),
            content: Some(Value::String(content.into())),
            query: None,
        }
    }

    /// Type tag, defaulting to `text`.
    pub fn type_name(&self) -> &str {
        self.kind.as_deref().unwrap_or("text")
    }

    pub fn response_kind(&self) -> ResponseKind {
        ResponseKind::parse(self.type_name())
    }

    /// Content as display text. `null` counts as missing; non-strings are JSON-encoded.
    pub fn content_text(&self) -> Option<String> {
        match &self.content {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// `GET /logs` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogsResponse {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

impl LogsResponse {
    pub fn logs(content: impl Into<String>, next_offset: Option<u64>, has_more: Option<bool>) -> Self {
        Self {
            kind: Some("logs".to_string()),
            content: Some(Value::String(content.into())),
            next_offset,
            has_more,
        }
    }
}

/// One entry of `GET /memory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

impl MemoryItem {
    /// Strings are shown verbatim, anything else as JSON.
    pub fn display_value(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// `PUT /memory/{key}` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryUpdate {
    pub value: String,
}

/// Acknowledgement or error body carrying a human-readable `content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Why a request produced no usable payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Non-2xx status; carries the body's `content` or the status text.
    Http(String),
    /// Transport failure or undecodable body.
    Network(String),
}

impl Failure {
    pub fn detail(&self) -> &str {
        match self {
            Self::Http(d) | Self::Network(d) => d,
        }
    }

    /// `"{http_prefix}: {detail}"` for HTTP failures, `"{network_prefix}: {detail}"` otherwise.
    pub fn describe(&self, http_prefix: &str, network_prefix: &str) -> String {
        match self {
            Self::Http(d) => format!("{}: {}", http_prefix, d),
            Self::Network(d) => format!("{}: {}", network_prefix, d),
        }
    }
}

/// `POST /upload_document` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileContent")]
    pub file_content: String,
}
