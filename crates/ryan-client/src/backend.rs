//! Backend REST surface: chat, logs, memory and document upload.

use std::time::Duration;

use reqwest::{Response, Url};
use ryan_core::protocol::MemoryUpdate;
use ryan_core::{ChatRequest, ChatResponse, ContentMessage, LogsResponse, MemoryItem, UploadRequest};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// Everything the client needs from the assistant backend.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> ClientResult<ChatResponse>;

    async fn logs(&self, limit: u64, offset: u64) -> ClientResult<LogsResponse>;

    async fn memory(&self) -> ClientResult<Vec<MemoryItem>>;

    async fn update_memory(&self, key: &str, value: &str) -> ClientResult<ContentMessage>;

    async fn delete_memory(&self, key: &str) -> ClientResult<ContentMessage>;

    async fn upload_document(&self, request: &UploadRequest) -> ClientResult<ChatResponse>;
}

/// [`Backend`] over HTTP with `reqwest`.
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base = Url::parse(base_url).map_err(|e| ClientError::Url(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Url(format!("{} cannot be a base URL", base_url)));
        }
        let client = reqwest::Client::builder()
            .user_agent("ryan-client")
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Appends percent-encoded path segments to the base URL.
    pub fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Url(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Decodes a 2xx body, or turns anything else into [`ClientError::Http`].
async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.json::<serde_json::Value>().await.ok();
        let content = body
            .as_ref()
            .and_then(|v| v.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string);
        warn!("Backend returned {}: {:?}", status, content);
        return Err(ClientError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            content,
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Malformed(e.to_string()))
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn chat(&self, request: &ChatRequest) -> ClientResult<ChatResponse> {
        let url = self.endpoint(&["chat"])?;
        debug!("POST {}", url);
        decode(self.client.post(url).json(request).send().await?).await
    }

    async fn logs(&self, limit: u64, offset: u64) -> ClientResult<LogsResponse> {
        let mut url = self.endpoint(&["logs"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        debug!("GET {}", url);
        decode(self.client.get(url).send().await?).await
    }

    async fn memory(&self) -> ClientResult<Vec<MemoryItem>> {
        let url = self.endpoint(&["memory"])?;
        decode(self.client.get(url).send().await?).await
    }

    async fn update_memory(&self, key: &str, value: &str) -> ClientResult<ContentMessage> {
        let url = self.endpoint(&["memory", key])?;
        let body = MemoryUpdate {
            value: value.to_string(),
        };
        decode(self.client.put(url).json(&body).send().await?).await
    }

    async fn delete_memory(&self, key: &str) -> ClientResult<ContentMessage> {
        let url = self.endpoint(&["memory", key])?;
        decode(self.client.delete(url).send().await?).await
    }

    async fn upload_document(&self, request: &UploadRequest) -> ClientResult<ChatResponse> {
        let url = self.endpoint(&["upload_document"])?;
        decode(self.client.post(url).json(request).send().await?).await
    }
}
