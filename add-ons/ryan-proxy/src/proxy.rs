//! Router, upstream forwarding and fallbacks.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Assistant backend the proxy forwards to.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Static files; `index.html` is served at `/`.
    #[serde(default)]
    pub public_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backend_url: default_backend_url(),
            public_dir: None,
        }
    }
}

impl ProxyConfig {
    /// Precedence: `RYAN_PROXY__*` env > file at `RYAN_PROXY_CONFIG` (default `config/proxy`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("RYAN_PROXY_CONFIG").unwrap_or_else(|_| "config/proxy".to_string());
        let builder = config::Config::builder()
            .set_default("host", default_host())?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("backend_url", DEFAULT_BACKEND_URL)?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder.add_source(config::File::with_name(&config_path).required(false))
        };

        builder
            .add_source(config::Environment::with_prefix("RYAN_PROXY").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Configured directory, else `./public`, else the crate's own `public/`.
    pub fn public_root(&self) -> PathBuf {
        if let Some(dir) = &self.public_dir {
            return dir.clone();
        }
        let cwd_public = PathBuf::from("public");
        if cwd_public.join("index.html").exists() {
            return cwd_public;
        }
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public")
    }

    fn backend(&self, path: &str) -> String {
        format!("{}/{}", self.backend_url.trim_end_matches('/'), path)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxiedRoute {
    Chat,
    Logs,
}

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("upstream returned {0}")]
    Status(StatusCode),
}

/// Any upstream failure on a proxied route. Renders as the route's 500 fallback.
#[derive(Error, Debug)]
#[error("{route:?} upstream failed: {source}")]
pub struct ProxyError {
    pub route: ProxiedRoute,
    #[source]
    pub source: UpstreamError,
}

impl ProxyError {
    fn on(route: ProxiedRoute) -> impl FnOnce(UpstreamError) -> Self {
        move |source| Self { route, source }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match self.route {
            ProxiedRoute::Chat => {
                tracing::error!("Error connecting to AI: {}", self.source);
                json!({ "response": "AI server is not responding" })
            }
            ProxiedRoute::Logs => {
                tracing::error!("Error fetching logs: {}", self.source);
                json!({ "logs": ["Error fetching logs."] })
            }
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Success means 2xx with a JSON body; everything else is an upstream failure.
async fn json_body(response: reqwest::Response) -> Result<Value, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        let code = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        return Err(UpstreamError::Status(code));
    }
    Ok(response.json::<Value>().await?)
}

async fn chat(State(state): State<AppState>, Json(body): Json<Value>) -> Result<Json<Value>, ProxyError> {
    let url = state.config.backend("chat");
    tracing::debug!("Forwarding chat to {}", url);
    let forward = async {
        let response = state.client.post(&url).json(&body).send().await?;
        json_body(response).await
    };
    forward
        .await
        .map(Json)
        .map_err(ProxyError::on(ProxiedRoute::Chat))
}

async fn logs(State(state): State<AppState>, RawQuery(query): RawQuery) -> Result<Json<Value>, ProxyError> {
    let mut url = state.config.backend("logs");
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(&q);
    }
    tracing::debug!("Forwarding logs to {}", url);
    let forward = async {
        let response = state.client.get(&url).send().await?;
        json_body(response).await
    };
    forward
        .await
        .map(Json)
        .map_err(ProxyError::on(ProxiedRoute::Logs))
}

async fn health() -> &'static str {
    "OK"
}

pub fn build_app(state: AppState) -> Router {
    let public = state.config.public_root();

    Router::new()
        .route("/chat", post(chat))
        .route("/logs", get(logs))
        .route("/health", get(health))
        .route_service("/", ServeFile::new(public.join("index.html")))
        .fallback_service(ServeDir::new(public))
        .with_state(state)
        .layer(CorsLayer::permissive())
}
