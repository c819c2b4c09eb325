//! HTTP transport for the chat endpoint.

use std::sync::OnceLock;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::debug;

use crate::config::WeftConfig;
use crate::error::{Result, WeftError};
use crate::types::ChatMessage;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// The outbound request: either the full prior conversation as JSON, or a
/// single-message form submission (the collaborating framework's convention).
#[derive(Debug, Clone)]
pub enum ChatRequest {
    History(Vec<ChatMessage>),
    Message(String),
}

/// Opens a chat request and exposes the response body as a byte stream.
///
/// The trait seam exists so sessions can run against scripted transports in
/// tests; `HttpTransport` is the real implementation.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(&self, request: &ChatRequest) -> Result<BoxStream<'static, Result<Bytes>>>;
}

/// HTTP transport on the shared client.
pub struct HttpTransport {
    endpoint: String,
    csrf_token: Option<String>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, csrf_token: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            csrf_token,
        }
    }

    /// Build a transport from configuration; the endpoint is required.
    pub fn from_config(config: &WeftConfig) -> Result<Self> {
        let endpoint = config
            .endpoint()
            .ok_or_else(|| WeftError::Configuration("missing chat endpoint".into()))?;
        Ok(Self::new(endpoint, config.csrf_token().map(str::to_string)))
    }

    fn build_request(&self, request: &ChatRequest) -> reqwest::RequestBuilder {
        let mut builder = shared_client().post(&self.endpoint);
        if let Some(token) = &self.csrf_token {
            builder = builder.header("X-CSRFToken", token);
        }
        match request {
            ChatRequest::History(messages) => builder.json(messages),
            ChatRequest::Message(text) => {
                let mut form = vec![("message", text.clone())];
                if let Some(token) = &self.csrf_token {
                    form.push(("csrfmiddlewaretoken", token.clone()));
                }
                builder.form(&form)
            }
        }
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    async fn open(&self, request: &ChatRequest) -> Result<BoxStream<'static, Result<Bytes>>> {
        debug!(endpoint = %self.endpoint, "opening chat stream");

        let resp = self.build_request(request).send().await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body));
        }

        let byte_stream = resp.bytes_stream();
        let stream = async_stream::stream! {
            futures::pin_mut!(byte_stream);
            while let Some(chunk) = byte_stream.next().await {
                match chunk {
                    Ok(bytes) => yield Ok(bytes),
                    Err(err) => {
                        yield Err(WeftError::Network(err));
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> WeftError {
    match status {
        429 => WeftError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => WeftError::endpoint(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    // Try to parse retry-after from a JSON error body
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}
