use super::types::GenerateContentRequest;
use crate::ai::{GenerativeService, UpstreamReply};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{redirect, Client};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GENERATE_CONTENT_PATH: &str = "/v1beta/models/gemini-pro:generateContent";
const CLIENT_USER_AGENT: &str = "GeminiChatBot/1.0";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 30;

/// Gemini REST client that makes exactly one `generateContent` call per request.
pub struct GeminiHttpClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(CLIENT_USER_AGENT)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self::new_with_client(client))
    }

    pub fn new_with_client(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Points the client at another host, e.g. a local mock vendor.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full endpoint URL. The key is appended as-is.
    pub fn endpoint_url(&self, api_key: &str) -> String {
        format!(
            "{}{}?key={}",
            self.base_url.trim_end_matches('/'),
            GENERATE_CONTENT_PATH,
            api_key
        )
    }
}

/// Flattens a transport error and its causes into one line.
///
/// The URL is stripped first since it carries the caller's key.
fn network_detail(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut detail = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}

#[async_trait]
impl GenerativeService for GeminiHttpClient {
    async fn generate_content(&self, api_key: &str, message: &Value) -> Result<UpstreamReply> {
        let request = GenerateContentRequest::for_message(message);

        tracing::debug!("Sending generateContent request to Gemini");

        let response = self
            .client
            .post(self.endpoint_url(api_key))
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                let detail = network_detail(e);
                tracing::error!("Failed to send request to Gemini: {}", detail);
                Error::Network(detail)
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            let detail = network_detail(e);
            tracing::error!("Failed to read Gemini response body: {}", detail);
            Error::Network(detail)
        })?;

        if status != 200 {
            tracing::error!("Gemini API error (status {}): {}", status, body);
        }

        Ok(UpstreamReply { status, body })
    }
}
