//! AI service integration for the outbound vendor call
//!
//! The relay talks to the vendor only through [`GenerativeService`], so the
//! HTTP client can be swapped for [`MockGenerativeClient`] in tests.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiHttpClient;
pub use mock::MockGenerativeClient;

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Raw vendor answer: whatever status and body came back.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Sends `message` to the vendor using the caller's `api_key`.
    ///
    /// Any HTTP status is an `Ok` reply. Only transport failures
    /// (connect, TLS, timeout) return [`crate::Error::Network`].
    async fn generate_content(&self, api_key: &str, message: &Value) -> Result<UpstreamReply>;
}

#[async_trait]
impl<T: GenerativeService + ?Sized> GenerativeService for Arc<T> {
    async fn generate_content(&self, api_key: &str, message: &Value) -> Result<UpstreamReply> {
        (**self).generate_content(api_key, message).await
    }
}
