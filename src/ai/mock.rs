use super::{GenerativeService, UpstreamReply};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Scripted outcome for one mock call.
#[derive(Debug, Clone)]
enum MockOutcome {
    Reply(UpstreamReply),
    NetworkFailure(String),
}

pub struct MockGenerativeClient {
    outcomes: Arc<Mutex<Vec<MockOutcome>>>,
    last_call: Arc<Mutex<Option<(String, Value)>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockGenerativeClient {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            last_call: Arc::new(Mutex::new(None)),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_reply(self, status: u16, body: impl Into<String>) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push(MockOutcome::Reply(UpstreamReply::new(status, body)));
        self
    }

    /// Convenience for a 200 reply carrying `text` at the success path.
    pub fn with_text_reply(self, text: &str) -> Self {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        });
        self.with_reply(200, body.to_string())
    }

    pub fn with_network_failure(self, detail: impl Into<String>) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push(MockOutcome::NetworkFailure(detail.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// `(api_key, message)` of the most recent call.
    pub fn last_call(&self) -> Option<(String, Value)> {
        self.last_call.lock().unwrap().clone()
    }
}

impl Default for MockGenerativeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeService for MockGenerativeClient {
    async fn generate_content(&self, api_key: &str, message: &Value) -> Result<UpstreamReply> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        *self.last_call.lock().unwrap() = Some((api_key.to_string(), message.clone()));

        let outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            // Default mock response echoes the message
            let echoed = match message {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            let body = serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": format!("Echo: {}", echoed) }] } }]
            });
            return Ok(UpstreamReply::new(200, body.to_string()));
        }

        let index = (*count - 1) % outcomes.len();
        match &outcomes[index] {
            MockOutcome::Reply(reply) => Ok(reply.clone()),
            MockOutcome::NetworkFailure(detail) => Err(Error::Network(detail.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_default_echoes_message() {
        let client = MockGenerativeClient::new();
        let reply = client.generate_content("k", &json!("ping")).await.unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("Echo: ping"));
    }

    #[tokio::test]
    async fn test_mock_cycles_outcomes() {
        let client = MockGenerativeClient::new()
            .with_reply(503, "busy")
            .with_network_failure("connection reset");

        let first = client.generate_content("k", &json!("m")).await.unwrap();
        assert_eq!(first, UpstreamReply::new(503, "busy"));

        let second = client.generate_content("k", &json!("m")).await.unwrap_err();
        assert!(matches!(second, Error::Network(ref d) if d == "connection reset"));

        // Should cycle back
        let third = client.generate_content("k", &json!("m")).await.unwrap();
        assert_eq!(third.status, 503);
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let client = MockGenerativeClient::new();

        assert_eq!(client.get_call_count(), 0);
        assert!(client.last_call().is_none());

        client.generate_content("key-1", &json!("hello")).await.unwrap();
        assert_eq!(client.get_call_count(), 1);
        assert_eq!(
            client.last_call(),
            Some(("key-1".to_string(), json!("hello")))
        );
    }
}
