//! Request relay between the simplified client protocol and Gemini.
//!
//! [`Relay::handle`] runs the whole pipeline for one request: method gate,
//! input validation, one outbound call, and classification of the vendor
//! body. Every outcome maps to exactly one status and JSON body.

use crate::ai::gemini::VendorResponse;
use crate::ai::GenerativeService;
use crate::models::{ClientResponse, ErrorBody, IncomingRequest};
use crate::Result;
use axum::http::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

/// Terminal failure for a single relay call.
///
/// The display text is the `error` field sent to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    #[error("Only POST method allowed")]
    MethodNotAllowed,

    #[error("Missing message or apiKey")]
    BadRequest,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error")]
    Upstream { status: u16, body: String },

    #[error("Invalid JSON response from Gemini")]
    InvalidUpstreamBody,

    #[error("Gemini API error")]
    Vendor(Value),

    #[error("Unexpected response format")]
    UnexpectedFormat(Value),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest | Self::Vendor(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => {
                // reqwest only yields codes in 100..=999, so the fallback
                // is unreachable from the HTTP client.
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Network(_) | Self::InvalidUpstreamBody | Self::UnexpectedFormat(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn into_body(self) -> ErrorBody {
        let body = ErrorBody::new(self.to_string());
        match self {
            Self::Upstream { status, body: raw } => {
                body.with_status(status).with_response(Value::String(raw))
            }
            Self::Vendor(details) => body.with_details(details),
            Self::UnexpectedFormat(response) => body.with_response(response),
            Self::MethodNotAllowed
            | Self::BadRequest
            | Self::Network(_)
            | Self::InvalidUpstreamBody => body,
        }
    }
}

/// Status and optional JSON body produced by [`Relay::handle`].
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: StatusCode,
    /// `None` only for the CORS preflight.
    pub body: Option<ClientResponse>,
}

impl RelayResponse {
    pub fn preflight() -> Self {
        Self {
            status: StatusCode::OK,
            body: None,
        }
    }

    pub fn success(text: String) -> Self {
        Self {
            status: StatusCode::OK,
            body: Some(ClientResponse::success(text)),
        }
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        match &self.body {
            Some(body) => Ok(serde_json::to_vec(body)?),
            None => Ok(Vec::new()),
        }
    }
}

impl From<RelayError> for RelayResponse {
    fn from(err: RelayError) -> Self {
        Self {
            status: err.status(),
            body: Some(ClientResponse::Failure(err.into_body())),
        }
    }
}

pub struct Relay {
    service: Box<dyn GenerativeService>,
}

impl Relay {
    pub fn new(service: Box<dyn GenerativeService>) -> Self {
        Self { service }
    }

    /// Handles one inbound request.
    pub async fn handle(&self, method: &Method, body: &[u8]) -> RelayResponse {
        let span = tracing::info_span!("relay", request_id = %Uuid::new_v4(), method = %method);

        async {
            if *method == Method::OPTIONS {
                tracing::debug!("Accepted CORS preflight");
                return RelayResponse::preflight();
            }

            match self.relay(method, body).await {
                Ok(text) => {
                    tracing::info!("Relayed Gemini response ({} bytes)", text.len());
                    RelayResponse::success(text)
                }
                Err(err) => {
                    let status = err.status();
                    if status.is_server_error() || matches!(err, RelayError::Vendor(_)) {
                        tracing::error!(status = status.as_u16(), "Relay failed: {}", err);
                    } else {
                        tracing::warn!(status = status.as_u16(), "Relay rejected: {}", err);
                    }
                    err.into()
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn relay(&self, method: &Method, body: &[u8]) -> std::result::Result<String, RelayError> {
        if *method != Method::POST {
            return Err(RelayError::MethodNotAllowed);
        }

        let request = IncomingRequest::parse(body).ok_or(RelayError::BadRequest)?;

        let reply = self
            .service
            .generate_content(&request.api_key, &request.message)
            .await
            .map_err(|e| RelayError::Network(e.to_string()))?;

        if !reply.is_ok() {
            return Err(RelayError::Upstream {
                status: reply.status,
                body: reply.body,
            });
        }

        let parsed: Value =
            serde_json::from_str(&reply.body).map_err(|_| RelayError::InvalidUpstreamBody)?;
        if parsed.is_null() {
            return Err(RelayError::InvalidUpstreamBody);
        }

        match VendorResponse::classify(parsed) {
            VendorResponse::Success(text) => Ok(text),
            VendorResponse::VendorError(details) => Err(RelayError::Vendor(details)),
            VendorResponse::Unrecognized(body) => Err(RelayError::UnexpectedFormat(body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockGenerativeClient;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    const VALID_BODY: &[u8] = br#"{"message":"Hi there","apiKey":"key-123"}"#;

    fn relay_with(mock: MockGenerativeClient) -> (Relay, Arc<MockGenerativeClient>) {
        let mock = Arc::new(mock);
        (Relay::new(Box::new(mock.clone())), mock)
    }

    fn body_json(response: &RelayResponse) -> Value {
        serde_json::from_slice(&response.to_json_bytes().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_options_is_empty_200_without_outbound_call() {
        let (relay, mock) = relay_with(MockGenerativeClient::new());

        let response = relay.handle(&Method::OPTIONS, b"garbage").await;

        assert_eq!(response, RelayResponse::preflight());
        assert!(response.to_json_bytes().unwrap().is_empty());
        assert_eq!(mock.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_other_methods_are_405() {
        let (relay, mock) = relay_with(MockGenerativeClient::new());

        for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD] {
            let response = relay.handle(&method, VALID_BODY).await;
            assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(
                body_json(&response),
                json!({ "error": "Only POST method allowed" })
            );
        }
        assert_eq!(mock.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_bad_input_is_400() {
        let (relay, mock) = relay_with(MockGenerativeClient::new());

        let bodies: [&[u8]; 5] = [
            b"{not json",
            br#"{"message":"hi"}"#,
            br#"{"apiKey":"k"}"#,
            br#""just a string""#,
            br#"{"message":"hi","apiKey":null}"#,
        ];
        for body in bodies {
            let response = relay.handle(&Method::POST, body).await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(&response),
                json!({ "error": "Missing message or apiKey" })
            );
        }
        assert_eq!(mock.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_passes_text_through() {
        let (relay, mock) = relay_with(MockGenerativeClient::new().with_text_reply("Hello!"));

        let response = relay.handle(&Method::POST, VALID_BODY).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            body_json(&response),
            json!({ "success": true, "response": "Hello!" })
        );
        assert_eq!(
            mock.last_call(),
            Some(("key-123".to_string(), json!("Hi there")))
        );
    }

    #[tokio::test]
    async fn test_numeric_message_is_forwarded_as_given() {
        let (relay, mock) = relay_with(MockGenerativeClient::new().with_text_reply("ok"));

        let response = relay
            .handle(&Method::POST, br#"{"message":123,"apiKey":7}"#)
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(mock.last_call(), Some(("7".to_string(), json!(123))));
    }

    #[tokio::test]
    async fn test_upstream_status_is_propagated() {
        let (relay, _) = relay_with(MockGenerativeClient::new().with_reply(503, "B"));

        let response = relay.handle(&Method::POST, VALID_BODY).await;

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(&response),
            json!({ "error": "API error", "status": 503, "response": "B" })
        );
    }

    #[tokio::test]
    async fn test_vendor_error_is_400_with_details() {
        let (relay, _) = relay_with(
            MockGenerativeClient::new().with_reply(200, r#"{"error":{"message":"invalid key"}}"#),
        );

        let response = relay.handle(&Method::POST, VALID_BODY).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(&response),
            json!({ "error": "Gemini API error", "details": { "message": "invalid key" } })
        );
    }

    #[tokio::test]
    async fn test_unrecognized_body_is_500() {
        let (relay, _) = relay_with(MockGenerativeClient::new().with_reply(200, "{}"));

        let response = relay.handle(&Method::POST, VALID_BODY).await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(&response),
            json!({ "error": "Unexpected response format", "response": {} })
        );
    }

    #[tokio::test]
    async fn test_invalid_vendor_json_is_500() {
        for raw in ["<html>oops</html>", "", "null"] {
            let (relay, _) = relay_with(MockGenerativeClient::new().with_reply(200, raw));

            let response = relay.handle(&Method::POST, VALID_BODY).await;

            assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                body_json(&response),
                json!({ "error": "Invalid JSON response from Gemini" })
            );
        }
    }

    #[tokio::test]
    async fn test_network_failure_is_500() {
        let (relay, _) = relay_with(
            MockGenerativeClient::new().with_network_failure("operation timed out"),
        );

        let response = relay.handle(&Method::POST, VALID_BODY).await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(&response),
            json!({ "error": "Network error: operation timed out" })
        );
    }

    #[test]
    fn test_upstream_status_out_of_range_falls_back() {
        let err = RelayError::Upstream {
            status: 42,
            body: String::new(),
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
