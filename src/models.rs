//! Data models and structures
//!
//! Defines the client-facing request and response shapes plus the listener
//! configuration. Gemini wire types live in [`crate::ai::gemini::types`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Body of an inbound relay request.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingRequest {
    /// Forwarded to the vendor exactly as the caller sent it.
    pub message: Value,
    pub api_key: String,
}

impl IncomingRequest {
    /// Parses a raw request body.
    ///
    /// Returns `None` unless the body is a JSON object with a non-null
    /// `message` and a scalar `apiKey`.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(body).ok()?;
        let object = value.as_object()?;

        let message = object.get("message").filter(|m| !m.is_null())?.clone();
        let api_key = scalar_text(object.get("apiKey")?)?;

        Some(Self { message, api_key })
    }
}

/// String form of a JSON scalar as it reads when spliced into a URL.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some(String::new()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Simplified body returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ClientResponse {
    Success { success: bool, response: String },
    Failure(ErrorBody),
}

impl ClientResponse {
    pub fn success(text: String) -> Self {
        Self::Success {
            success: true,
            response: text,
        }
    }
}

/// Error body. Only `error` is always present; the rest depend on the failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status: None,
            details: None,
            response: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }
}

// Configuration
const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let host = match lookup("RELAY_HOST") {
            Some(raw) => raw.parse().map_err(|_| {
                crate::Error::Config(format!("RELAY_HOST is not an IP address: {}", raw))
            })?,
            None => DEFAULT_HOST,
        };

        let port = match lookup("RELAY_PORT") {
            Some(raw) => raw.parse().map_err(|_| {
                crate::Error::Config(format!("RELAY_PORT is not a valid port: {}", raw))
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self { host, port })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn binds_to_all_interfaces(&self) -> bool {
        self.host.is_unspecified()
    }
}
