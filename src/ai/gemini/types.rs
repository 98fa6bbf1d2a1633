//! Gemini `generateContent` payload types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body sent to `generateContent`.
///
/// Generation and safety settings are fixed; only the message varies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

impl GenerateContentRequest {
    pub fn for_message(message: &Value) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: message.clone(),
                }],
            }],
            generation_config: GenerationConfig::default(),
            safety_settings: SafetySetting::defaults(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// Text part. `text` carries the caller's message value untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    pub text: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockMediumAndAbove,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// Blocks medium-and-above severity in all four categories.
    pub fn defaults() -> Vec<Self> {
        [
            HarmCategory::Harassment,
            HarmCategory::HateSpeech,
            HarmCategory::SexuallyExplicit,
            HarmCategory::DangerousContent,
        ]
        .into_iter()
        .map(|category| Self {
            category,
            threshold: HarmBlockThreshold::BlockMediumAndAbove,
        })
        .collect()
    }
}

const TEXT_POINTER: &str = "/candidates/0/content/parts/0/text";

/// Decoded vendor body, checked in variant order.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorResponse {
    /// Text of the first part of the first candidate.
    Success(String),
    /// Contents of a non-null top-level `error` field.
    VendorError(Value),
    /// Neither shape matched; carries the whole body.
    Unrecognized(Value),
}

impl VendorResponse {
    pub fn classify(body: Value) -> Self {
        if let Some(Value::String(text)) = body.pointer(TEXT_POINTER) {
            return Self::Success(text.clone());
        }

        match body.get("error") {
            Some(error) if !error.is_null() => Self::VendorError(error.clone()),
            _ => Self::Unrecognized(body),
        }
    }
}
