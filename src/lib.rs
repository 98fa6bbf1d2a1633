//! Relay for Gemini chat requests
//!
//! Accepts a message and caller-supplied API key over HTTP, forwards them to
//! Gemini's `generateContent` endpoint, and answers with a simplified JSON body.

pub mod ai;
pub mod error;
pub mod models;
pub mod relay;
pub mod server;

pub use error::{Error, Result};
