//! Catalog JSON envelopes
//!
//! Every catalog service replies with `{"d": "<json string>"}`: the payload is
//! itself JSON-encoded and has to be decoded a second time.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{KtuvitError, Result};

#[derive(Debug, Deserialize)]
struct Envelope {
    d: Option<String>,
}

/// Decode the outer envelope, then decode its `d` string as `T`
pub fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| KtuvitError::Protocol(format!("envelope parse error: {}", e)))?;

    let payload = envelope
        .d
        .ok_or_else(|| KtuvitError::Protocol("envelope has no data".to_string()))?;

    serde_json::from_str(&payload)
        .map_err(|e| KtuvitError::Protocol(format!("payload parse error: {}", e)))
}

/// Request bodies are wrapped as `{"request": {...}}`
#[derive(Debug, Serialize)]
pub struct RequestBody<T: Serialize> {
    pub request: T,
}

impl<T: Serialize> RequestBody<T> {
    pub fn new(request: T) -> Self {
        Self { request }
    }
}
