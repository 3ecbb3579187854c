//! Ops API response envelope
//!
//! Every admin ops read answers with `{"code", "message", "data"}`; only
//! `code == 0` with an object `data` counts as a usable response.

use serde_json::{Map, Value};

use crate::error::GuardError;

/// Decoded `{code, message, data}` wrapper
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub code: Value,
    pub message: Value,
    pub data: Value,
}

impl Envelope {
    /// Decode raw response bytes into an envelope
    pub fn decode(body: &[u8]) -> Result<Self, GuardError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| GuardError::InvalidEnvelope(format!("malformed JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Split a JSON document into envelope parts; the top level must be an object
    pub fn from_value(value: Value) -> Result<Self, GuardError> {
        let Value::Object(mut map) = value else {
            return Err(GuardError::InvalidEnvelope(
                "response is not a JSON object".to_string(),
            ));
        };

        Ok(Self {
            code: map.remove("code").unwrap_or(Value::Null),
            message: map.remove("message").unwrap_or(Value::Null),
            data: map.remove("data").unwrap_or(Value::Null),
        })
    }

    pub fn is_success(&self) -> bool {
        self.code.as_f64() == Some(0.0)
    }

    /// Validate the envelope and hand back its `data` object
    pub fn into_payload(self) -> Result<Map<String, Value>, GuardError> {
        if !self.is_success() {
            return Err(GuardError::Api {
                code: render(&self.code),
                message: render(&self.message),
            });
        }

        match self.data {
            Value::Object(map) => Ok(map),
            other => Err(GuardError::InvalidPayload(format!(
                "expected object, got {}",
                kind_of(&other)
            ))),
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
