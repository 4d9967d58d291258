//! Actor Error Types
//!
//! Two families of failure live here:
//! - [`ActorError`]: local failures of the channel itself (encoding an outbound
//!   payload, posting to a closed transport, using a detached actor).
//! - [`RemoteError`]: the opaque application error carried back to a caller in
//!   a response envelope. The core never inspects it beyond the
//!   constructors it uses for its own reports.

use codec::CodecError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Local actor error type
#[derive(Error, Debug)]
pub enum ActorError {
    /// Payload or error value could not be encoded/decoded
    #[error("Codec error: {message}")]
    Codec {
        message: String,
        source: Option<CodecError>,
    },

    /// Transport refused the outbound message
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Actor was detached from its transport
    #[error("Actor {owner} is detached")]
    Detached { owner: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// No async runtime available to drive the actor
    #[error("Runtime error: {message}")]
    Runtime { message: String },
}

/// Result type alias for actor operations
pub type Result<T> = std::result::Result<T, ActorError>;

impl ActorError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error with source
    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a detached error
    pub fn detached(owner: impl std::fmt::Display) -> Self {
        Self::Detached {
            owner: owner.to_string(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(|s| s.to_string()),
        }
    }

    /// Create a runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Get error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            ActorError::Codec { .. } => "codec",
            ActorError::Transport { .. } => "transport",
            ActorError::Detached { .. } => "detached",
            ActorError::Configuration { .. } => "configuration",
            ActorError::Runtime { .. } => "runtime",
        }
    }
}

impl From<CodecError> for ActorError {
    fn from(error: CodecError) -> Self {
        ActorError::Codec {
            message: error.to_string(),
            source: Some(error),
        }
    }
}

/// Application error delivered through the response path
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl RemoteError {
    pub const HANDLER_NOT_FOUND: &'static str = "handler_not_found";
    pub const SCOPE_NOT_FOUND: &'static str = "scope_not_found";
    pub const CODEC: &'static str = "codec";
    pub const CANCELED: &'static str = "canceled";
    pub const HANDLER_PANICKED: &'static str = "handler_panicked";

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            details: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// No handler is registered for `kind`
    pub fn handler_not_found(kind: &str) -> Self {
        Self::new(format!("Could not find function {}", kind)).with_code(Self::HANDLER_NOT_FOUND)
    }

    /// The scope resolver returned nothing for `scope`
    pub fn scope_not_found(kind: &str, scope: &str) -> Self {
        Self::new(format!("Could not find scope {} for {}", scope, kind))
            .with_code(Self::SCOPE_NOT_FOUND)
    }

    /// A payload or error value failed to encode/decode
    pub fn codec(error: &CodecError) -> Self {
        Self::new(error.to_string()).with_code(Self::CODEC)
    }

    /// The handler for `kind` panicked before completing
    pub fn handler_panicked(kind: &str) -> Self {
        Self::new(format!("Handler for {} panicked", kind)).with_code(Self::HANDLER_PANICKED)
    }

    /// The request was canceled before a response arrived
    pub fn canceled() -> Self {
        Self::new("Request canceled").with_code(Self::CANCELED)
    }

    pub fn is_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }

    /// Serialize into a codec value
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::Value::String(self.message.clone()))
    }

    /// Rebuild from a decoded value; any non-object value becomes the message
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(message) => Self::new(message),
            serde_json::Value::Object(_) => serde_json::from_value(value.clone())
                .unwrap_or_else(|_| Self::new("Remote error").with_details(value)),
            other => Self::new(other.to_string()),
        }
    }
}

impl From<&str> for RemoteError {
    fn from(message: &str) -> Self {
        RemoteError::new(message)
    }
}

impl From<String> for RemoteError {
    fn from(message: String) -> Self {
        RemoteError::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_categorization() {
        assert_eq!(ActorError::transport("closed").category(), "transport");
        assert_eq!(ActorError::detached("worker-1").category(), "detached");
        assert_eq!(
            ActorError::configuration("empty name", Some("name")).category(),
            "configuration"
        );
        let codec_err: ActorError = CodecError::encode("json-bytes", "bad").into();
        assert_eq!(codec_err.category(), "codec");
    }

    #[test]
    fn test_handler_not_found_names_type() {
        let err = RemoteError::handler_not_found("loadTile");
        assert!(err.message.contains("loadTile"));
        assert!(err.is_code(RemoteError::HANDLER_NOT_FOUND));
    }

    #[test]
    fn test_remote_error_value_conversion() {
        let err = RemoteError::new("boom").with_code("E42").with_details(json!({"tile": 7}));
        let value = err.to_value();
        assert_eq!(value["message"], "boom");
        assert_eq!(RemoteError::from_value(value), err);
    }

    #[test]
    fn test_remote_error_from_loose_values() {
        assert_eq!(RemoteError::from_value(json!("plain")).message, "plain");
        assert_eq!(RemoteError::from_value(json!(404)).message, "404");

        let odd = RemoteError::from_value(json!({"reason": "x"}));
        assert_eq!(odd.message, "Remote error");
        assert_eq!(odd.details, Some(json!({"reason": "x"})));
    }
}
