//! Codec errors
//!
//! Failures raised while turning application values into wire values and back.
//! The actor layer never inspects these beyond reporting them; they are folded
//! into the response path as opaque remote errors.

use thiserror::Error;

/// Encoding/decoding errors with the codec that raised them
#[derive(Debug, Error)]
pub enum CodecError {
    /// Value could not be turned into a wire value
    #[error("Encode failed ({codec}): {message}")]
    Encode {
        codec: &'static str,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Wire value could not be turned back into a value
    #[error("Decode failed ({codec}): {message}")]
    Decode {
        codec: &'static str,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Wire value was produced by a different codec
    #[error("Codec {codec} cannot decode {found} wire values")]
    UnsupportedWire {
        codec: &'static str,
        found: &'static str,
    },
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    /// Create an encode error
    pub fn encode(codec: &'static str, message: impl Into<String>) -> Self {
        Self::Encode {
            codec,
            message: message.into(),
            source: None,
        }
    }

    /// Create an encode error with source
    pub fn encode_with_source(
        codec: &'static str,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Encode {
            codec,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a decode error
    pub fn decode(codec: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            codec,
            message: message.into(),
            source: None,
        }
    }

    /// Create a decode error with source
    pub fn decode_with_source(
        codec: &'static str,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Decode {
            codec,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an unsupported wire error
    pub fn unsupported_wire(codec: &'static str, found: &'static str) -> Self {
        Self::UnsupportedWire { codec, found }
    }

    /// Get error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            CodecError::Encode { .. } => "encode",
            CodecError::Decode { .. } => "decode",
            CodecError::UnsupportedWire { .. } => "unsupported_wire",
        }
    }
}
