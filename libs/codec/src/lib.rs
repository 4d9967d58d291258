//! # Actor Payload Codec
//!
//! ## Purpose
//!
//! The "Rules" layer between application payloads and the transport. The actor
//! channel treats every payload and error as opaque: it hands a [`Value`] to a
//! [`Codec`], ships the resulting [`WireValue`] inside an envelope, and passes
//! any [`Transferable`] handles alongside it so transports that support zero
//! copy hand-off can move buffers instead of copying them.
//!
//! ## Architecture Role
//!
//! ```text
//! handlers → [codec] → actors → transport
//!   Value    WireValue   Envelope   TransportMessage
//!            Transferable ──────────────┘
//! ```
//!
//! ## What This Crate Contains
//! - The [`Codec`] trait and the [`Encoded`] output of an encode step
//! - [`StructuredCodec`]: wire value is the value itself (structured clone)
//! - [`JsonBytesCodec`]: wire value is a JSON document in a shared buffer
//!
//! ## What This Crate Does NOT Contain
//! - Envelope routing or correlation ids (belongs in the actors crate)
//! - Transport connections

pub mod error;
pub mod json_bytes;
pub mod structured;

pub use error::{CodecError, Result};
pub use json_bytes::JsonBytesCodec;
pub use structured::StructuredCodec;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Decoded application value
pub type Value = serde_json::Value;

/// Encoded value as carried inside an envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum WireValue {
    /// Value passed through as structured data
    Structured(Value),
    /// Value serialized into a byte buffer
    Bytes(Bytes),
}

impl WireValue {
    /// Short name of the variant, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            WireValue::Structured(_) => "structured",
            WireValue::Bytes(_) => "bytes",
        }
    }

    /// Approximate size in bytes for logging
    pub fn byte_size(&self) -> usize {
        match self {
            WireValue::Structured(value) => value.to_string().len(),
            WireValue::Bytes(buffer) => buffer.len(),
        }
    }
}

impl Default for WireValue {
    fn default() -> Self {
        WireValue::Structured(Value::Null)
    }
}

/// Handle to a buffer that may be moved to the remote context without copying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transferable {
    buffer: Bytes,
}

impl Transferable {
    pub fn new(buffer: Bytes) -> Self {
        Self { buffer }
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Output of a single encode step
#[derive(Debug, Clone, Default)]
pub struct Encoded {
    pub wire: WireValue,
    pub transferables: Vec<Transferable>,
}

impl Encoded {
    /// Encoded value with nothing to transfer
    pub fn plain(wire: WireValue) -> Self {
        Self {
            wire,
            transferables: Vec::new(),
        }
    }
}

/// Payload codec contract
///
/// Implementations must round-trip arbitrary application values, including
/// serialized error values.
pub trait Codec: Send + Sync + 'static {
    /// Codec name for diagnostics
    fn name(&self) -> &'static str;

    /// Turn a value into a wire value plus the buffers it wants transferred
    fn encode(&self, value: &Value) -> Result<Encoded>;

    /// Turn a wire value back into a value
    fn decode(&self, wire: &WireValue) -> Result<Value>;
}
