//! JSON byte-buffer codec
//!
//! Serializes values into a JSON document held in a reference-counted buffer.
//! The buffer is also reported as a transferable, so transports that move
//! buffers between contexts can hand it over without a copy.

use crate::{Codec, CodecError, Encoded, Result, Transferable, Value, WireValue};
use bytes::Bytes;
use tracing::trace;

/// JSON codec producing `WireValue::Bytes`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBytesCodec {
    /// Skip transferable reporting for small buffers
    min_transfer_bytes: usize,
}

impl JsonBytesCodec {
    pub const NAME: &'static str = "json-bytes";

    pub fn new() -> Self {
        Self::default()
    }

    /// Only report buffers of at least `bytes` length as transferable
    pub fn with_min_transfer_bytes(mut self, bytes: usize) -> Self {
        self.min_transfer_bytes = bytes;
        self
    }
}

impl Codec for JsonBytesCodec {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, value: &Value) -> Result<Encoded> {
        let buffer = serde_json::to_vec(value).map_err(|e| {
            CodecError::encode_with_source(Self::NAME, "JSON serialization failed", e)
        })?;
        let buffer = Bytes::from(buffer);

        let transferables = if buffer.len() >= self.min_transfer_bytes {
            vec![Transferable::new(buffer.clone())]
        } else {
            Vec::new()
        };

        trace!(
            bytes = buffer.len(),
            transferables = transferables.len(),
            "Encoded JSON payload"
        );

        Ok(Encoded {
            wire: WireValue::Bytes(buffer),
            transferables,
        })
    }

    fn decode(&self, wire: &WireValue) -> Result<Value> {
        match wire {
            WireValue::Bytes(buffer) => serde_json::from_slice(buffer).map_err(|e| {
                CodecError::decode_with_source(Self::NAME, "JSON deserialization failed", e)
            }),
            other => Err(CodecError::unsupported_wire(Self::NAME, other.kind())),
        }
    }
}
