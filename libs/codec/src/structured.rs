//! Structured-clone codec
//!
//! Passes values through unchanged. Suitable for in-process transports where
//! both contexts share an address space.

use crate::{Codec, CodecError, Encoded, Result, Value, WireValue};

/// Pass-through codec; never produces transferables
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredCodec;

impl StructuredCodec {
    pub const NAME: &'static str = "structured";
}

impl Codec for StructuredCodec {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, value: &Value) -> Result<Encoded> {
        Ok(Encoded::plain(WireValue::Structured(value.clone())))
    }

    fn decode(&self, wire: &WireValue) -> Result<Value> {
        match wire {
            WireValue::Structured(value) => Ok(value.clone()),
            other => Err(CodecError::unsupported_wire(Self::NAME, other.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde_json::json;

    #[test]
    fn test_structured_passthrough() {
        let codec = StructuredCodec;
        let value = json!({"tile": [1, 2, 3], "source": "roads"});

        let encoded = codec.encode(&value).unwrap();
        assert!(encoded.transferables.is_empty());
        assert_eq!(codec.decode(&encoded.wire).unwrap(), value);
    }

    #[test]
    fn test_structured_rejects_bytes() {
        let codec = StructuredCodec;
        let err = codec
            .decode(&WireValue::Bytes(Bytes::from_static(b"{}")))
            .unwrap_err();

        match err {
            CodecError::UnsupportedWire { codec, found } => {
                assert_eq!(codec, "structured");
                assert_eq!(found, "bytes");
            }
            _ => panic!("Expected UnsupportedWire error"),
        }
    }
}
