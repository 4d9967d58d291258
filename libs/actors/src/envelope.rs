//! Actor Envelope
//!
//! The unit of transport between two actors. Carries a correlation id, a type
//! selector, routing identities and an encoded payload. Two type strings are
//! reserved for control traffic; everything else names a handler.

use crate::context::ContextId;
use crate::error::{ActorError, Result};
use codec::WireValue;
use serde::{Deserialize, Serialize};

/// Cancellation notice for an earlier request
pub const CANCEL_TYPE: &str = "<cancel>";

/// Completion of an earlier request
pub const RESPONSE_TYPE: &str = "<response>";

/// Actor message envelope for routing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Correlation id; zero means "missing" and the envelope is dropped
    #[serde(default)]
    pub id: u64,

    /// Reserved control type or handler selector
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Whether the sender expects a response
    #[serde(default)]
    pub has_callback: bool,

    /// Only the actor owned by this identity processes the envelope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_context_id: Option<ContextId>,

    /// Owner identity of the sending actor
    #[serde(default)]
    pub source_context_id: ContextId,

    /// Encoded payload
    #[serde(default)]
    pub payload: WireValue,

    /// Encoded error, only on failed responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireValue>,

    /// Queue even on actors that dispatch immediately
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub must_queue: bool,
}

impl Envelope {
    /// Build a handler request
    pub fn request(
        id: u64,
        kind: impl Into<String>,
        payload: WireValue,
        has_callback: bool,
        target_context_id: Option<ContextId>,
        source_context_id: ContextId,
    ) -> Self {
        Self {
            id,
            kind: kind.into(),
            has_callback,
            target_context_id,
            source_context_id,
            payload,
            error: None,
            must_queue: false,
        }
    }

    /// Build a cancellation notice for `id`
    pub fn cancel(id: u64, target_context_id: Option<ContextId>, source_context_id: ContextId) -> Self {
        Self::request(id, CANCEL_TYPE, WireValue::default(), false, target_context_id, source_context_id)
    }

    /// Build the response to request `id`
    pub fn response(
        id: u64,
        target_context_id: ContextId,
        source_context_id: ContextId,
        payload: WireValue,
        error: Option<WireValue>,
    ) -> Self {
        let mut envelope = Self::request(
            id,
            RESPONSE_TYPE,
            payload,
            false,
            Some(target_context_id),
            source_context_id,
        );
        envelope.error = error;
        envelope
    }

    /// Mark the envelope as requiring the queue
    pub fn queued(mut self) -> Self {
        self.must_queue = true;
        self
    }

    pub fn has_id(&self) -> bool {
        self.id != 0
    }

    pub fn is_cancel(&self) -> bool {
        self.kind == CANCEL_TYPE
    }

    pub fn is_response(&self) -> bool {
        self.kind == RESPONSE_TYPE
    }

    /// True unless the envelope targets a different owner
    pub fn is_addressed_to(&self, owner: &ContextId) -> bool {
        self.target_context_id.as_ref().map_or(true, |target| target == owner)
    }

    /// Serialize for byte transports
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            ActorError::transport_with_source("Envelope serialization failed", e)
        })
    }

    /// Parse from byte transports
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            ActorError::transport_with_source("Malformed envelope", e)
        })
    }
}
