//! Actor Transport Abstraction
//!
//! The channel only needs two things from whatever moves envelopes between
//! contexts: a way to post an envelope (with the buffers it wants moved) and a
//! subscription delivering envelopes posted by the other side. Delivery must be
//! reliable and order preserving per direction; everything else is opaque.
//!
//! [`MessagePort`] is the in-process implementation: two connected ports, each
//! broadcasting what it receives to every local subscriber. Several actors
//! with different owner identities may share one port and rely on
//! `targetContextId` filtering to pick out their own traffic.

use crate::envelope::Envelope;
use crate::error::{ActorError, Result};
use codec::Transferable;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Envelope plus the buffers handed over with it
#[derive(Debug, Clone)]
pub struct TransportMessage {
    pub envelope: Envelope,
    pub transferables: Vec<Transferable>,
}

impl TransportMessage {
    pub fn new(envelope: Envelope, transferables: Vec<Transferable>) -> Self {
        Self {
            envelope,
            transferables,
        }
    }
}

impl From<Envelope> for TransportMessage {
    fn from(envelope: Envelope) -> Self {
        Self::new(envelope, Vec::new())
    }
}

/// Stream of inbound messages for one subscriber
pub type InboundStream = mpsc::UnboundedReceiver<TransportMessage>;

/// Transport contract consumed by the actor
pub trait Transport: Send + Sync + 'static {
    /// Hand a message to the remote context
    fn post_message(&self, message: TransportMessage) -> Result<()>;

    /// Subscribe to messages posted by the remote context
    fn subscribe(&self) -> InboundStream;
}

#[derive(Debug, Default)]
struct PortEnd {
    listeners: Mutex<Vec<mpsc::UnboundedSender<TransportMessage>>>,
    closed: AtomicBool,
}

impl PortEnd {
    fn deliver(&self, message: TransportMessage) -> usize {
        let mut listeners = self.listeners.lock();
        // Prune subscribers whose receiver is gone
        listeners.retain(|tx| tx.send(message.clone()).is_ok());
        listeners.len()
    }
}

/// One end of an in-process message channel
#[derive(Debug, Clone)]
pub struct MessagePort {
    name: String,
    local: Arc<PortEnd>,
    remote: Arc<PortEnd>,
}

impl MessagePort {
    /// Create two connected ports
    pub fn pair() -> (MessagePort, MessagePort) {
        Self::named_pair("port-a", "port-b")
    }

    /// Create two connected ports with names for logging
    pub fn named_pair(a: impl Into<String>, b: impl Into<String>) -> (MessagePort, MessagePort) {
        let end_a = Arc::new(PortEnd::default());
        let end_b = Arc::new(PortEnd::default());
        (
            MessagePort {
                name: a.into(),
                local: Arc::clone(&end_a),
                remote: Arc::clone(&end_b),
            },
            MessagePort {
                name: b.into(),
                local: end_b,
                remote: end_a,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close this end; later posts from either side fail
    pub fn close(&self) {
        self.local.closed.store(true, Ordering::Release);
        self.local.listeners.lock().clear();
        debug!(port = %self.name, "Message port closed");
    }

    pub fn is_closed(&self) -> bool {
        self.local.closed.load(Ordering::Acquire) || self.remote.closed.load(Ordering::Acquire)
    }

    /// Number of live subscribers on this end
    pub fn subscriber_count(&self) -> usize {
        let mut listeners = self.local.listeners.lock();
        listeners.retain(|tx| !tx.is_closed());
        listeners.len()
    }
}

impl Transport for MessagePort {
    fn post_message(&self, message: TransportMessage) -> Result<()> {
        if self.is_closed() {
            return Err(ActorError::transport(format!("Message port {} closed", self.name)));
        }

        let id = message.envelope.id;
        let delivered = self.remote.deliver(message);
        trace!(port = %self.name, id, delivered, "Posted envelope");
        Ok(())
    }

    fn subscribe(&self) -> InboundStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.local.listeners.lock().push(tx);
        rx
    }
}
