//! Completion and cancellation handles
//!
//! - [`Completion`] is the `done` function handed to a handler. Consuming it
//!   either sends a `"<response>"` envelope back to the requester or, for fire
//!   and forget requests, only marks the request finished.
//! - [`Cancelable`] is returned by every send. Cancelling drops the local
//!   callback and posts a `"<cancel>"` notice; repeated calls do nothing.
//! - [`PendingReply`] awaits a response as a future and cancels the request
//!   when dropped unresolved.

use crate::actor::Shared;
use crate::context::ContextId;
use crate::error::RemoteError;
use codec::Value;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Result delivered to a requester
pub type Reply = std::result::Result<Value, RemoteError>;

/// Completion function for one inbound request
pub struct Completion {
    shared: Arc<Shared>,
    id: u64,
    kind: String,
    reply_to: Option<ContextId>,
    fired: Arc<AtomicBool>,
}

impl Completion {
    pub(crate) fn new(
        shared: Arc<Shared>,
        id: u64,
        kind: String,
        reply_to: Option<ContextId>,
        fired: Arc<AtomicBool>,
    ) -> Self {
        Self {
            shared,
            id,
            kind,
            reply_to,
            fired,
        }
    }

    /// Id of the request being completed
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Type of the request being completed
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Whether the requester asked for a response
    pub fn expects_response(&self) -> bool {
        self.reply_to.is_some()
    }

    pub fn resolve(self, value: Value) {
        self.complete(Ok(value))
    }

    pub fn reject(self, error: impl Into<RemoteError>) {
        self.complete(Err(error.into()))
    }

    /// Finish the request with a value or an error
    pub fn complete(self, result: Reply) {
        self.fire(result);
    }

    fn fire(&self, result: Reply) {
        self.shared.finish(self.id, &self.fired);
        if let Some(target) = &self.reply_to {
            self.shared.respond(self.id, target, result);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.fired.load(Ordering::Acquire) {
            return;
        }
        if std::thread::panicking() {
            // Unwinding out of the handler that owned us
            warn!(id = self.id, kind = %self.kind, "Rejecting request after handler panic");
            self.fire(Err(RemoteError::handler_panicked(&self.kind)));
        } else {
            debug!(id = self.id, kind = %self.kind, "Completion dropped without a result");
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("reply_to", &self.reply_to)
            .finish()
    }
}

struct CancelTarget {
    shared: Arc<Shared>,
    target: Option<ContextId>,
}

/// Cancel handle for one outbound request
pub struct Cancelable {
    id: u64,
    inner: Mutex<Option<CancelTarget>>,
}

impl Cancelable {
    pub(crate) fn new(shared: Arc<Shared>, id: u64, target: Option<ContextId>) -> Self {
        Self {
            id,
            inner: Mutex::new(Some(CancelTarget { shared, target })),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Drop the local callback and notify the remote side; idempotent
    pub fn cancel(&self) {
        let Some(CancelTarget { shared, target }) = self.inner.lock().take() else {
            return;
        };
        shared.cancel_request(self.id, target);
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.lock().is_none()
    }
}

impl fmt::Debug for Cancelable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cancelable")
            .field("id", &self.id)
            .field("canceled", &self.is_canceled())
            .finish()
    }
}

/// Future resolving to the response of a request
///
/// Dropping it before it resolves cancels the request.
#[derive(Debug)]
pub struct PendingReply {
    rx: oneshot::Receiver<Reply>,
    cancel: Cancelable,
    settled: bool,
}

impl PendingReply {
    pub(crate) fn new(rx: oneshot::Receiver<Reply>, cancel: Cancelable) -> Self {
        Self {
            rx,
            cancel,
            settled: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.cancel.id()
    }

    /// Cancel now; awaiting afterwards yields a canceled error
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Future for PendingReply {
    type Output = Reply;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(reply)) => {
                self.settled = true;
                Poll::Ready(reply)
            }
            // Sender dropped: canceled locally or actor detached
            Poll::Ready(Err(_)) => {
                self.settled = true;
                Poll::Ready(Err(RemoteError::canceled()))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        if !self.settled {
            self.cancel.cancel();
        }
    }
}
