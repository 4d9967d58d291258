//! Actor
//!
//! One endpoint of a bidirectional request/response channel. An actor keeps
//! its bookkeeping behind a single lock:
//!
//! - pending callbacks for requests it sent, keyed by envelope id;
//! - queued inbound tasks keyed by id, plus their arrival order;
//! - cancel hooks returned by handlers still working on a request.
//!
//! Two tokio tasks drive it. The listener reads the transport subscription and
//! calls [`Actor::receive`]; the drain task dispatches queued tasks one at a
//! time, yielding between dispatches so that cancel notices arriving in the
//! meantime are applied before the next task runs.
//!
//! Handler code and callbacks never run while the state lock is held.

use crate::completion::{Cancelable, Completion, PendingReply, Reply};
use crate::context::ContextId;
use crate::envelope::Envelope;
use crate::error::{ActorError, RemoteError, Result};
use crate::ids::next_envelope_id;
use crate::metrics::{ActorMetrics, ActorStats};
use crate::peer::{CancelHook, Peer, Resolution};
use crate::settings::ActorConfig;
use crate::transport::{Transport, TransportMessage};
use codec::{Codec, StructuredCodec, Transferable, Value, WireValue};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Callback invoked with the outcome of a request
pub type Callback = Box<dyn FnOnce(Reply) + Send>;

#[derive(Default)]
struct ActorState {
    callbacks: HashMap<u64, Callback>,
    tasks: HashMap<u64, Envelope>,
    order: VecDeque<u64>,
    cancel_hooks: HashMap<u64, CancelHook>,
    drain_scheduled: bool,
}

/// State shared between the actor handle, its tasks and outstanding handles
pub(crate) struct Shared {
    owner: ContextId,
    name: String,
    queue_all: bool,
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
    peer: Peer,
    state: Mutex<ActorState>,
    wake: Notify,
    detached: AtomicBool,
    metrics: ActorMetrics,
}

impl Shared {
    fn send(
        self: &Arc<Self>,
        kind: &str,
        payload: Value,
        callback: Option<Callback>,
        target: Option<ContextId>,
        must_queue: bool,
    ) -> Result<Cancelable> {
        if self.detached.load(Ordering::Acquire) {
            return Err(ActorError::detached(&self.owner));
        }

        let id = next_envelope_id();
        let has_callback = callback.is_some();
        if let Some(callback) = callback {
            self.state.lock().callbacks.insert(id, callback);
        }

        let outcome = self.codec.encode(&payload).map_err(ActorError::from).and_then(|encoded| {
            trace!(actor = %self.name, id, kind, bytes = encoded.wire.byte_size(), "Encoded request payload");
            let mut envelope =
                Envelope::request(id, kind, encoded.wire, has_callback, target.clone(), self.owner.clone());
            if must_queue {
                envelope = envelope.queued();
            }
            self.post(envelope, encoded.transferables)
        });

        if let Err(e) = outcome {
            let abandoned = self.state.lock().callbacks.remove(&id);
            drop(abandoned);
            warn!(actor = %self.name, id, kind, error = %e, "Send failed");
            return Err(e);
        }

        trace!(actor = %self.name, id, kind, has_callback, "Request sent");
        Ok(Cancelable::new(Arc::clone(self), id, target))
    }

    fn post(&self, envelope: Envelope, transferables: Vec<Transferable>) -> Result<()> {
        self.transport
            .post_message(TransportMessage::new(envelope, transferables))?;
        self.metrics.record_sent();
        Ok(())
    }

    /// Forget the callback for `id` and tell the remote side to stop
    pub(crate) fn cancel_request(&self, id: u64, target: Option<ContextId>) {
        let callback = self.state.lock().callbacks.remove(&id);
        let had_callback = callback.is_some();
        drop(callback);

        if self.detached.load(Ordering::Acquire) {
            trace!(actor = %self.name, id, "Not sending cancel notice from detached actor");
            return;
        }

        let notice = Envelope::cancel(id, target, self.owner.clone());
        match self.post(notice, Vec::new()) {
            Ok(()) => {
                self.metrics.record_cancel_sent();
                debug!(actor = %self.name, id, had_callback, "Request canceled");
            }
            Err(e) => warn!(actor = %self.name, id, error = %e, "Failed to send cancel notice"),
        }
    }

    /// Mark request `id` finished and drop its cancel hook
    pub(crate) fn finish(&self, id: u64, fired: &AtomicBool) {
        let hook = {
            let mut state = self.state.lock();
            fired.store(true, Ordering::Release);
            state.cancel_hooks.remove(&id)
        };
        drop(hook);
    }

    /// Encode `result` and post it back to the requester
    pub(crate) fn respond(&self, id: u64, target: &ContextId, result: Reply) {
        let encoded = match &result {
            Ok(value) => self
                .codec
                .encode(value)
                .map(|encoded| (encoded.wire, None, encoded.transferables)),
            Err(error) => self
                .codec
                .encode(&error.to_value())
                .map(|encoded| (WireValue::default(), Some(encoded.wire), encoded.transferables)),
        };

        let (payload, error, transferables) = match encoded {
            Ok(parts) => parts,
            Err(e) => {
                warn!(actor = %self.name, id, error = %e, "Failed to encode response");
                match self.codec.encode(&RemoteError::codec(&e).to_value()) {
                    Ok(fallback) => (WireValue::default(), Some(fallback.wire), fallback.transferables),
                    Err(e) => {
                        warn!(actor = %self.name, id, error = %e, "Dropping unencodable response");
                        return;
                    }
                }
            }
        };

        let response = Envelope::response(id, target.clone(), self.owner.clone(), payload, error);
        match self.post(response, transferables) {
            Ok(()) => trace!(actor = %self.name, id, target = %target, "Response sent"),
            Err(e) => warn!(actor = %self.name, id, error = %e, "Failed to send response"),
        }
    }

    fn receive(self: &Arc<Self>, envelope: Envelope) {
        if self.detached.load(Ordering::Acquire) {
            trace!(actor = %self.name, id = envelope.id, "Ignoring envelope on detached actor");
            return;
        }

        if !envelope.has_id() || !envelope.is_addressed_to(&self.owner) {
            self.metrics.record_dropped();
            trace!(actor = %self.name, id = envelope.id, kind = %envelope.kind, "Dropping unroutable envelope");
            return;
        }
        self.metrics.record_received();

        let id = envelope.id;
        if envelope.is_cancel() {
            self.apply_cancel(id);
            return;
        }

        if !self.queue_all && !envelope.must_queue {
            self.dispatch(id, envelope);
            return;
        }

        let schedule = {
            let mut state = self.state.lock();
            state.tasks.insert(id, envelope);
            state.order.push_back(id);
            !std::mem::replace(&mut state.drain_scheduled, true)
        };
        if schedule {
            self.wake.notify_one();
        }
    }

    fn apply_cancel(&self, id: u64) {
        let (removed, hook) = {
            let mut state = self.state.lock();
            (state.tasks.remove(&id).is_some(), state.cancel_hooks.remove(&id))
        };

        if !removed && hook.is_none() {
            trace!(actor = %self.name, id, "Cancel for unknown request");
            return;
        }

        self.metrics.record_cancel_applied();
        debug!(actor = %self.name, id, removed_queued = removed, fired_hook = hook.is_some(), "Cancel applied");
        if let Some(hook) = hook {
            if catch_unwind(AssertUnwindSafe(|| hook.fire())).is_err() {
                warn!(actor = %self.name, id, "Cancel hook panicked");
            }
        }
    }

    /// Run one queue step; returns whether another step is due
    fn drain_step(self: &Arc<Self>) -> bool {
        let (id, task, more) = {
            let mut state = self.state.lock();
            state.drain_scheduled = false;
            let Some(id) = state.order.pop_front() else {
                return false;
            };
            let task = state.tasks.remove(&id);
            let more = !state.order.is_empty();
            if more {
                state.drain_scheduled = true;
            }
            (id, task, more)
        };

        match task {
            Some(task) => self.dispatch(id, task),
            None => trace!(actor = %self.name, id, "Skipping canceled task"),
        }
        more
    }

    fn dispatch(self: &Arc<Self>, id: u64, task: Envelope) {
        if catch_unwind(AssertUnwindSafe(|| self.process_task(id, task))).is_err() {
            self.metrics.record_panic();
            warn!(actor = %self.name, id, "Handler panicked during dispatch");
        }
    }

    fn process_task(self: &Arc<Self>, id: u64, task: Envelope) {
        if task.is_response() {
            let callback = self.state.lock().callbacks.remove(&id);
            match callback {
                Some(callback) => callback(self.decode_reply(&task)),
                None => {
                    self.metrics.record_stale_response();
                    debug!(actor = %self.name, id, "Dropping stale response");
                }
            }
            return;
        }

        self.metrics.record_dispatch();
        let fired = Arc::new(AtomicBool::new(false));
        let reply_to = task.has_callback.then(|| task.source_context_id.clone());
        let done = Completion::new(Arc::clone(self), id, task.kind.clone(), reply_to, Arc::clone(&fired));

        let payload = match self.codec.decode(&task.payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(actor = %self.name, id, kind = %task.kind, error = %e, "Failed to decode request payload");
                done.reject(RemoteError::codec(&e));
                return;
            }
        };

        trace!(actor = %self.name, id, kind = %task.kind, "Dispatching task");
        let hook = match self.peer.resolve(&task.kind, &task.source_context_id, &payload) {
            Resolution::Direct(handler) => handler(&task.source_context_id, payload, done),
            Resolution::Scoped(method) => method(payload, done),
            Resolution::Missing(error) => {
                debug!(actor = %self.name, id, kind = %task.kind, "No handler for task");
                done.reject(error);
                None
            }
        };

        if let Some(hook) = hook {
            // Completion already fired; the hook has nothing left to stop
            let unused = {
                let mut state = self.state.lock();
                if fired.load(Ordering::Acquire) {
                    Some(hook)
                } else {
                    state.cancel_hooks.insert(id, hook);
                    None
                }
            };
            drop(unused);
        }
    }

    /// Error takes precedence over the payload
    fn decode_reply(&self, response: &Envelope) -> Reply {
        if let Some(error) = &response.error {
            return match self.codec.decode(error) {
                Ok(value) => Err(RemoteError::from_value(value)),
                Err(e) => Err(RemoteError::codec(&e)),
            };
        }
        self.codec.decode(&response.payload).map_err(|e| RemoteError::codec(&e))
    }

    fn detach(&self) -> bool {
        if self.detached.swap(true, Ordering::AcqRel) {
            return false;
        }

        let (tasks, callbacks) = {
            let mut state = self.state.lock();
            state.order.clear();
            state.drain_scheduled = false;
            (
                std::mem::take(&mut state.tasks),
                std::mem::take(&mut state.callbacks),
            )
        };
        debug!(
            actor = %self.name,
            owner = %self.owner,
            abandoned_tasks = tasks.len(),
            abandoned_callbacks = callbacks.len(),
            "Actor detached"
        );
        true
    }
}

async fn drain_loop(shared: Arc<Shared>) {
    loop {
        shared.wake.notified().await;
        while shared.drain_step() {
            tokio::task::yield_now().await;
        }
    }
}

async fn listen(shared: Arc<Shared>, mut inbound: crate::transport::InboundStream) {
    while let Some(message) = inbound.recv().await {
        shared.receive(message.envelope);
    }
    debug!(actor = %shared.name, "Transport subscription closed");
}

/// Builder for [`Actor`]
pub struct ActorBuilder {
    config: ActorConfig,
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
    peer: Peer,
}

impl ActorBuilder {
    pub fn owner(mut self, owner: impl Into<ContextId>) -> Self {
        self.config.owner = owner.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn queue_all(mut self, queue_all: bool) -> Self {
        self.config.queue_all = queue_all;
        self
    }

    /// Replace owner, name and queueing mode at once
    pub fn config(mut self, config: ActorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn codec(mut self, codec: impl Codec) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn peer(mut self, peer: Peer) -> Self {
        self.peer = peer;
        self
    }

    /// Subscribe to the transport and start the actor's tasks
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> Result<Actor> {
        if self.config.name.trim().is_empty() {
            return Err(ActorError::configuration("Actor name must not be empty", Some("name")));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ActorError::runtime(format!("Actor requires a tokio runtime: {}", e)))?;

        let shared = Arc::new(Shared {
            owner: self.config.owner,
            name: self.config.name,
            queue_all: self.config.queue_all,
            transport: self.transport,
            codec: self.codec,
            peer: self.peer,
            state: Mutex::new(ActorState::default()),
            wake: Notify::new(),
            detached: AtomicBool::new(false),
            metrics: ActorMetrics::default(),
        });

        let inbound = shared.transport.subscribe();
        let drainer = runtime.spawn(drain_loop(Arc::clone(&shared)));
        let listener = runtime.spawn(listen(Arc::clone(&shared), inbound));

        debug!(
            actor = %shared.name,
            owner = %shared.owner,
            codec = shared.codec.name(),
            queue_all = shared.queue_all,
            "Actor attached"
        );

        Ok(Actor {
            shared,
            tasks: Mutex::new(vec![listener, drainer]),
        })
    }
}

/// Endpoint of a request/response channel over a [`Transport`]
pub struct Actor {
    shared: Arc<Shared>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Actor {
    /// Start configuring an actor on `transport`
    pub fn builder(transport: impl Transport) -> ActorBuilder {
        Self::builder_shared(Arc::new(transport))
    }

    /// Like [`Actor::builder`] for a transport shared with other actors
    pub fn builder_shared(transport: Arc<dyn Transport>) -> ActorBuilder {
        ActorBuilder {
            config: ActorConfig::default(),
            transport,
            codec: Arc::new(StructuredCodec),
            peer: Peer::default(),
        }
    }

    /// Attach an actor with the default codec and queueing mode
    pub fn new(transport: impl Transport, owner: impl Into<ContextId>, peer: Peer) -> Result<Self> {
        Self::builder(transport).owner(owner).peer(peer).spawn()
    }

    pub fn owner(&self) -> &ContextId {
        &self.shared.owner
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Send a request; `callback` receives the response if supplied
    pub fn send(
        &self,
        kind: &str,
        payload: Value,
        callback: Option<Callback>,
        target: Option<ContextId>,
    ) -> Result<Cancelable> {
        self.shared.send(kind, payload, callback, target, false)
    }

    /// Like [`Actor::send`] but always queued by the receiver
    pub fn send_queued(
        &self,
        kind: &str,
        payload: Value,
        callback: Option<Callback>,
        target: Option<ContextId>,
    ) -> Result<Cancelable> {
        self.shared.send(kind, payload, callback, target, true)
    }

    /// Send a request without asking for a response
    pub fn notify(&self, kind: &str, payload: Value, target: Option<ContextId>) -> Result<Cancelable> {
        self.send(kind, payload, None, target)
    }

    /// Send a request and await its response
    pub fn request(&self, kind: &str, payload: Value, target: Option<ContextId>) -> Result<PendingReply> {
        let (tx, rx) = oneshot::channel();
        let callback: Callback = Box::new(move |reply| {
            let _ = tx.send(reply);
        });
        let cancel = self.send(kind, payload, Some(callback), target)?;
        Ok(PendingReply::new(rx, cancel))
    }

    /// Accept an inbound envelope
    ///
    /// Normally driven by the transport listener; exposed for transports that
    /// deliver envelopes by other means.
    pub fn receive(&self, envelope: Envelope) {
        self.shared.receive(envelope);
    }

    /// Accept an inbound envelope in byte form; malformed frames are ignored
    pub fn receive_bytes(&self, bytes: &[u8]) {
        match Envelope::from_bytes(bytes) {
            Ok(envelope) => self.shared.receive(envelope),
            Err(e) => {
                self.shared.metrics.record_dropped();
                debug!(actor = %self.shared.name, len = bytes.len(), error = %e, "Ignoring malformed envelope");
            }
        }
    }

    /// Stop listening; queued tasks and pending callbacks are abandoned
    pub fn detach(&self) {
        if self.shared.detach() {
            for task in self.tasks.lock().drain(..) {
                task.abort();
            }
        }
    }

    pub fn is_detached(&self) -> bool {
        self.shared.detached.load(Ordering::Acquire)
    }

    /// Requests still waiting for a response
    pub fn pending_requests(&self) -> usize {
        self.shared.state.lock().callbacks.len()
    }

    /// Inbound tasks waiting to be dispatched
    pub fn queued_tasks(&self) -> usize {
        self.shared.state.lock().tasks.len()
    }

    /// Handlers still running with a registered cancel hook
    pub fn active_cancel_hooks(&self) -> usize {
        self.shared.state.lock().cancel_hooks.len()
    }

    pub fn metrics(&self) -> &ActorMetrics {
        &self.shared.metrics
    }

    pub fn stats(&self) -> ActorStats {
        self.shared.metrics.stats()
    }
}

impl Drop for Actor {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.shared.name)
            .field("owner", &self.shared.owner)
            .field("queue_all", &self.shared.queue_all)
            .field("detached", &self.is_detached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{InboundStream, MessagePort};
    use serde_json::json;
    use tokio::sync::mpsc;

    /// Transport that records outbound traffic and never delivers inbound
    #[derive(Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<Envelope>>>,
        inbound: Mutex<Vec<mpsc::UnboundedSender<TransportMessage>>>,
    }

    impl Transport for Recorder {
        fn post_message(&self, message: TransportMessage) -> Result<()> {
            self.sent.lock().push(message.envelope);
            Ok(())
        }

        fn subscribe(&self) -> InboundStream {
            let (tx, rx) = mpsc::unbounded_channel();
            self.inbound.lock().push(tx);
            rx
        }
    }

    fn recorder_actor(peer: Peer, queue_all: bool) -> (Actor, Arc<Mutex<Vec<Envelope>>>) {
        let recorder = Recorder::default();
        let sent = Arc::clone(&recorder.sent);
        let actor = Actor::builder(recorder)
            .owner(1)
            .name("test")
            .queue_all(queue_all)
            .peer(peer)
            .spawn()
            .unwrap();
        (actor, sent)
    }

    fn request(id: u64, kind: &str, payload: Value, has_callback: bool) -> Envelope {
        Envelope::request(id, kind, WireValue::Structured(payload), has_callback, None, ContextId::from(2))
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let (a, _b) = MessagePort::pair();
        let err = Actor::new(a, 1, Peer::new()).unwrap_err();
        assert_eq!(err.category(), "runtime");
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let (a, _b) = MessagePort::pair();
        let err = Actor::builder(a).name("").spawn().unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    #[tokio::test]
    async fn test_send_records_pending_and_cancel_clears_it() {
        let (actor, sent) = recorder_actor(Peer::new(), true);
        let handle = actor
            .send("echo", json!(1), Some(Box::new(|_| {})), Some(ContextId::from(5)))
            .unwrap();
        assert_eq!(actor.pending_requests(), 1);

        handle.cancel();
        handle.cancel();
        assert_eq!(actor.pending_requests(), 0);

        let sent = sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, "echo");
        assert!(sent[0].has_callback);
        assert_eq!(sent[0].target_context_id, Some(ContextId::from(5)));
        assert!(sent[1].is_cancel());
        assert_eq!(sent[1].id, sent[0].id);
        assert_eq!(sent[1].target_context_id, Some(ContextId::from(5)));
    }

    #[tokio::test]
    async fn test_cancel_removes_queued_task_synchronously() {
        let (actor, sent) = recorder_actor(Peer::new().with_handler("work", |_, _, done| {
            done.resolve(json!("ran"));
            None
        }), true);

        actor.receive(request(10, "work", json!(null), true));
        assert_eq!(actor.queued_tasks(), 1);
        actor.receive(Envelope::cancel(10, None, ContextId::from(2)));
        assert_eq!(actor.queued_tasks(), 0);

        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert!(sent.lock().is_empty());
        assert_eq!(actor.stats().cancels_applied, 1);
    }

    #[tokio::test]
    async fn test_unroutable_envelopes_dropped() {
        let (actor, _sent) = recorder_actor(Peer::new(), true);

        actor.receive(request(0, "work", json!(null), false));
        let mut foreign = request(3, "work", json!(null), false);
        foreign.target_context_id = Some(ContextId::from(99));
        actor.receive(foreign);
        actor.receive_bytes(b"not json");

        assert_eq!(actor.queued_tasks(), 0);
        assert_eq!(actor.stats().envelopes_dropped, 3);
    }

    #[tokio::test]
    async fn test_immediate_mode_dispatches_inline() {
        let (actor, sent) = recorder_actor(
            Peer::new().with_handler("now", |_, payload, done| {
                done.resolve(payload);
                None
            }),
            false,
        );

        actor.receive(request(4, "now", json!(8), true));
        assert_eq!(actor.queued_tasks(), 0);
        let sent = sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_response());
        assert_eq!(sent[0].payload, WireValue::Structured(json!(8)));
    }

    #[tokio::test]
    async fn test_immediate_mode_still_queues_must_queue() {
        let (actor, _sent) = recorder_actor(Peer::new(), false);
        actor.receive(request(4, "later", json!(null), false).queued());
        assert_eq!(actor.queued_tasks(), 1);
    }

    #[tokio::test]
    async fn test_sync_done_does_not_register_hook() {
        let (actor, _sent) = recorder_actor(
            Peer::new().with_handler("quick", |_, _, done| {
                done.resolve(json!(null));
                Some(CancelHook::new(|| panic!("must not fire")))
            }),
            false,
        );

        actor.receive(request(6, "quick", json!(null), true));
        assert_eq!(actor.active_cancel_hooks(), 0);
        actor.receive(Envelope::cancel(6, None, ContextId::from(2)));
    }

    #[tokio::test]
    async fn test_detach_rejects_sends_and_ignores_receives() {
        let (actor, _sent) = recorder_actor(Peer::new(), true);
        actor.receive(request(7, "queued", json!(null), false));

        actor.detach();
        actor.detach();
        assert!(actor.is_detached());
        assert_eq!(actor.queued_tasks(), 0);

        actor.receive(request(8, "queued", json!(null), false));
        assert_eq!(actor.queued_tasks(), 0);

        let err = actor.notify("x", json!(null), None).unwrap_err();
        assert_eq!(err.category(), "detached");
    }

    #[tokio::test]
    async fn test_response_error_wins_over_payload() {
        let (actor, _sent) = recorder_actor(Peer::new(), false);
        let reply = Arc::new(Mutex::new(None));
        let reply_in = Arc::clone(&reply);

        let handle = actor
            .send(
                "tile",
                json!(null),
                Some(Box::new(move |result| *reply_in.lock() = Some(result))),
                None,
            )
            .unwrap();
        actor.receive(Envelope::response(
            handle.id(),
            ContextId::from(1),
            ContextId::from(2),
            WireValue::Structured(json!(5)),
            Some(WireValue::Structured(json!("boom"))),
        ));

        let reply = reply.lock().take().expect("callback invoked");
        let err = reply.unwrap_err();
        assert_eq!(err.message, "boom");
        assert_eq!(actor.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_cancel_after_detach_sends_nothing() {
        let (actor, sent) = recorder_actor(Peer::new(), true);
        let handle = actor
            .send("slow", json!(null), Some(Box::new(|_| {})), None)
            .unwrap();
        let pending = actor.request("slow", json!(null), None).unwrap();

        actor.detach();
        handle.cancel();
        drop(pending);

        let sent = sent.lock();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|envelope| !envelope.is_cancel()));
        assert_eq!(actor.stats().cancels_sent, 0);
    }

    #[tokio::test]
    async fn test_handler_panic_rejects_requester() {
        let (actor, sent) = recorder_actor(
            Peer::new().with_handler("explode", |_, _, _| panic!("handler exploded")),
            false,
        );

        actor.receive(request(12, "explode", json!(null), true));

        let sent = sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_response());
        assert_eq!(sent[0].target_context_id, Some(ContextId::from(2)));
        let error = match &sent[0].error {
            Some(WireValue::Structured(value)) => RemoteError::from_value(value.clone()),
            other => panic!("Expected structured error, got {:?}", other),
        };
        assert!(error.is_code(RemoteError::HANDLER_PANICKED));
        assert!(error.message.contains("explode"));
        assert_eq!(actor.stats().handler_panics, 1);
    }
}
