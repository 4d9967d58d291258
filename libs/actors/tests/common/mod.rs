//! Shared fixtures for actor channel tests

#![allow(dead_code)]

use messaging_actors::{Actor, MessagePort, Peer, Reply, TransportMessage, Transport};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;

pub const MAIN: u64 = 1;
pub const WORKER: u64 = 2;

/// Upper bound for anything that is expected to happen
pub const SETTLE: Duration = Duration::from_secs(5);

/// Main/worker pair over an in-process port
pub struct Harness {
    pub main: Actor,
    pub worker: Actor,
    pub main_port: MessagePort,
    pub worker_port: MessagePort,
}

impl Harness {
    pub fn new(peer: Peer) -> Self {
        Self::with_worker(peer, |builder| builder)
    }

    pub fn with_worker(
        peer: Peer,
        configure: impl FnOnce(messaging_actors::ActorBuilder) -> messaging_actors::ActorBuilder,
    ) -> Self {
        messaging_actors::logging::init_test_tracing();

        let (main_port, worker_port) = MessagePort::named_pair("main", "worker");
        let worker = configure(
            Actor::builder(worker_port.clone())
                .owner(WORKER)
                .name("worker")
                .peer(with_flush(peer)),
        )
        .spawn()
        .expect("worker spawns");
        let main = Actor::builder(main_port.clone())
            .owner(MAIN)
            .name("main")
            .spawn()
            .expect("main spawns");

        Self {
            main,
            worker,
            main_port,
            worker_port,
        }
    }

    /// Round trip through the worker; everything sent before has been handled
    pub async fn flush(&self) {
        let reply = tokio::time::timeout(SETTLE, self.main.request("flush", json!(null), None).unwrap())
            .await
            .expect("flush answered");
        assert_eq!(reply, Ok(Value::Null));
    }

    /// Observe everything the worker posts towards main
    pub fn tap_main_inbound(&self) -> mpsc::UnboundedReceiver<TransportMessage> {
        self.main_port.subscribe()
    }
}

fn with_flush(peer: Peer) -> Peer {
    if peer.has_handler("flush") {
        return peer;
    }
    peer.with_handler("flush", |_, _, done| {
        done.resolve(Value::Null);
        None
    })
}

/// Callback forwarding the reply into a channel
pub fn reply_channel() -> (messaging_actors::Callback, mpsc::UnboundedReceiver<Reply>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: messaging_actors::Callback = Box::new(move |reply| {
        let _ = tx.send(reply);
    });
    (callback, rx)
}

pub fn echo_peer() -> Peer {
    Peer::new().with_handler("echo", |_, payload, done| {
        done.resolve(payload);
        None
    })
}

/// Drain all messages currently buffered on a tap
pub fn drain(tap: &mut mpsc::UnboundedReceiver<TransportMessage>) -> Vec<TransportMessage> {
    let mut out = Vec::new();
    while let Ok(message) = tap.try_recv() {
        out.push(message);
    }
    out
}
