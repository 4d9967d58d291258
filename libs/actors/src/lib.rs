//! Actor Message Channel
//!
//! Bidirectional request/response messaging between two execution contexts
//! that share nothing but a message transport. Each side runs an [`Actor`]
//! bound to a [`Transport`], a [`Peer`] of handlers and an owner identity.
//!
//! ```text
//!  context A                                       context B
//! ┌────────────────────┐   request envelope   ┌────────────────────┐
//! │ Actor::send ───────┼─────────────────────▶│ receive → queue    │
//! │  pending callbacks │                      │ drain → Peer       │
//! │                    │◀─────────────────────┼── Completion       │
//! │ callback(result)   │   "<response>"       │                    │
//! │ Cancelable::cancel ┼─────────────────────▶│ cancel hook        │
//! └────────────────────┘   "<cancel>"         └────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use messaging_actors::{Actor, MessagePort, Peer};
//! use serde_json::json;
//!
//! # async fn run() -> messaging_actors::Result<()> {
//! let (main_port, worker_port) = MessagePort::pair();
//!
//! let _worker = Actor::new(
//!     worker_port,
//!     2,
//!     Peer::new().with_handler("echo", |_, payload, done| {
//!         done.resolve(payload);
//!         None
//!     }),
//! )?;
//! let main = Actor::new(main_port, 1, Peer::new())?;
//!
//! let reply = main.request("echo", json!(42), None)?.await;
//! assert_eq!(reply, Ok(json!(42)));
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod completion;
pub mod context;
pub mod envelope;
pub mod error;
pub mod ids;
pub mod logging;
pub mod metrics;
pub mod peer;
pub mod settings;
pub mod transport;

pub use actor::{Actor, ActorBuilder, Callback};
pub use completion::{Cancelable, Completion, PendingReply, Reply};
pub use context::ContextId;
pub use envelope::{Envelope, CANCEL_TYPE, RESPONSE_TYPE};
pub use error::{ActorError, RemoteError, Result};
pub use ids::next_envelope_id;
pub use metrics::{ActorMetrics, ActorStats};
pub use peer::{CancelHook, Handler, MethodTable, Peer, Scope, ScopeMethod, ScopeResolver};
pub use settings::ActorConfig;
pub use transport::{InboundStream, MessagePort, Transport, TransportMessage};

pub use codec::{Codec, CodecError, JsonBytesCodec, StructuredCodec, Value, WireValue};
