//! ringactor - an in-process actor runtime for game loops
//!
//! Producers build a batch of messages with a [`Writer`], close it, and the
//! batch fans out as one [`Delivery`] per recipient onto lock-free SPSC
//! queues. A [`System`] pumps those queues each tick: completions are
//! drained first (releasing batches back to their pool), then new sends are
//! routed into the destination actor's inbox (creating it from a registered
//! [`Rule`] on first use), then every foreground actor gets to run. Actors
//! assigned to a background worker are driven by that worker's own thread
//! instead, parked between wakes.
//!
//! # Example
//!
//! ```
//! use ringactor::{ActorId, Inbox, Rule, System, SystemOptions};
//!
//! let system = System::new(SystemOptions::new(0, None, 5));
//!
//! system.register(Rule::foreground(
//!     |id| id == ActorId(1),
//!     |_id| {
//!         let mut inbox = Inbox::new();
//!         inbox.on_all::<i32, _>(|mail| {
//!             if mail.messages[0] < 3 {
//!                 mail.outbox.send_one(mail.destination, mail.messages[0] + 1);
//!             }
//!         });
//!         inbox
//!     },
//! ));
//!
//! system.send(ActorId(1), 0i32);
//! system.run_all();
//! assert_eq!(system.pending(), 0);
//! ```

mod actor;
mod backoff;
mod batch;
mod chain;
mod config;
mod erased;
mod error;
mod id;
mod inbox;
mod invariants;
mod mail;
mod metrics;
mod outbox;
mod pool;
mod registry;
mod ring;
mod system;
mod worker;
mod writer;

pub use backoff::Backoff;
pub use chain::RingBufferChain;
pub use config::SystemOptions;
pub use error::HandlerError;
pub use id::ActorId;
pub use inbox::Inbox;
pub use mail::Mail;
pub use metrics::{Metrics, MetricsSnapshot};
pub use outbox::Outbox;
pub use registry::ExecutionKind;
pub use system::{Rule, System};
pub use writer::Writer;
