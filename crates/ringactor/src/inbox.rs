//! Per-actor handler table (`spec.md` §4.8).
//!
//! An actor registers zero or more handlers per message type via
//! [`Inbox::on_all`]. Dispatch recovers the concrete `Batch<T>` from the
//! type-erased delivery by `TypeId`, so the lookup and the downcast always
//! agree. A type with no registered handler is silently dropped; repeated
//! registrations for the same type chain in registration order rather than
//! overwriting each other.

use crate::batch::Batch;
use crate::error::HandlerError;
use crate::erased::ErasedBatch;
use crate::id::ActorId;
use crate::mail::Mail;
use crate::outbox::Outbox;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

type HandlerFn = Box<dyn Fn(&ErasedBatch, ActorId, ActorId, i64, &Outbox) -> Result<(), HandlerError> + Send + Sync>;

#[derive(Default)]
pub struct Inbox {
    handlers: HashMap<TypeId, Vec<HandlerFn>>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every batch of type `T` delivered to this
    /// actor. A second registration for the same `T` runs *in addition to*,
    /// not instead of, the first.
    pub fn on_all<T, F>(&mut self, handler: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(Mail<'_, T>) + Send + Sync + 'static,
    {
        let boxed: HandlerFn = Box::new(move |batch, source, dest, channel, outbox| {
            let typed = batch
                .downcast_ref::<Batch<T>>()
                .expect("inbox dispatch only ever invoked for the TypeId it was looked up under");
            let mail = Mail::new(source, dest, channel, typed.messages(), outbox);
            // Caught here, not at the actor dispatch loop, so the diagnostic
            // context below carries this handler's real `T` rather than a
            // type-erased placeholder.
            catch_unwind(AssertUnwindSafe(|| handler(mail))).map_err(|panic| {
                HandlerError::new::<T>(dest, dest, source, channel, 0, panic_message(&panic))
            })
        });
        self.handlers.entry(TypeId::of::<T>()).or_default().push(boxed);
        self
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<T>())
    }

    /// Dispatches `batch` to every handler chained for its type, in
    /// registration order. Returns `Ok(false)` (a silent drop) if no handler
    /// was ever registered for this type.
    pub(crate) fn receive(
        &self,
        batch: &ErasedBatch,
        source: ActorId,
        dest: ActorId,
        channel: i64,
        outbox: &Outbox,
    ) -> Result<bool, HandlerError> {
        let type_id = batch.as_ref().type_id();
        match self.handlers.get(&type_id) {
            Some(chain) => {
                for handler in chain {
                    handler(batch, source, dest, channel, outbox)?;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked with a non-string payload".to_string()
    }
}
