//! Error types, `thiserror`-based, in the teacher's `ChannelError` shape.

use crate::id::ActorId;
use std::any::type_name;
use thiserror::Error;

/// A handler panic/error caught at the actor dispatch boundary and attached
/// to the delivery's completion, surfaced to the caller of `System::run`
/// (`spec.md` §7).
#[derive(Debug, Error)]
#[error(
    "handler failed: actor={actor_id} dest={dest_id} source={source_id} channel={channel_id} \
     payload_type={payload_type} message_index={message_index}: {message}"
)]
pub struct HandlerError {
    pub actor_id: ActorId,
    pub dest_id: ActorId,
    pub source_id: ActorId,
    pub channel_id: i64,
    pub payload_type: &'static str,
    pub message_index: usize,
    pub message: String,
}

impl HandlerError {
    pub fn new<T>(
        actor_id: ActorId,
        dest_id: ActorId,
        source_id: ActorId,
        channel_id: i64,
        message_index: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            actor_id,
            dest_id,
            source_id,
            channel_id,
            payload_type: type_name::<T>(),
            message_index,
            message: message.into(),
        }
    }
}
