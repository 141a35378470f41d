//! The envelope handed to a handler: source/destination/channel plus the
//! batch's message slice and an outbox to respond through (`spec.md` §3, §4.8).

use crate::id::ActorId;
use crate::outbox::Outbox;

/// What a registered handler for type `T` receives.
pub struct Mail<'a, T> {
    pub source: ActorId,
    pub destination: ActorId,
    pub channel: i64,
    pub messages: &'a [T],
    pub outbox: &'a Outbox,
}

impl<'a, T> Mail<'a, T> {
    pub(crate) fn new(
        source: ActorId,
        destination: ActorId,
        channel: i64,
        messages: &'a [T],
        outbox: &'a Outbox,
    ) -> Self {
        Self { source, destination, channel, messages, outbox }
    }

    /// Sends `message` back to this mail's source, stamped with this mail's
    /// destination as the reply's source and the same channel — the
    /// "Respond" pattern (`spec.md` §8): swap source/destination, keep the
    /// channel.
    pub fn respond<U: Send + Sync + 'static>(&self, message: U) {
        let mut writer = self.outbox.begin_send::<U>();
        writer.set_source(self.destination);
        writer.set_channel(self.channel);
        writer.add_recipient(self.source);
        writer.add_message(message);
        writer.close();
        self.outbox.recycle(writer);
    }
}
