//! Scenario 4: one writer fans a three-message batch out to three
//! recipients, each receiving the messages in the order they were added.

use anyhow::Result;
use ringactor::{ActorId, Inbox, Rule, System, SystemOptions};

fn main() -> Result<()> {
    let system = System::new(SystemOptions::new(0, None, 5));

    for id in [1u32, 2, 3] {
        system.register(Rule::foreground(move |aid| aid == ActorId(id), move |_id| {
            let mut inbox = Inbox::new();
            inbox.on_all::<i64, _>(move |mail| {
                println!("actor {id} received {:?}", mail.messages);
            });
            inbox
        }));
    }

    let mut writer = system.begin_send::<i64>();
    writer.add_recipients([ActorId(1), ActorId(2), ActorId(3)]);
    writer.add_messages([100i64, 101, 102]);
    writer.close();

    system.run_all();

    println!("pending = {}", system.pending());
    Ok(())
}
