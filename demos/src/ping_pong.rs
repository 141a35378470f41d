//! Scenario 2: two foreground actors hop a counter back and forth.

use anyhow::Result;
use ringactor::{ActorId, Inbox, Rule, System, SystemOptions};

fn register_hop(system: &System, id: ActorId, peer: ActorId) {
    system.register(Rule::foreground(move |aid| aid == id, move |_id| {
        let mut inbox = Inbox::new();
        inbox.on_all::<i32, _>(move |mail| {
            let value = mail.messages[0];
            println!("{id} handled {value}");
            if value + 1 < 10 {
                mail.outbox.send_one(peer, value + 1);
            }
        });
        inbox
    }));
}

fn main() -> Result<()> {
    let system = System::new(SystemOptions::new(0, None, 5));
    register_hop(&system, ActorId(1), ActorId(2));
    register_hop(&system, ActorId(2), ActorId(1));

    system.send(ActorId(1), 0i32);
    system.run();

    println!("pending = {}", system.pending());
    Ok(())
}
