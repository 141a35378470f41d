//! Scenario 1: an actor that re-sends itself an incrementing counter until
//! it reaches a bound.

use anyhow::Result;
use ringactor::{ActorId, Inbox, Rule, System, SystemOptions};

fn main() -> Result<()> {
    let system = System::new(SystemOptions::new(0, None, 5));

    system.register(Rule::foreground(
        |id| id == ActorId(1),
        |_id| {
            let mut inbox = Inbox::new();
            inbox.on_all::<i32, _>(|mail| {
                let value = mail.messages[0];
                println!("actor 1 handled {value}");
                if value + 1 < 10 {
                    mail.outbox.send_one(mail.destination, value + 1);
                }
            });
            inbox
        },
    ));

    system.send(ActorId(1), 0i32);
    system.run();

    println!("pending = {}", system.pending());
    Ok(())
}
