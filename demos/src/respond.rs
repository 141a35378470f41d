//! Scenario 5: actor 1 replies to whichever actor sent it a `Ping`, by
//! calling `Mail::respond` rather than addressing a reply by hand.

use anyhow::Result;
use ringactor::{ActorId, Inbox, Rule, System, SystemOptions};

struct Ping;
struct Pong;

fn main() -> Result<()> {
    let system = System::new(SystemOptions::new(0, None, 5));

    system.register(Rule::foreground(
        |id| id == ActorId(1),
        |_id| {
            let mut inbox = Inbox::new();
            inbox.on_all::<Ping, _>(|mail| {
                println!("actor 1 got a Ping from {}", mail.source);
                mail.respond(Pong);
            });
            inbox
        },
    ));

    system.register(Rule::foreground(
        |id| id == ActorId(2),
        |_id| {
            let mut inbox = Inbox::new();
            inbox.on_all::<Pong, _>(|mail| {
                println!("actor 2 got a Pong from {}", mail.source);
            });
            inbox
        },
    ));

    system.send_from(ActorId(1), Ping, ActorId(2), 0);
    system.run();

    println!("pending = {}", system.pending());
    Ok(())
}
