//! Scenario 3: same hop as `ping_pong`, but actor 2 runs on a background
//! worker thread instead of the main thread.

use anyhow::Result;
use ringactor::{ActorId, Inbox, Rule, System, SystemOptions};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn main() -> Result<()> {
    let system = System::new(SystemOptions::new(1, None, 5));
    let saw_background_thread = Arc::new(AtomicBool::new(false));
    let main_thread = thread::current().id();

    system.register(Rule::foreground(
        |id| id == ActorId(1),
        |_id| {
            let mut inbox = Inbox::new();
            inbox.on_all::<i32, _>(|mail| {
                let value = mail.messages[0];
                println!("actor 1 (main) handled {value}");
                if value + 1 < 10 {
                    mail.outbox.send_one(ActorId(2), value + 1);
                }
            });
            inbox
        },
    ));

    let flag = Arc::clone(&saw_background_thread);
    system.register(Rule::background(
        |id| id == ActorId(2),
        move |_id| {
            let flag = Arc::clone(&flag);
            let mut inbox = Inbox::new();
            inbox.on_all::<i32, _>(move |mail| {
                if thread::current().id() != main_thread {
                    flag.store(true, Ordering::SeqCst);
                }
                let value = mail.messages[0];
                println!("actor 2 (background) handled {value}");
                if value + 1 < 10 {
                    mail.outbox.send_one(ActorId(1), value + 1);
                }
            });
            inbox
        },
    ));

    system.send(ActorId(1), 0i32);
    system.run_all();

    println!("pending = {}", system.pending());
    println!("saw a delivery off the main thread: {}", saw_background_thread.load(Ordering::SeqCst));
    Ok(())
}
