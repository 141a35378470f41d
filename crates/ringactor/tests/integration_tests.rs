//! The six literal end-to-end scenarios, run through the public API only.

use ringactor::{ActorId, Inbox, Rule, System, SystemOptions};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

fn foreground(worker_threads: usize) -> System {
    System::new(SystemOptions::new(worker_threads, None, 5))
}

#[test]
fn echo_handles_exactly_ten_and_quiesces() {
    let system = foreground(0);
    let handled = Arc::new(AtomicU32::new(0));
    let handled_in_handler = Arc::clone(&handled);

    system.register(Rule::foreground(
        |id| id == ActorId(1),
        move |_id| {
            let handled = Arc::clone(&handled_in_handler);
            let mut inbox = Inbox::new();
            inbox.on_all::<i32, _>(move |mail| {
                handled.fetch_add(1, Ordering::SeqCst);
                let value = mail.messages[0];
                if value + 1 < 10 {
                    mail.outbox.send_one(ActorId(1), value + 1);
                }
            });
            inbox
        },
    ));

    system.send(ActorId(1), 0i32);
    system.run();

    assert_eq!(handled.load(Ordering::SeqCst), 10);
    assert_eq!(system.pending(), 0);
}

#[test]
fn ping_pong_splits_five_and_five() {
    let system = foreground(0);
    let count_one = Arc::new(AtomicU32::new(0));
    let count_two = Arc::new(AtomicU32::new(0));

    for (id, peer, counter) in [
        (ActorId(1), ActorId(2), Arc::clone(&count_one)),
        (ActorId(2), ActorId(1), Arc::clone(&count_two)),
    ] {
        system.register(Rule::foreground(move |aid| aid == id, move |_id| {
            let counter = Arc::clone(&counter);
            let mut inbox = Inbox::new();
            inbox.on_all::<i32, _>(move |mail| {
                counter.fetch_add(1, Ordering::SeqCst);
                let value = mail.messages[0];
                if value + 1 < 10 {
                    mail.outbox.send_one(peer, value + 1);
                }
            });
            inbox
        }));
    }

    system.send(ActorId(1), 0i32);
    system.run();

    assert_eq!(count_one.load(Ordering::SeqCst), 5);
    assert_eq!(count_two.load(Ordering::SeqCst), 5);
    assert_eq!(system.pending(), 0);
}

#[test]
fn background_hop_runs_at_least_one_delivery_off_main_thread() {
    let system = foreground(1);
    let count_one = Arc::new(AtomicU32::new(0));
    let count_two = Arc::new(AtomicU32::new(0));
    let saw_background = Arc::new(AtomicBool::new(false));
    let main_thread = thread::current().id();

    let counter = Arc::clone(&count_one);
    system.register(Rule::foreground(
        |id| id == ActorId(1),
        move |_id| {
            let counter = Arc::clone(&counter);
            let mut inbox = Inbox::new();
            inbox.on_all::<i32, _>(move |mail| {
                counter.fetch_add(1, Ordering::SeqCst);
                let value = mail.messages[0];
                if value + 1 < 10 {
                    mail.outbox.send_one(ActorId(2), value + 1);
                }
            });
            inbox
        },
    ));

    let counter = Arc::clone(&count_two);
    let saw_background_in_handler = Arc::clone(&saw_background);
    system.register(Rule::background(
        |id| id == ActorId(2),
        move |_id| {
            let counter = Arc::clone(&counter);
            let saw_background = Arc::clone(&saw_background_in_handler);
            let mut inbox = Inbox::new();
            inbox.on_all::<i32, _>(move |mail| {
                if thread::current().id() != main_thread {
                    saw_background.store(true, Ordering::SeqCst);
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let value = mail.messages[0];
                if value + 1 < 10 {
                    mail.outbox.send_one(ActorId(1), value + 1);
                }
            });
            inbox
        },
    ));

    system.send(ActorId(1), 0i32);
    system.run_all();

    assert_eq!(count_one.load(Ordering::SeqCst), 5);
    assert_eq!(count_two.load(Ordering::SeqCst), 5);
    assert!(saw_background.load(Ordering::SeqCst), "expected at least one delivery off the main thread");
    assert_eq!(system.pending(), 0);
}

#[test]
fn batched_broadcast_delivers_in_order_to_every_recipient() {
    let system = foreground(0);
    let received: Arc<std::sync::Mutex<Vec<(u32, Vec<i64>)>>> = Arc::new(std::sync::Mutex::new(Vec::new()));

    for id in [1u32, 2, 3] {
        let received = Arc::clone(&received);
        system.register(Rule::foreground(move |aid| aid == ActorId(id), move |_id| {
            let received = Arc::clone(&received);
            let mut inbox = Inbox::new();
            inbox.on_all::<i64, _>(move |mail| {
                received.lock().unwrap().push((id, mail.messages.to_vec()));
            });
            inbox
        }));
    }

    let mut writer = system.begin_send::<i64>();
    writer.add_recipients([ActorId(1), ActorId(2), ActorId(3)]);
    writer.add_messages([100i64, 101, 102]);
    writer.close();

    system.run_all();

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 3);
    for (_, messages) in received.iter() {
        assert_eq!(messages, &[100, 101, 102]);
    }
    assert_eq!(system.pending(), 0);
}

struct Ping;
struct Pong;

#[test]
fn respond_swaps_source_and_destination() {
    let system = foreground(0);
    let pong_source = Arc::new(std::sync::Mutex::new(None));
    let pong_source_in_handler = Arc::clone(&pong_source);

    system.register(Rule::foreground(
        |id| id == ActorId(1),
        |_id| {
            let mut inbox = Inbox::new();
            inbox.on_all::<Ping, _>(|mail| mail.respond(Pong));
            inbox
        },
    ));
    system.register(Rule::foreground(
        |id| id == ActorId(2),
        move |_id| {
            let pong_source = Arc::clone(&pong_source_in_handler);
            let mut inbox = Inbox::new();
            inbox.on_all::<Pong, _>(move |mail| {
                *pong_source.lock().unwrap() = Some(mail.source);
            });
            inbox
        },
    ));

    system.send_from(ActorId(1), Ping, ActorId(2), 0);
    system.run();

    assert_eq!(*pong_source.lock().unwrap(), Some(ActorId(1)));
    assert_eq!(system.pending(), 0);
}

#[test]
fn chain_growth_grows_geometrically_and_preserves_fifo_order() {
    let chain = ringactor::RingBufferChain::<u32>::with_initial_capacity(2);
    for i in 1..=40u32 {
        chain.push(i);
    }

    let capacities = chain.node_capacities();
    assert!(capacities.len() >= 5, "expected at least 5 nodes, got {capacities:?}");
    assert_eq!(&capacities[..5], &[2, 4, 8, 16, 32]);

    let mut out = Vec::new();
    while let Some(value) = chain.pop() {
        out.push(value);
    }
    assert_eq!(out, (1..=40u32).collect::<Vec<_>>());
}
