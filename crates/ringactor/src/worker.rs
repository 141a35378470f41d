//! Background worker threads (`spec.md` §4.5).
//!
//! Each worker owns a fixed set of actors (assigned once, at creation time —
//! `SPEC_FULL.md` §C's single-owner resolution), a producer [`Outbox`] whose
//! send queue the main thread drains every pump cycle, and a completion
//! queue it alone produces into. When a pass over every assigned actor does
//! no work, the worker parks; the main thread unparks it after routing new
//! deliveries into any of its actors' inboxes. `std::thread::Thread::unpark`
//! carries a permit, so a wake issued just before the worker parks is never
//! lost — no separate "pending wake" flag is needed.

use crate::actor::Actor;
use crate::erased::Delivery;
use crate::chain::RingBufferChain;
use crate::metrics::Metrics;
use crate::outbox::Outbox;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

pub(crate) struct WorkerHandle {
    send_queue: Arc<RingBufferChain<Delivery>>,
    completion_queue: Arc<RingBufferChain<Delivery>>,
    actors: Arc<Mutex<Vec<Arc<Actor>>>>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub(crate) fn spawn(name: String, process_limit: Option<usize>, metrics: Arc<Metrics>) -> Self {
        let send_queue = Arc::new(RingBufferChain::new());
        let completion_queue = Arc::new(RingBufferChain::new());
        let actors: Arc<Mutex<Vec<Arc<Actor>>>> = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(true));

        let thread_send_queue = Arc::clone(&send_queue);
        let thread_completion_queue = Arc::clone(&completion_queue);
        let thread_actors = Arc::clone(&actors);
        let thread_running = Arc::clone(&running);

        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || {
                let outbox = Outbox::new(thread_send_queue, metrics);
                run_loop(&thread_actors, &outbox, &thread_completion_queue, &thread_running, process_limit);
            })
            .expect("failed to spawn ringactor worker thread");

        Self { send_queue, completion_queue, actors, running, thread: Some(thread) }
    }

    /// Permanently assigns `actor` to this worker.
    pub(crate) fn assign(&self, actor: Arc<Actor>) {
        self.actors.lock().expect("worker actor list poisoned").push(actor);
    }

    pub(crate) fn pop_send(&self) -> Option<Delivery> {
        self.send_queue.pop()
    }

    pub(crate) fn pop_completion(&self) -> Option<Delivery> {
        self.completion_queue.pop()
    }

    /// Wakes the worker thread if it's currently parked waiting for work.
    pub(crate) fn wake(&self) {
        if let Some(t) = &self.thread {
            t.thread().unpark();
        }
    }

    pub(crate) fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        self.wake();
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop(
    actors: &Mutex<Vec<Arc<Actor>>>,
    outbox: &Outbox,
    completion_queue: &RingBufferChain<Delivery>,
    running: &AtomicBool,
    process_limit: Option<usize>,
) {
    while running.load(Ordering::Acquire) {
        let snapshot: Vec<Arc<Actor>> = actors.lock().expect("worker actor list poisoned").clone();
        let mut did_work = false;
        for actor in &snapshot {
            let processed = actor.run(outbox, process_limit, |completion| completion_queue.push(completion));
            if processed > 0 {
                did_work = true;
            }
        }
        if !did_work {
            thread::park();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Batch;
    use crate::erased::erase;
    use crate::id::ActorId;
    use crate::inbox::Inbox;
    use std::sync::atomic::AtomicU32;
    use std::time::{Duration, Instant};

    fn delivery_for<T: Send + Sync + 'static>(dest: ActorId, messages: Vec<T>) -> Delivery {
        let mut batch = Batch::<T>::new_empty(0);
        batch.messages = messages;
        batch.recipients = vec![dest];
        Delivery { dest, source: ActorId(99), channel: 0, batch: erase(Arc::new(batch)), release: |_, _| {}, error: None }
    }

    fn poll_until<F: FnMut() -> bool>(mut done: F, timeout: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn assigned_actor_processes_and_emits_completion_after_wake() {
        let seen = Arc::new(AtomicU32::new(0));
        let seen_in_handler = Arc::clone(&seen);
        let mut handlers = Inbox::new();
        handlers.on_all::<u32, _>(move |mail| {
            seen_in_handler.fetch_add(mail.messages[0], Ordering::SeqCst);
        });
        let actor = Arc::new(Actor::new(ActorId(1), handlers));

        let mut worker = WorkerHandle::spawn("test-worker".to_string(), None, Arc::new(Metrics::new()));
        worker.assign(Arc::clone(&actor));
        actor.enqueue(delivery_for(ActorId(1), vec![5u32]));
        worker.wake();

        let delivered = poll_until(|| seen.load(Ordering::SeqCst) == 5, Duration::from_secs(1));
        assert!(delivered, "handler never ran");

        let completion_seen = poll_until(|| worker.pop_completion().is_some(), Duration::from_secs(1));
        assert!(completion_seen, "completion never surfaced");

        worker.shutdown();
    }
}
