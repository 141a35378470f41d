//! Top-level orchestrator (`spec.md` §4.7).
//!
//! `System` is the one piece of public surface that ties every other module
//! together: a [`Registry`] resolves addresses into actors, a main-thread
//! [`Outbox`] is the entry point for every `send`, a pool of [`WorkerHandle`]s
//! drives background actors, and a pump cycle moves completions and sends
//! between all of them each time `run`/`run_all` is called. Everything here
//! runs on whichever thread owns the `System` — there is no internal locking
//! beyond what the workers themselves need, matching `spec.md` §5's "a single
//! main thread drives the pump and all foreground actors."

use crate::actor::Actor;
use crate::chain::RingBufferChain;
use crate::config::SystemOptions;
use crate::erased::Delivery;
use crate::error::HandlerError;
use crate::id::ActorId;
use crate::inbox::Inbox;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::outbox::Outbox;
use crate::registry::{ExecutionKind, ExecutionTarget, Registry, Resolved};
use crate::worker::WorkerHandle;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

type Predicate = Box<dyn Fn(ActorId) -> bool + Send + Sync>;
type Builder = Box<dyn Fn(ActorId) -> Inbox + Send + Sync>;

/// A declarative registration: either a factory for a class of actor ids, or
/// a redirect from one id to another (`spec.md` §4.6). Construct with
/// [`Rule::foreground`], [`Rule::background`], [`Rule::route`], or
/// [`Rule::redirect`] and hand to [`System::register`].
pub enum Rule {
    Factory { kind: ExecutionKind, can_create: Predicate, build: Builder },
    Redirect { from: ActorId, to: ActorId },
}

impl Rule {
    /// A rule whose matching actors run on the main thread.
    pub fn foreground<P, B>(can_create: P, build: B) -> Self
    where
        P: Fn(ActorId) -> bool + Send + Sync + 'static,
        B: Fn(ActorId) -> Inbox + Send + Sync + 'static,
    {
        Rule::Factory { kind: ExecutionKind::MainForeground, can_create: Box::new(can_create), build: Box::new(build) }
    }

    /// A rule whose matching actors are assigned to a background worker.
    pub fn background<P, B>(can_create: P, build: B) -> Self
    where
        P: Fn(ActorId) -> bool + Send + Sync + 'static,
        B: Fn(ActorId) -> Inbox + Send + Sync + 'static,
    {
        Rule::Factory {
            kind: ExecutionKind::DefaultBackground,
            can_create: Box::new(can_create),
            build: Box::new(build),
        }
    }

    /// A low-priority background rule, outranked by any `foreground`/
    /// `background` rule that also claims the same id (`spec.md` §4.6's
    /// dominance ladder: `None < Route < DefaultBackground < MainForeground`).
    pub fn route<P, B>(can_create: P, build: B) -> Self
    where
        P: Fn(ActorId) -> bool + Send + Sync + 'static,
        B: Fn(ActorId) -> Inbox + Send + Sync + 'static,
    {
        Rule::Factory { kind: ExecutionKind::Route, can_create: Box::new(can_create), build: Box::new(build) }
    }

    /// Makes `from` resolve to `to` before any factory rule is consulted.
    pub fn redirect(from: ActorId, to: ActorId) -> Self {
        Rule::Redirect { from, to }
    }
}

/// Top-level runtime: registers actor rules, owns the background worker
/// pool, and pumps messages between the main thread and workers.
pub struct System {
    registry: RefCell<Registry>,
    main_outbox: Outbox,
    main_completion_queue: Arc<RingBufferChain<Delivery>>,
    foreground_actors: RefCell<Vec<Arc<Actor>>>,
    workers: Vec<WorkerHandle>,
    options: SystemOptions,
    metrics: Arc<Metrics>,
    disposed: RefCell<bool>,
}

impl System {
    pub fn new(options: SystemOptions) -> Self {
        let metrics = Arc::new(Metrics::new());
        let main_send_queue = Arc::new(RingBufferChain::with_initial_capacity(options.initial_node_capacity()));
        let main_outbox = Outbox::new(main_send_queue, Arc::clone(&metrics));

        let workers = (0..options.worker_threads)
            .map(|i| WorkerHandle::spawn(format!("ringactor-worker-{i}"), options.process_limit, Arc::clone(&metrics)))
            .collect();

        Self {
            registry: RefCell::new(Registry::new()),
            main_outbox,
            main_completion_queue: Arc::new(RingBufferChain::with_initial_capacity(options.initial_node_capacity())),
            foreground_actors: RefCell::new(Vec::new()),
            workers,
            options,
            metrics,
            disposed: RefCell::new(false),
        }
    }

    /// Registers one rule. Must happen before the first `send` that could
    /// address the actor it describes — `spec.md` §6.
    pub fn register(&self, rule: Rule) {
        match rule {
            Rule::Factory { kind, can_create, build } => {
                self.registry.borrow_mut().register(kind, can_create, move |id| Actor::new(id, build(id)));
            }
            Rule::Redirect { from, to } => {
                self.registry.borrow_mut().redirect(from, to);
            }
        }
    }

    pub fn register_all(&self, rules: impl IntoIterator<Item = Rule>) {
        for rule in rules {
            self.register(rule);
        }
    }

    /// Opens a writer on the main-thread outbox.
    pub fn begin_send<T: Send + Sync + 'static>(&self) -> crate::writer::Writer<T> {
        self.main_outbox.begin_send::<T>()
    }

    /// Sends a single message from the undefined source on channel 0.
    pub fn send<T: Send + Sync + 'static>(&self, dest: ActorId, message: T) {
        self.main_outbox.send_one(dest, message);
    }

    /// Sends a single message stamped with an explicit source and channel.
    pub fn send_from<T: Send + Sync + 'static>(&self, dest: ActorId, message: T, source: ActorId, channel: i64) {
        let mut writer = self.main_outbox.begin_send::<T>();
        writer.set_source(source);
        writer.set_channel(channel);
        writer.add_recipient(dest);
        writer.add_message(message);
        writer.close();
        self.main_outbox.recycle(writer);
    }

    /// Sends every message in `messages` to `dest` as one batch.
    pub fn send_all<T: Send + Sync + 'static>(&self, dest: ActorId, messages: impl IntoIterator<Item = T>) {
        self.main_outbox.send_all(dest, messages);
    }

    /// Drains one full pump cycle repeatedly until a pass produces no work.
    /// Returns any handler errors surfaced while draining completions.
    pub fn run(&self) -> Vec<HandlerError> {
        let mut errors = Vec::new();
        while self.pump_once(&mut errors) {}
        errors
    }

    /// `run()`, then sleeps 1ms between further pumps while background work
    /// remains in flight (`spec.md` §4.7's quiescence loop).
    pub fn run_all(&self) -> Vec<HandlerError> {
        let mut errors = self.run();
        while self.metrics.snapshot().pending() > 0 {
            std::thread::sleep(Duration::from_millis(1));
            errors.extend(self.run());
        }
        errors
    }

    /// Current metrics snapshot — `pending()` is `spec.md` §4.7's quiescence
    /// counter (`sentCount - disposedCount`).
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn pending(&self) -> u64 {
        self.metrics.snapshot().pending()
    }

    /// Shuts down every worker and disposes every live actor. Idempotent —
    /// safe to call more than once, and called automatically on `Drop`.
    pub fn dispose(&mut self) {
        if *self.disposed.borrow() {
            return;
        }
        *self.disposed.borrow_mut() = true;

        self.main_outbox.mark_shutdown();
        for worker in &mut self.workers {
            worker.shutdown();
        }
        self.workers.clear();
        self.foreground_actors.borrow_mut().clear();

        let live = self.registry.borrow_mut().drain_live();
        for actor in live {
            for delivery in actor.drain_remaining() {
                (delivery.release)(delivery.batch, &self.metrics);
                self.metrics.add_disposed(1);
            }
            if let Ok(inner) = Arc::try_unwrap(actor) {
                inner.dispose();
            }
        }
    }

    // -- pump internals --------------------------------------------------

    /// One full pump cycle: drain completions, drain sends into actor
    /// inboxes, run the foreground pass. Returns whether any step did work.
    fn pump_once(&self, errors: &mut Vec<HandlerError>) -> bool {
        let mut did_work = false;

        did_work |= self.drain_main_completions(errors);
        for worker in &self.workers {
            did_work |= self.drain_worker_completions(worker, errors);
        }

        did_work |= self.drain_sends(self.main_outbox.send_queue());
        for worker in &self.workers {
            did_work |= self.drain_worker_sends(worker);
        }

        did_work |= self.run_foreground_pass();
        did_work
    }

    fn drain_main_completions(&self, errors: &mut Vec<HandlerError>) -> bool {
        let mut did_work = false;
        while let Some(delivery) = self.main_completion_queue.pop() {
            self.process_completion(delivery, errors);
            did_work = true;
        }
        did_work
    }

    fn drain_worker_completions(&self, worker: &WorkerHandle, errors: &mut Vec<HandlerError>) -> bool {
        let mut did_work = false;
        while let Some(delivery) = worker.pop_completion() {
            self.process_completion(delivery, errors);
            did_work = true;
        }
        did_work
    }

    fn process_completion(&self, delivery: Delivery, errors: &mut Vec<HandlerError>) {
        let Delivery { batch, release, error, .. } = delivery;
        release(batch, &self.metrics);
        self.metrics.add_disposed(1);
        if let Some(err) = error {
            self.metrics.add_handler_error();
            errors.push(err);
        }
    }

    fn drain_sends(&self, queue: &RingBufferChain<Delivery>) -> bool {
        let mut did_work = false;
        while let Some(delivery) = queue.pop() {
            self.route_delivery(delivery);
            did_work = true;
        }
        did_work
    }

    fn drain_worker_sends(&self, worker: &WorkerHandle) -> bool {
        let mut did_work = false;
        while let Some(delivery) = worker.pop_send() {
            self.route_delivery(delivery);
            did_work = true;
        }
        did_work
    }

    /// Resolves `delivery`'s destination and either drops it (undefined id,
    /// or no rule matched) or routes it onto the resolved actor's inbox
    /// chain, per `spec.md` §7's "unresolved destination" handling:
    /// silently dropped, but still released and counted so quiescence holds.
    fn route_delivery(&self, delivery: Delivery) {
        if delivery.dest.is_undefined() {
            (delivery.release)(delivery.batch, &self.metrics);
            self.metrics.add_disposed(1);
            return;
        }

        let resolved = self.registry.borrow_mut().get_or_create(delivery.dest);
        match resolved {
            Resolved::Undefined => {
                (delivery.release)(delivery.batch, &self.metrics);
                self.metrics.add_disposed(1);
            }
            Resolved::Created(actor, target) => {
                self.adopt_new_actor(&actor, target);
                self.deliver(&actor, target, delivery);
            }
            Resolved::Existing(actor, target) => {
                self.deliver(&actor, target, delivery);
            }
        }
    }

    /// Assigns a freshly created actor to its execution target. Background
    /// actors are assigned to exactly one worker by `id mod worker_count`
    /// (`SPEC_FULL.md` §C's single-owner resolution of the source's
    /// broadcast-to-every-worker artifact).
    fn adopt_new_actor(&self, actor: &Arc<Actor>, target: ExecutionTarget) {
        match target {
            ExecutionTarget::Foreground => {
                self.foreground_actors.borrow_mut().push(Arc::clone(actor));
            }
            ExecutionTarget::Background => {
                if let Some(worker) = self.worker_for(actor.id()) {
                    worker.assign(Arc::clone(actor));
                }
            }
        }
    }

    fn deliver(&self, actor: &Arc<Actor>, target: ExecutionTarget, delivery: Delivery) {
        actor.enqueue(delivery);
        if target == ExecutionTarget::Background {
            if let Some(worker) = self.worker_for(actor.id()) {
                worker.wake();
            }
        }
    }

    fn worker_for(&self, id: ActorId) -> Option<&WorkerHandle> {
        if self.workers.is_empty() {
            return None;
        }
        let idx = (id.0 as usize) % self.workers.len();
        self.workers.get(idx)
    }

    /// Runs every foreground actor once, in registration order, each bounded
    /// by `process_limit` — strict round-robin across the pass, per
    /// `SPEC_FULL.md` §C's fairness resolution.
    fn run_foreground_pass(&self) -> bool {
        let actors = self.foreground_actors.borrow().clone();
        let mut did_work = false;
        for actor in &actors {
            let processed =
                actor.run(&self.main_outbox, self.options.process_limit, |completion| self.main_completion_queue.push(completion));
            if processed > 0 {
                did_work = true;
            }
        }
        did_work
    }
}

impl Drop for System {
    fn drop(&mut self) {
        self.dispose();
    }
}
