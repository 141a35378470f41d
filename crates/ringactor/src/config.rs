/// Runtime configuration (`spec.md` §6).
#[derive(Debug, Clone, Copy)]
pub struct SystemOptions {
    /// Number of background worker threads. `0` disables background actors.
    pub worker_threads: usize,
    /// Maximum messages an actor processes per `run` invocation. `None` is unbounded.
    pub process_limit: Option<usize>,
    /// Initial capacity (power of two) for actor inbox and worker queue chains.
    pub ring_bits: u8,
    /// Whether to collect `Metrics` (slight overhead).
    pub enable_metrics: bool,
}

impl SystemOptions {
    /// # Panics
    ///
    /// Panics if `ring_bits` is outside `1..=20` (caps a node at 1M slots).
    pub const fn new(worker_threads: usize, process_limit: Option<usize>, ring_bits: u8) -> Self {
        assert!(ring_bits > 0 && ring_bits <= 20, "ring_bits must be between 1 and 20");
        Self {
            worker_threads,
            process_limit,
            ring_bits,
            enable_metrics: false,
        }
    }

    #[inline]
    pub const fn initial_node_capacity(&self) -> usize {
        1 << self.ring_bits
    }
}

impl Default for SystemOptions {
    fn default() -> Self {
        let worker_threads = std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1).max(1))
            .unwrap_or(1);

        Self {
            worker_threads,
            process_limit: None,
            ring_bits: 5, // 32 slots, matching spec.md's default initial node capacity
            enable_metrics: false,
        }
    }
}
