//! Stock [`EventSink`] implementations.

use std::sync::{Arc, Mutex};

use crate::api::traits::EventSink;
use crate::api::types::Event;

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &Event) {}
}

/// Forwards events to the `log` facade.
///
/// Load milestones go to `info`, per-token progress to `debug` and forward
/// timings to `trace`. Timing is only measured when `trace` is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &Event) {
        match event {
            Event::LoadStarted { source } => log::info!("loading model from {}", source),
            Event::HeaderDecoded { config } => log::info!(
                "header: dim={} hidden_dim={} n_layers={} n_heads={} n_kv_heads={} vocab_size={} seq_len={}",
                config.dim,
                config.hidden_dim,
                config.n_layers,
                config.n_heads,
                config.n_kv_heads,
                config.vocab_size,
                config.seq_len
            ),
            Event::KvHeadsIgnored { n_heads, n_kv_heads } => log::warn!(
                "n_kv_heads={} differs from n_heads={}; using one KV head per query head",
                n_kv_heads,
                n_heads
            ),
            Event::WeightsLoaded { floats, elapsed } => log::info!(
                "loaded {} weights in {:.3}ms",
                floats,
                elapsed.as_secs_f64() * 1000.0
            ),
            Event::CacheReset => log::debug!("kv cache reset"),
            Event::PromptProcessed { tokens } => log::debug!("prompt processed: {} tokens", tokens),
            Event::ForwardTimed { position, elapsed } => log::trace!(
                "[perf] model::forward pos={} {:.3}ms",
                position,
                elapsed.as_secs_f64() * 1000.0
            ),
            Event::TokenGenerated { position, token } => log::debug!("pos={} token={}", position, token),
            Event::SequenceLimitReached { seq_len } => {
                log::info!("stopped at sequence length limit {}", seq_len)
            }
            Event::GenerationFinished { generated } => log::info!("generated {} tokens", generated),
        }
    }

    fn timings_enabled(&self) -> bool {
        log::log_enabled!(log::Level::Trace)
    }
}

/// Records events in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<Event>>>,
    timings: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also request [`Event::ForwardTimed`].
    pub fn with_timings(mut self) -> Self {
        self.timings = true;
        self
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &Event) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }

    fn timings_enabled(&self) -> bool {
        self.timings
    }
}
