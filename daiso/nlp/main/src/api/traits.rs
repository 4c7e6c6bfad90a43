//! Collaborator contracts at the boundary of the engine

use crate::api::error::NlpResult;
use crate::api::types::Event;

/// Picks the next token from a logits vector.
///
/// Called exactly once per generation step with the freshest logits. An
/// implementation must return an ID in `0..logits.len()`.
pub trait Sampler {
    fn sample(&mut self, logits: &[f32]) -> u32;
}

/// Common tokenizer interface.
pub trait Tokenizer {
    /// Encode text to token IDs.
    fn encode(&self, text: &str) -> NlpResult<Vec<u32>>;
    /// Decode token IDs to text.
    fn decode(&self, tokens: &[u32]) -> NlpResult<String>;
    /// Vocabulary size.
    fn vocab_size(&self) -> usize;
}

/// Receives structured events from a [`Model`](crate::Model).
///
/// The model owns its sink; nothing in the engine writes to process-wide
/// state on its own.
pub trait EventSink: Send {
    fn emit(&self, event: &Event);

    /// Whether the sink wants [`Event::ForwardTimed`]. Timing is skipped otherwise.
    fn timings_enabled(&self) -> bool {
        false
    }
}
