pub mod events;
pub mod format;
pub mod model;
pub mod sampler;
pub mod sampling;
pub mod tokenizer;
pub mod weights;
