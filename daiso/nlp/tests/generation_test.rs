//! Incremental decoding, generation limits and sampling through a full model.

mod common;

use common::{assert_f32_near, small_config, tiny_config};
use daiso_nlp::{
    ErrorKind, Event, GenerationConfig, GreedySampler, MemorySink, Model, ModelWeights, NlpError,
    NullSink, Sampler,
};

fn random_model(config: daiso_nlp::ModelConfig, seed: u64) -> Model {
    Model::from_weights(ModelWeights::random(config, seed).unwrap(), Box::new(NullSink)).unwrap()
}

/// Always returns the same ID.
struct Fixed(u32);

impl Sampler for Fixed {
    fn sample(&mut self, _logits: &[f32]) -> u32 {
        self.0
    }
}

#[test]
fn incremental_forward_matches_sequence_path() {
    let mut model = random_model(small_config(), 3);
    let tokens = [17u32, 250, 3, 3, 99, 0, 42, 299];

    let batch = model.forward_sequence(&tokens).unwrap();
    assert_eq!(batch.shape(), &[tokens.len(), 300]);

    for (pos, &tok) in tokens.iter().enumerate() {
        let logits = model.forward(tok, pos).unwrap();
        assert_f32_near(logits.data(), batch.row(pos).unwrap(), 1e-4);
    }
}

#[test]
fn generation_stops_at_sequence_length() {
    let mut model = random_model(tiny_config(), 1);
    let sink = MemorySink::new();
    let mut model_with_sink =
        Model::from_weights(ModelWeights::random(tiny_config(), 1).unwrap(), Box::new(sink.clone())).unwrap();

    let out = model.generate(&[2], 100, &mut GreedySampler).unwrap();
    // Positions 0..4 each yield one token.
    assert_eq!(out.len(), 1 + 4);
    assert_eq!(out[0], 2);

    let out = model.generate(&[2, 5, 7], 100, &mut GreedySampler).unwrap();
    assert_eq!(out.len(), 3 + 2);

    model_with_sink.generate(&[], 100, &mut GreedySampler).unwrap();
    let events = sink.events();
    assert!(events.contains(&Event::SequenceLimitReached { seq_len: 4 }));
    assert!(events.contains(&Event::GenerationFinished { generated: 4 }));
}

#[test]
fn fewer_steps_than_room_generates_exactly_steps() {
    let mut model = random_model(tiny_config(), 1);
    let out = model.generate(&[1], 2, &mut GreedySampler).unwrap();
    assert_eq!(out.len(), 3);
    assert_eq!(model.generate(&[1], 0, &mut GreedySampler).unwrap(), vec![1]);
}

#[test]
fn greedy_generation_follows_argmax_of_forward() {
    let mut model = random_model(small_config(), 8);
    let out = model.generate(&[10, 20], 4, &mut GreedySampler).unwrap();

    let mut check = random_model(small_config(), 8);
    check.forward(10, 0).unwrap();
    let mut next = 20;
    for (i, &tok) in out[2..].iter().enumerate() {
        let logits = check.forward(next, 1 + i).unwrap();
        assert_eq!(tok, daiso_nlp::argmax(logits.data()));
        next = tok;
    }
}

#[test]
fn prompt_longer_than_sequence_is_a_range_error() {
    let mut model = random_model(tiny_config(), 1);
    let err = model.generate(&[1, 2, 3, 4, 5], 1, &mut GreedySampler).unwrap_err();
    assert!(matches!(err, NlpError::PromptTooLong { len: 5, seq_len: 4 }));
    assert_eq!(err.kind(), ErrorKind::Range);
}

#[test]
fn out_of_vocab_tokens_abort_generation() {
    let mut model = random_model(tiny_config(), 1);
    let err = model.generate(&[10], 1, &mut GreedySampler).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);

    let err = model.generate(&[1], 3, &mut Fixed(10)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
}

#[test]
fn seeded_sampling_is_reproducible() {
    let config = GenerationConfig {
        temperature: 0.9,
        top_k: Some(40),
        top_p: 0.95,
        seed: 1234,
        ..GenerationConfig::default()
    };
    let mut model = random_model(small_config(), 5);
    let a = model.generate(&[1, 2, 3], 6, config.build_sampler().unwrap().as_mut()).unwrap();
    let b = model.generate(&[1, 2, 3], 6, config.build_sampler().unwrap().as_mut()).unwrap();
    assert_eq!(a, b);
    assert!(a.iter().all(|&t| (t as usize) < 300));
}

#[test]
fn generation_events_track_each_token() {
    let sink = MemorySink::new().with_timings();
    let mut model =
        Model::from_weights(ModelWeights::random(small_config(), 2).unwrap(), Box::new(sink.clone())).unwrap();
    sink.clear();

    let out = model.generate(&[4, 5], 3, &mut GreedySampler).unwrap();
    let events = sink.events();
    assert_eq!(events[0], Event::CacheReset);
    assert_eq!(events.iter().filter(|e| matches!(e, Event::ForwardTimed { .. })).count(), 4);

    let generated: Vec<(usize, u32)> = events
        .iter()
        .filter_map(|e| match e {
            Event::TokenGenerated { position, token } => Some((*position, *token)),
            _ => None,
        })
        .collect();
    assert_eq!(generated, vec![(1, out[2]), (2, out[3]), (3, out[4])]);
    assert_eq!(events.last(), Some(&Event::GenerationFinished { generated: 3 }));
}
