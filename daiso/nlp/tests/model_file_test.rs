//! Loading model files from disk and memory.

mod common;

use common::tiny_config;
use daiso_nlp::{
    ErrorKind, MemorySink, Model, ModelConfig, ModelHeader, ModelWeights, NlpError, NullSink, Event,
    HEADER_SIZE,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn zero_weights_produce_zero_logits() {
    let bytes = ModelWeights::zeros(tiny_config()).unwrap().to_bytes().unwrap();
    let file = write_temp(&bytes);

    let mut model = Model::load(file.path(), Box::new(NullSink)).unwrap();
    assert_eq!(model.config(), &tiny_config());
    let logits = model.forward(0, 0).unwrap();
    assert_eq!(logits.shape(), &[10]);
    assert!(logits.data().iter().all(|&v| v == 0.0));
}

#[test]
fn bad_magic_is_a_format_error_and_loads_no_weights() {
    let mut bytes = ModelWeights::zeros(tiny_config()).unwrap().to_bytes().unwrap();
    bytes[..4].copy_from_slice(&0xdead_beefu32.to_le_bytes());

    let sink = MemorySink::new();
    let err = Model::from_bytes(&bytes, Box::new(sink.clone())).unwrap_err();
    assert!(matches!(err, NlpError::BadMagic { found: 0xdead_beef, .. }));
    assert_eq!(err.kind(), ErrorKind::Format);

    let events = sink.events();
    assert!(events.iter().all(|e| !matches!(e, Event::HeaderDecoded { .. } | Event::WeightsLoaded { .. })));
}

#[test]
fn bad_version_is_a_format_error() {
    let mut bytes = ModelWeights::zeros(tiny_config()).unwrap().to_bytes().unwrap();
    bytes[4..8].copy_from_slice(&7i32.to_le_bytes());
    let err = Model::from_bytes(&bytes, Box::new(NullSink)).unwrap_err();
    assert!(matches!(err, NlpError::UnsupportedVersion { found: 7, .. }));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn truncated_and_oversized_payloads_are_rejected() {
    let bytes = ModelWeights::zeros(tiny_config()).unwrap().to_bytes().unwrap();

    let short = write_temp(&bytes[..bytes.len() - 4]);
    let err = Model::load(short.path(), Box::new(NullSink)).unwrap_err();
    assert!(matches!(err, NlpError::Truncated { .. }));
    assert_eq!(err.kind(), ErrorKind::Format);

    let mut long = bytes.clone();
    long.extend_from_slice(&[0u8; 8]);
    let err = Model::from_bytes(&long, Box::new(NullSink)).unwrap_err();
    assert!(matches!(err, NlpError::TrailingBytes { extra: 8, .. }));

    let header_only = write_temp(&bytes[..HEADER_SIZE - 1]);
    let err = Model::load(header_only.path(), Box::new(NullSink)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn missing_file_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Model::load(dir.path().join("absent.bin"), Box::new(NullSink)).unwrap_err();
    assert!(matches!(err, NlpError::Open { .. }));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn indivisible_head_count_is_rejected() {
    let config = ModelConfig { n_heads: 3, ..tiny_config() };
    let mut bytes = ModelHeader::new(tiny_config()).encode().unwrap().to_vec();
    bytes[20..24].copy_from_slice(&(config.n_heads as i32).to_le_bytes());
    let err = ModelHeader::decode(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn saved_file_loads_identically_to_memory() {
    let weights = ModelWeights::random(tiny_config(), 99).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    weights.save(&path).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), weights.to_bytes().unwrap());

    let mut from_disk = Model::load(&path, Box::new(NullSink)).unwrap();
    let mut from_memory = Model::from_weights(weights, Box::new(NullSink)).unwrap();
    for (pos, tok) in [4u32, 1, 9].into_iter().enumerate() {
        let a = from_disk.forward(tok, pos).unwrap().to_vec();
        let b = from_memory.forward(tok, pos).unwrap().to_vec();
        assert_eq!(a, b);
    }
}

#[test]
fn load_emits_events_in_order() {
    let sink = MemorySink::new();
    let bytes = ModelWeights::zeros(tiny_config()).unwrap().to_bytes().unwrap();
    Model::from_bytes(&bytes, Box::new(sink.clone())).unwrap();

    let events = sink.events();
    assert!(matches!(events[0], Event::LoadStarted { .. }));
    assert_eq!(events[1], Event::HeaderDecoded { config: tiny_config() });
    assert!(matches!(
        events[2],
        Event::WeightsLoaded { floats, .. } if floats == tiny_config().weight_count().unwrap()
    ));
    assert_eq!(events.len(), 3);
}
