use criterion::{black_box, criterion_group, criterion_main, Criterion};
use daiso_nlp::{Model, ModelConfig, ModelWeights, NullSink};

fn bench_forward_step(c: &mut Criterion) {
    let config = ModelConfig {
        seq_len: 64,
        ..ModelConfig::dummy()
    };
    let weights = ModelWeights::random(config, 0).unwrap();
    let mut model = Model::from_weights(weights, Box::new(NullSink)).unwrap();

    let mut group = c.benchmark_group("forward");
    group.sample_size(20);
    group.bench_function("dummy_288d_full_context", |b| {
        b.iter(|| {
            model.reset();
            for pos in 0..config.seq_len {
                let logits = model.forward(black_box(7), pos).unwrap();
                black_box(logits.data()[0]);
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_forward_step);
criterion_main!(benches);
