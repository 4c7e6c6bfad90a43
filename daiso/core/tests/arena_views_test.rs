//! Weight-arena views feeding the free tensor functions.

use daiso_core::{matmul, softmax, ErrorKind, Tensor, WeightArena};

#[test]
fn views_carved_in_order_feed_matmul() {
    let data: Vec<f32> = (1..=10).map(|v| v as f32).collect();
    let mut arena = WeightArena::new(data);
    let a = arena.take([2, 2]).unwrap();
    let b = arena.take([2, 3]).unwrap();
    assert!(a.is_view() && b.is_view());
    assert_eq!(arena.remaining(), 0);
    arena.finish().unwrap();

    // a = [[1,2],[3,4]], b = [[5,6,7],[8,9,10]]
    let mut out = Tensor::new([2, 3]).unwrap();
    matmul(&mut out, &a, &b).unwrap();
    assert_eq!(out.data(), &[21.0, 24.0, 27.0, 47.0, 54.0, 61.0]);
}

#[test]
fn writing_a_view_leaves_the_arena_untouched() {
    let mut arena = WeightArena::new(vec![1.0f32; 4]);
    let mut first = arena.take([2]).unwrap();
    let second = arena.take([2]).unwrap();
    first.data_mut()[0] = 9.0;
    assert!(!first.is_view());
    assert_eq!(first.data(), &[9.0, 1.0]);
    assert_eq!(second.data(), &[1.0, 1.0]);
}

#[test]
fn taking_past_the_end_is_a_range_error() {
    let mut arena = WeightArena::new(vec![0.0f32; 3]);
    let err = arena.take([2, 2]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
}

#[test]
fn unconsumed_arena_fails_to_finish() {
    let mut arena = WeightArena::new(vec![0.0f32; 5]);
    arena.take([4]).unwrap();
    assert!(arena.finish().is_err());
}

#[test]
fn softmax_rows_of_a_view() {
    let mut arena = WeightArena::new(vec![0.0f32, 1.0, 2.0, 100.0, 101.0, 102.0]);
    let logits = arena.take([2, 3]).unwrap();
    let mut probs = Tensor::new([2, 3]).unwrap();
    softmax(&mut probs, &logits).unwrap();
    let (r0, r1) = probs.data().split_at(3);
    for (x, y) in r0.iter().zip(r1) {
        assert!((x - y).abs() < 1e-6);
    }
    assert!((r0.iter().sum::<f32>() - 1.0).abs() < 1e-6);
}
