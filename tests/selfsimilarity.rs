//! End-to-end checks of the self-similarity matrix and the novelty curve
//! built on top of it, driven through a `Pump` rather than by calling
//! node methods directly.

use sonograph::prelude::*;

fn fmt() -> AudioFormat {
    AudioFormat::mono(8000.0)
}

fn feature_source(vectors: Vec<Vec<f32>>) -> VecSource {
    let format = fmt();
    let frames = vectors
        .into_iter()
        .enumerate()
        .map(|(i, v)| Frame::real(format, i as u64, v))
        .collect();
    VecSource::new(format, frames)
}

#[test]
fn identity_scenario_diagonal_is_zero_everywhere() {
    // §8 "self-similarity identity": a feature that never changes has
    // zero distance to every one of its own past and future instants.
    let vectors = vec![vec![1.0, 2.0, 3.0]; 6];
    let mut pump = Pump::new(feature_source(vectors));
    let node = SelfSimilarity::new(Distance::Euclidean, 0).unwrap();
    let id = node.id().to_string();
    pump.add(Frag::leaf(Box::new(node)));

    pump.pump().unwrap();
    let results = pump.results();
    let Some(Output::Matrix(matrix)) = results.get(&id) else {
        panic!("expected a matrix output for id `{id}`");
    };
    assert_eq!(matrix.rows(), 6);
    for i in 0..6 {
        for j in 0..6 {
            assert!(matrix.get(i, j).unwrap().abs() < 1e-5);
        }
    }
}

#[test]
fn banded_matrix_matches_the_dense_matrix_inside_the_band() {
    let vectors: Vec<Vec<f32>> = (0..20).map(|i| vec![(i as f32).sin(), (i as f32).cos()]).collect();

    let mut dense_pump = Pump::new(feature_source(vectors.clone()));
    let dense_node = SelfSimilarity::new(Distance::Cosine, 0).unwrap();
    let dense_id = dense_node.id().to_string();
    dense_pump.add(Frag::leaf(Box::new(dense_node)));
    dense_pump.pump().unwrap();
    let dense_results = dense_pump.results();
    let Some(Output::Matrix(dense)) = dense_results.get(&dense_id) else {
        panic!("expected a dense matrix output");
    };

    let mut banded_pump = Pump::new(feature_source(vectors));
    let banded_node = SelfSimilarity::new(Distance::Cosine, 3).unwrap();
    let banded_id = banded_node.id().to_string();
    banded_pump.add(Frag::leaf(Box::new(banded_node)));
    banded_pump.pump().unwrap();
    let banded_results = banded_pump.results();
    let Some(Output::Matrix(banded)) = banded_results.get(&banded_id) else {
        panic!("expected a banded matrix output");
    };

    for i in 0..20usize {
        for j in i..=(i + 1).min(19) {
            assert!((dense.get(i, j).unwrap() - banded.get(i, j).unwrap()).abs() < 1e-5);
        }
    }
}

#[test]
fn even_bandwidth_is_rejected_at_construction() {
    assert!(SelfSimilarity::new(Distance::Euclidean, 4).is_err());
}

#[test]
fn novelty_curve_stays_near_zero_over_a_static_feature_stream() {
    let vectors = vec![vec![1.0, 1.0, 1.0]; 10];
    let mut pump = Pump::new(feature_source(vectors));
    // zero_pad off: the node's retrievable output reflects the last
    // window it processed, which — with no trailing synthetic silence —
    // stays entirely inside the static stream.
    let kernel = CheckerboardKernel::new(4, 2.0, true).unwrap();
    let node = Novelty::new(kernel, Distance::Cosine, false);
    let id = node.id().to_string();
    pump.add(Frag::leaf(Box::new(node)));

    pump.pump().unwrap();
    let results = pump.results();
    let Some(Output::Frame(frame)) = results.get(&id) else {
        panic!("expected a novelty output for id `{id}`");
    };
    assert!(frame.real_slice()[0].abs() < 1e-3);
}
