use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sonograph::format::AudioFormat;
use sonograph::frame::Frame;
use sonograph::node::selfsimilarity::SelfSimilarity;
use sonograph::node::PushNode;
use sonograph::numeric::Distance;
use sonograph::transform::{ConstantQ, Fft};

fn sine(n: usize, freq_hz: f64, sample_rate: f64) -> Vec<f32> {
    (0..n)
        .map(|i| (2.0 * std::f64::consts::PI * freq_hz * i as f64 / sample_rate).sin() as f32)
        .collect()
}

fn fft_2048_bench() {
    let fft = Fft::new(2048).unwrap();
    let input = sine(2048, 440.0, 44100.0);
    black_box(fft.forward_real(&input).unwrap());
}

fn fft_non_power_of_two_bench() {
    // Exercises the Bluestein path (§4.4).
    let fft = Fft::new(2000).unwrap();
    let input = sine(2000, 440.0, 44100.0);
    black_box(fft.forward_real(&input).unwrap());
}

fn constant_q_bench() {
    let cqt = ConstantQ::new(55.0, 7040.0, 24, 44100.0, 0.0005).unwrap();
    let input = sine(cqt.fft_len(), 440.0, 44100.0);
    black_box(cqt.forward(&input).unwrap());
}

fn self_similarity_bench() {
    let format = AudioFormat::mono(44100.0);
    let mut node = SelfSimilarity::new(Distance::Cosine, 0).unwrap();
    for i in 0..200u64 {
        let v: Vec<f32> = (0..12).map(|j| ((i + j) as f32).sin()).collect();
        node.process_self(&Frame::real(format, i, v)).unwrap();
    }
    black_box(node.flush_self().unwrap());
}

fn self_similarity_banded_bench() {
    let format = AudioFormat::mono(44100.0);
    let mut node = SelfSimilarity::new(Distance::Euclidean, 31).unwrap();
    for i in 0..2000u64 {
        let v: Vec<f32> = (0..12).map(|j| ((i + j) as f32).sin()).collect();
        node.process_self(&Frame::real(format, i, v)).unwrap();
    }
    black_box(node.flush_self().unwrap());
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("fft_2048", |b| b.iter(fft_2048_bench));
    c.bench_function("fft_bluestein_2000", |b| b.iter(fft_non_power_of_two_bench));
    c.bench_function("constant_q_kernel_and_forward", |b| b.iter(constant_q_bench));
    c.bench_function("self_similarity_dense_200", |b| b.iter(self_similarity_bench));
    c.bench_function("self_similarity_banded_2000", |b| b.iter(self_similarity_banded_bench));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
