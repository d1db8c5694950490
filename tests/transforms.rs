//! Black-box checks of the transform backbone: FFT/IFFT round trips and
//! symmetry, the Bluestein non-power-of-two path, the constant-Q kernel's
//! ability to resolve a tone's frequency, and Griffin-Lim convergence.

use sonograph::transform::{ConstantQ, Dct, Fft, GriffinLim};

fn sine(n: usize, freq_hz: f64, sample_rate: f64) -> Vec<f32> {
    (0..n)
        .map(|i| (2.0 * std::f64::consts::PI * freq_hz * i as f64 / sample_rate).sin() as f32)
        .collect()
}

#[test]
fn fft_then_ifft_round_trips_for_a_power_of_two_length() {
    let fft = Fft::new(64).unwrap();
    let input = sine(64, 440.0, 8000.0);
    let (re, im) = fft.forward_real(&input).unwrap();
    let (back, _) = fft.inverse(&re, &im).unwrap();
    for (a, b) in back.iter().zip(input.iter()) {
        assert!((a - b).abs() < 1e-4, "{a} != {b}");
    }
}

#[test]
fn fft_then_ifft_round_trips_via_the_bluestein_path() {
    // §8: non-power-of-two lengths (Bluestein/chirp-Z) must round trip
    // just as exactly as the radix-2 path.
    let fft = Fft::new(100).unwrap();
    let input = sine(100, 440.0, 8000.0);
    let (re, im) = fft.forward_real(&input).unwrap();
    let (back, _) = fft.inverse(&re, &im).unwrap();
    for (a, b) in back.iter().zip(input.iter()) {
        assert!((a - b).abs() < 1e-3, "{a} != {b}");
    }
}

#[test]
fn fft_of_real_input_is_hermitian_symmetric() {
    let n = 32;
    let fft = Fft::new(n).unwrap();
    let input = sine(n, 440.0, 8000.0);
    let (re, im) = fft.forward_real(&input).unwrap();
    for k in 1..n {
        let mirror = n - k;
        assert!((re[k] - re[mirror]).abs() < 1e-4);
        assert!((im[k] + im[mirror]).abs() < 1e-4);
    }
}

#[test]
fn parsevals_theorem_holds_for_the_forward_transform() {
    let n = 64;
    let fft = Fft::new(n).unwrap();
    let input = sine(n, 440.0, 8000.0);
    let (re, im) = fft.forward_real(&input).unwrap();

    let time_energy: f64 = input.iter().map(|&x| (x as f64).powi(2)).sum();
    let freq_energy: f64 = re
        .iter()
        .zip(im.iter())
        .map(|(&r, &i)| (r as f64).powi(2) + (i as f64).powi(2))
        .sum::<f64>()
        / n as f64;
    assert!((time_energy - freq_energy).abs() / time_energy.max(1e-9) < 1e-3);
}

#[test]
fn dct_of_a_constant_signal_concentrates_in_the_dc_bin() {
    let dct = Dct::new(8).unwrap();
    let coeffs = dct.forward(&[1.0; 8]).unwrap();
    assert!((coeffs[0] - 8.0).abs() < 1e-3);
    for c in &coeffs[1..] {
        assert!(c.abs() < 1e-3);
    }
}

#[test]
fn constant_q_peak_bin_tracks_the_tone_frequency() {
    // §8 "constant-Q peak": a pure 440 Hz tone should peak in the bin
    // whose center frequency is closest to 440 Hz.
    let sample_rate = 22050.0;
    let cqt = ConstantQ::new(110.0, 1760.0, 24, sample_rate, 0.0005).unwrap();
    let input = sine(cqt.fft_len(), 440.0, sample_rate);
    let (re, im) = cqt.forward(&input).unwrap();

    let magnitudes: Vec<f32> = re.iter().zip(im.iter()).map(|(r, i)| (r * r + i * i).sqrt()).collect();
    let (peak_bin, _) = magnitudes
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .unwrap();
    let peak_freq = cqt.center_freqs_hz()[peak_bin];
    assert!((peak_freq - 440.0).abs() < 440.0 * (2f64.powf(1.0 / 24.0) - 1.0) * 2.0);
}

#[test]
fn constant_q_rejects_an_inverted_frequency_range() {
    assert!(ConstantQ::new(880.0, 440.0, 12, 44100.0, 0.0005).is_err());
}

#[test]
fn griffin_lim_reduces_spectral_error_after_iterating() {
    let n = 32;
    let fft = Fft::new(n).unwrap();
    let input = sine(n, 440.0, 8000.0);
    let (re, im) = fft.forward_real(&input).unwrap();
    let target_magnitude: Vec<f32> = re.iter().zip(im.iter()).map(|(r, i)| (r * r + i * i).sqrt()).collect();

    let gl = GriffinLim::new(50, 1e-6);
    let initial_estimate = vec![0.01f32; n];
    let reconstructed = gl.reconstruct(&target_magnitude, &initial_estimate).unwrap();

    let (re2, im2) = fft.forward_real(&reconstructed).unwrap();
    let recovered_magnitude: Vec<f32> = re2.iter().zip(im2.iter()).map(|(r, i)| (r * r + i * i).sqrt()).collect();

    let error: f32 = target_magnitude
        .iter()
        .zip(recovered_magnitude.iter())
        .map(|(a, b)| (a - b).abs())
        .sum::<f32>()
        / n as f32;
    assert!(error < 0.5, "mean magnitude error too large: {error}");
}
