//! FIR and IIR filters, plus the low-pass coefficient tables
//! [`crate::node::resample`] selects by integer factor.

use crate::error::{Error, Result};

/// A direct-form FIR filter with persistent state, so streaming input can
/// be fed chunk by chunk without discontinuities at chunk boundaries.
#[derive(Clone, Debug)]
pub struct Fir {
    taps: Vec<f32>,
    history: Vec<f32>,
}

impl Fir {
    pub fn new(taps: Vec<f32>) -> Self {
        let history = vec![0.0; taps.len()];
        Fir { taps, history }
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|x| *x = 0.0);
    }

    /// Filter one sample, shifting it into the history buffer.
    pub fn tick(&mut self, input: f32) -> f32 {
        self.history.rotate_right(1);
        self.history[0] = input;
        self.taps
            .iter()
            .zip(self.history.iter())
            .map(|(tap, x)| tap * x)
            .sum()
    }

    /// Filter a block of samples, preserving history across calls.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.tick(*x);
        }
    }
}

/// A direct-form II biquad (second-order IIR section).
#[derive(Clone, Copy, Debug, Default)]
pub struct Biquad {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
    w1: f32,
    w2: f32,
}

impl Biquad {
    pub fn new(b0: f32, b1: f32, b2: f32, a1: f32, a2: f32) -> Self {
        Biquad {
            b0,
            b1,
            b2,
            a1,
            a2,
            w1: 0.0,
            w2: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.w1 = 0.0;
        self.w2 = 0.0;
    }

    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        let w0 = input - self.a1 * self.w1 - self.a2 * self.w2;
        let output = self.b0 * w0 + self.b1 * self.w1 + self.b2 * self.w2;
        self.w2 = self.w1;
        self.w1 = w0;
        output
    }
}

/// Windowed-sinc low-pass FIR design, used to build the decimation /
/// interpolation coefficient tables.
pub fn design_lowpass(cutoff: f32, taps: usize) -> Vec<f32> {
    use crate::numeric::window::Window;
    use std::f64::consts::PI;

    let m = (taps - 1) as f64;
    let fc = cutoff as f64;
    let mut coeffs: Vec<f64> = (0..taps)
        .map(|i| {
            let k = i as f64 - m / 2.0;
            if k == 0.0 {
                2.0 * fc
            } else {
                (2.0 * PI * fc * k).sin() / (PI * k)
            }
        })
        .collect();
    let window = Window::Hamming.coefficients(taps);
    for (c, w) in coeffs.iter_mut().zip(window.iter()) {
        *c *= *w as f64;
    }
    let sum: f64 = coeffs.iter().sum();
    coeffs.iter().map(|c| (c / sum) as f32).collect()
}

/// Coefficient table keyed by an integer decimation/interpolation factor,
/// selected on first input. Unsupported factors are a configuration
/// error, not a panic (§4.3).
pub fn lowpass_for_factor(factor: usize) -> Result<Vec<f32>> {
    // Supported factors, matching the common power-of-small-prime
    // resampling ratios MIR front ends need (2, 3, 4, 5, 6, 8, 10, 12).
    const SUPPORTED: &[usize] = &[2, 3, 4, 5, 6, 8, 10, 12];
    if !SUPPORTED.contains(&factor) {
        return Err(Error::configuration(format!(
            "unsupported resampling factor {factor}, supported factors are {SUPPORTED:?}"
        )));
    }
    // Cutoff at the Nyquist rate of the slower side, with a fixed
    // tap count proportional to the factor for a reasonably sharp
    // transition band without becoming unreasonably expensive.
    let cutoff = 0.5 / factor as f32;
    let taps = (16 * factor) | 1; // force an odd tap count for linear phase
    Ok(design_lowpass(cutoff, taps))
}
