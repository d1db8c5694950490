//! Forward and inverse FFT: Cooley-Tukey radix-2 for power-of-two
//! lengths, Bluestein's chirp-Z transform otherwise. Mono input only;
//! multichannel rejection is the caller's responsibility (the
//! [`crate::node::transform`] wrappers check `AudioFormat::channels`).

use crate::error::{Error, Result};
use num_complex::Complex64;
use std::f64::consts::PI;

/// A forward/inverse FFT of a fixed length `n`, chosen at construction,
/// deduced from the first buffer seen, or deduced from a required
/// frequency resolution.
#[derive(Clone, Copy, Debug)]
pub struct Fft {
    n: usize,
}

impl Fft {
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::configuration("FFT length must be nonzero"));
        }
        Ok(Fft { n })
    }

    /// `N = ceil(sample_rate / resolution_hz)`.
    pub fn for_resolution(sample_rate: f64, resolution_hz: f64) -> Result<Self> {
        if resolution_hz <= 0.0 {
            return Err(Error::configuration("FFT resolution must be positive"));
        }
        Fft::new((sample_rate / resolution_hz).ceil() as usize)
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Forward transform of a real time-domain signal, zero-padded at the
    /// tail to length `n`. `input.len() > n` is a configuration error.
    pub fn forward_real(&self, input: &[f32]) -> Result<(Vec<f32>, Vec<f32>)> {
        if input.len() > self.n {
            return Err(Error::configuration(format!(
                "FFT input length {} exceeds transform length {}",
                input.len(),
                self.n
            )));
        }
        let mut buf: Vec<Complex64> = input.iter().map(|&x| Complex64::new(x as f64, 0.0)).collect();
        buf.resize(self.n, Complex64::new(0.0, 0.0));
        let out = forward(&buf);
        Ok(split(&out))
    }

    /// Forward transform of a complex time-domain pair, zero-padded at
    /// the tail to length `n`.
    pub fn forward_complex(&self, real: &[f32], imag: &[f32]) -> Result<(Vec<f32>, Vec<f32>)> {
        if real.len() != imag.len() {
            return Err(Error::invariant("real/imaginary length mismatch"));
        }
        if real.len() > self.n {
            return Err(Error::configuration(format!(
                "FFT input length {} exceeds transform length {}",
                real.len(),
                self.n
            )));
        }
        let mut buf: Vec<Complex64> = real
            .iter()
            .zip(imag.iter())
            .map(|(&re, &im)| Complex64::new(re as f64, im as f64))
            .collect();
        buf.resize(self.n, Complex64::new(0.0, 0.0));
        let out = forward(&buf);
        Ok(split(&out))
    }

    /// Inverse transform: the forward kernel with conjugation and `1/n`
    /// scaling.
    pub fn inverse(&self, real: &[f32], imag: &[f32]) -> Result<(Vec<f32>, Vec<f32>)> {
        if real.len() != self.n || imag.len() != self.n {
            return Err(Error::configuration(format!(
                "IFFT input must have length {}",
                self.n
            )));
        }
        let buf: Vec<Complex64> = real
            .iter()
            .zip(imag.iter())
            .map(|(&re, &im)| Complex64::new(re as f64, im as f64))
            .collect();
        let out = inverse(&buf);
        Ok(split(&out))
    }
}

fn split(data: &[Complex64]) -> (Vec<f32>, Vec<f32>) {
    (
        data.iter().map(|c| c.re as f32).collect(),
        data.iter().map(|c| c.im as f32).collect(),
    )
}

/// Forward DFT of arbitrary length, dispatching to radix-2 or Bluestein.
pub(crate) fn forward(data: &[Complex64]) -> Vec<Complex64> {
    let n = data.len();
    if n <= 1 {
        return data.to_vec();
    }
    if n.is_power_of_two() {
        let mut buf = data.to_vec();
        fft_radix2_inplace(&mut buf);
        buf
    } else {
        fft_bluestein(data)
    }
}

/// Inverse DFT: conjugate, forward transform, conjugate, scale by `1/n`.
pub(crate) fn inverse(data: &[Complex64]) -> Vec<Complex64> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    let conjugated: Vec<Complex64> = data.iter().map(|c| c.conj()).collect();
    let transformed = forward(&conjugated);
    let scale = 1.0 / n as f64;
    transformed.iter().map(|c| c.conj() * scale).collect()
}

/// Iterative Cooley-Tukey radix-2, in place. `data.len()` must be a power
/// of two.
pub(crate) fn fft_radix2_inplace(data: &mut [Complex64]) {
    let n = data.len();
    if n <= 1 {
        return;
    }
    debug_assert!(n.is_power_of_two());
    bit_reverse_permute(data);

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let angle = -2.0 * PI / len as f64;
        let wlen = Complex64::new(angle.cos(), angle.sin());
        let mut start = 0;
        while start < n {
            let mut w = Complex64::new(1.0, 0.0);
            for j in 0..half {
                let u = data[start + j];
                let v = data[start + j + half] * w;
                data[start + j] = u + v;
                data[start + j + half] = u - v;
                w *= wlen;
            }
            start += len;
        }
        len <<= 1;
    }
}

fn bit_reverse_permute(data: &mut [Complex64]) {
    let n = data.len();
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;
        if i < j {
            data.swap(i, j);
        }
    }
}

/// Bluestein's chirp-Z transform: rewrites an arbitrary-length DFT as a
/// convolution, which is computed with a power-of-two radix-2 FFT.
fn fft_bluestein(data: &[Complex64]) -> Vec<Complex64> {
    let n = data.len();
    let m = (2 * n - 1).next_power_of_two();

    // `w[k] = exp(-i*pi*k^2/n)`; `k^2 mod 2n` keeps the angle numerically
    // stable for large `k`, since the chirp only depends on `k^2` modulo
    // `2n`.
    let chirp = |k: usize| -> Complex64 {
        let k2_mod = (k * k) % (2 * n);
        let angle = PI * k2_mod as f64 / n as f64;
        Complex64::new(angle.cos(), -angle.sin())
    };
    let w: Vec<Complex64> = (0..n).map(chirp).collect();

    let mut a = vec![Complex64::new(0.0, 0.0); m];
    for k in 0..n {
        a[k] = data[k] * w[k];
    }
    let mut b = vec![Complex64::new(0.0, 0.0); m];
    b[0] = w[0].conj();
    for k in 1..n {
        let c = w[k].conj();
        b[k] = c;
        b[m - k] = c;
    }

    fft_radix2_inplace(&mut a);
    fft_radix2_inplace(&mut b);
    let mut conv: Vec<Complex64> = a.iter().zip(b.iter()).map(|(x, y)| x * y).collect();
    let conv = {
        // Inverse FFT of the pointwise product, radix-2 since `m` is a
        // power of two by construction.
        for c in conv.iter_mut() {
            *c = c.conj();
        }
        fft_radix2_inplace(&mut conv);
        let scale = 1.0 / m as f64;
        conv.iter().map(|c| c.conj() * scale).collect::<Vec<_>>()
    };

    (0..n).map(|k| conv[k] * w[k]).collect()
}
