//! DCT-II, implemented via a `2N`-point FFT of an even-symmetric
//! extension with a pre/post twiddle, rather than a direct `O(N^2)` sum.

use super::fft::forward;
use crate::error::{Error, Result};
use num_complex::Complex64;
use std::f64::consts::PI;

#[derive(Clone, Copy, Debug)]
pub struct Dct {
    n: usize,
}

impl Dct {
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::configuration("DCT length must be nonzero"));
        }
        Ok(Dct { n })
    }

    pub fn for_resolution(sample_rate: f64, resolution_hz: f64) -> Result<Self> {
        if resolution_hz <= 0.0 {
            return Err(Error::configuration("DCT resolution must be positive"));
        }
        Dct::new((sample_rate / resolution_hz).ceil() as usize)
    }

    pub fn size(&self) -> usize {
        self.n
    }

    /// Forward DCT-II, `input` zero-padded at the tail to length `n`.
    pub fn forward(&self, input: &[f32]) -> Result<Vec<f32>> {
        let n = self.n;
        if input.len() > n {
            return Err(Error::configuration(format!(
                "DCT input length {} exceeds transform length {n}",
                input.len()
            )));
        }
        let mut x = input.to_vec();
        x.resize(n, 0.0);

        // Even-symmetric extension to length 2n: v[i] = x[i] for i < n,
        // v[i] = x[2n - i - 1] for n <= i < 2n.
        let mut v = vec![Complex64::new(0.0, 0.0); 2 * n];
        for i in 0..n {
            v[i] = Complex64::new(x[i] as f64, 0.0);
            v[2 * n - 1 - i] = Complex64::new(x[i] as f64, 0.0);
        }

        let y = forward(&v);
        let out = (0..n)
            .map(|k| {
                let angle = -PI * k as f64 / (2.0 * n as f64);
                let twiddle = Complex64::new(angle.cos(), angle.sin());
                (y[k] * twiddle).re as f32
            })
            .collect();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Direct `O(N^2)` DCT-II, used only to check the FFT-based
    /// implementation against its definition.
    fn direct_dct(x: &[f32]) -> Vec<f32> {
        let n = x.len();
        (0..n)
            .map(|k| {
                let mut acc = 0.0f64;
                for (i, &xi) in x.iter().enumerate() {
                    acc += xi as f64 * (PI * (2 * i + 1) as f64 * k as f64 / (2.0 * n as f64)).cos();
                }
                acc as f32
            })
            .collect()
    }

    #[test]
    fn matches_direct_definition() {
        let x = [1.0f32, 2.0, -1.0, 0.5, 3.0, -2.0];
        let dct = Dct::new(x.len()).unwrap();
        let fast = dct.forward(&x).unwrap();
        let direct = direct_dct(&x);
        for i in 0..x.len() {
            assert!((fast[i] - direct[i]).abs() < 1e-3, "index {i}: {} vs {}", fast[i], direct[i]);
        }
    }

    #[test]
    fn dc_component_is_the_sum() {
        let x = [1.0f32, 1.0, 1.0, 1.0];
        let dct = Dct::new(4).unwrap();
        let out = dct.forward(&x).unwrap();
        assert!((out[0] - 4.0).abs() < 1e-3);
    }
}
