//! Window functions applied elementwise before a transform.

use std::f64::consts::PI;

/// A named window function, evaluated over a length-`n` buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Window {
    Rectangular,
    Hann,
    Hamming,
    Welch,
    Triangle,
}

impl Window {
    /// Coefficients for a window of length `n`.
    pub fn coefficients(self, n: usize) -> Vec<f32> {
        if n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return vec![1.0];
        }
        let denom = (n - 1) as f64;
        (0..n)
            .map(|i| self.coefficient(i, n, denom) as f32)
            .collect()
    }

    fn coefficient(self, i: usize, n: usize, denom: f64) -> f64 {
        let t = i as f64 / denom;
        match self {
            Window::Rectangular => 1.0,
            Window::Hann => 0.5 - 0.5 * (2.0 * PI * t).cos(),
            Window::Hamming => 0.54 - 0.46 * (2.0 * PI * t).cos(),
            Window::Welch => {
                let x = (i as f64 - denom / 2.0) / (denom / 2.0);
                1.0 - x * x
            }
            Window::Triangle => {
                let m = (n - 1) as f64;
                1.0 - ((i as f64 - m / 2.0).abs() / (m / 2.0 + 1.0))
            }
        }
    }

    /// Apply this window in place to `data`. `data.len()` determines the
    /// window length.
    pub fn apply(self, data: &mut [f32]) {
        let coeffs = self.coefficients(data.len());
        for (x, w) in data.iter_mut().zip(coeffs.iter()) {
            *x *= w;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_is_zero_at_the_edges() {
        let w = Window::Hann.coefficients(8);
        assert!(w[0].abs() < 1e-6);
        assert!(w[7].abs() < 1e-6);
    }

    #[test]
    fn hamming_matches_known_endpoint_value() {
        let w = Window::Hamming.coefficients(5);
        // Hamming window's endpoint value is 0.54 - 0.46 = 0.08.
        assert!((w[0] - 0.08).abs() < 1e-4);
    }

    #[test]
    fn rectangular_is_all_ones() {
        let w = Window::Rectangular.coefficients(10);
        assert!(w.iter().all(|&v| v == 1.0));
    }
}
