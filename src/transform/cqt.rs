//! Constant-Q transform via the Brown-Puckette sparse spectral kernel:
//! build a bank of complex Hamming-windowed exponential kernels, take
//! their spectra, threshold away negligible entries, and apply the
//! resulting sparse matrix to an input spectrum instead of running one
//! narrowband filter per bin.

use super::fft::Fft;
use crate::error::{Error, Result};
use crate::numeric::window::Window;
use num_complex::Complex64;
use std::f64::consts::PI;

#[derive(Clone, Debug)]
pub struct ConstantQ {
    fmin: f64,
    fmax: f64,
    bins_per_octave: usize,
    sample_rate: f64,
    threshold: f32,
    center_freqs_hz: Vec<f64>,
    fft: Fft,
    // `kernel_rows[k]` is the sparse list of `(fft_bin, coefficient)`
    // pairs contributing to constant-Q bin `k`. Coefficients are already
    // conjugated, so forward application is a plain dot product against
    // the input's FFT.
    kernel_rows: Vec<Vec<(usize, Complex64)>>,
}

impl ConstantQ {
    pub fn new(
        fmin: f64,
        fmax: f64,
        bins_per_octave: usize,
        sample_rate: f64,
        threshold: f32,
    ) -> Result<Self> {
        if fmin <= 0.0 || fmax <= fmin {
            return Err(Error::configuration("constant-Q requires 0 < fmin < fmax"));
        }
        if bins_per_octave == 0 {
            return Err(Error::configuration("constant-Q bins_per_octave must be nonzero"));
        }

        let q = 1.0 / (2f64.powf(1.0 / bins_per_octave as f64) - 1.0);
        let k = (bins_per_octave as f64 * (fmax / fmin).log2()).ceil() as usize;
        if k == 0 {
            return Err(Error::configuration("constant-Q range yields zero bins"));
        }

        let mut center_freqs_hz = Vec::with_capacity(k);
        let mut window_lengths = Vec::with_capacity(k);
        for bin in 0..k {
            let f = fmin * 2f64.powf(bin as f64 / bins_per_octave as f64);
            let n_k = ((q * sample_rate / f).ceil() as usize).max(1);
            center_freqs_hz.push(f);
            window_lengths.push(n_k);
        }

        let max_n = *window_lengths.iter().max().unwrap_or(&1);
        let fft_len = max_n.next_power_of_two().max(2);
        let fft = Fft::new(fft_len)?;

        let mut kernel_rows = Vec::with_capacity(k);
        for bin in 0..k {
            let n_k = window_lengths[bin];
            let hamming = Window::Hamming.coefficients(n_k);
            let start = (fft_len - n_k) / 2;
            let mut real = vec![0.0f32; fft_len];
            let mut imag = vec![0.0f32; fft_len];
            for n in 0..n_k {
                let phase = 2.0 * PI * q * n as f64 / n_k as f64;
                let w = hamming[n] as f64 / n_k as f64;
                real[start + n] = (w * phase.cos()) as f32;
                imag[start + n] = (w * phase.sin()) as f32;
            }
            let (spec_re, spec_im) = fft.forward_complex(&real, &imag)?;
            let max_mag = spec_re
                .iter()
                .zip(spec_im.iter())
                .map(|(r, i)| (r * r + i * i).sqrt())
                .fold(0.0f32, f32::max);

            let mut row = Vec::new();
            if max_mag > 0.0 {
                for j in 0..fft_len {
                    let mag = (spec_re[j] * spec_re[j] + spec_im[j] * spec_im[j]).sqrt();
                    if mag / max_mag >= threshold {
                        row.push((j, Complex64::new(spec_re[j] as f64, -spec_im[j] as f64)));
                    }
                }
            }
            kernel_rows.push(row);
        }

        Ok(ConstantQ {
            fmin,
            fmax,
            bins_per_octave,
            sample_rate,
            threshold,
            center_freqs_hz,
            fft,
            kernel_rows,
        })
    }

    pub fn bins(&self) -> usize {
        self.kernel_rows.len()
    }

    pub fn center_freqs_hz(&self) -> &[f64] {
        &self.center_freqs_hz
    }

    pub fn fft_len(&self) -> usize {
        self.fft.size()
    }

    pub fn fmin(&self) -> f64 {
        self.fmin
    }

    pub fn fmax(&self) -> f64 {
        self.fmax
    }

    pub fn bins_per_octave(&self) -> usize {
        self.bins_per_octave
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// The constant Q factor shared by every bin: `1 / (2^(1/bins_per_octave) - 1)`.
    pub fn q(&self) -> f64 {
        1.0 / (2f64.powf(1.0 / self.bins_per_octave as f64) - 1.0)
    }

    /// Apply the kernel to one time-domain frame, producing `K` complex
    /// constant-Q bins.
    pub fn forward(&self, input: &[f32]) -> Result<(Vec<f32>, Vec<f32>)> {
        let (spec_re, spec_im) = self.fft.forward_real(input)?;
        let mut out_re = vec![0.0f32; self.kernel_rows.len()];
        let mut out_im = vec![0.0f32; self.kernel_rows.len()];
        for (bin, row) in self.kernel_rows.iter().enumerate() {
            let mut acc = Complex64::new(0.0, 0.0);
            for &(j, coeff) in row {
                acc += coeff * Complex64::new(spec_re[j] as f64, spec_im[j] as f64);
            }
            out_re[bin] = acc.re as f32;
            out_im[bin] = acc.im as f32;
        }
        Ok((out_re, out_im))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::peak::argmax;
    use std::f64::consts::PI as PI64;

    #[test]
    fn pure_tone_peaks_at_expected_bin() {
        // §8 scenario 6: sine at 440 Hz with fmin=440, fmax=880,
        // bins_per_octave=12 peaks at bin 0.
        let sample_rate = 16_000.0;
        let cq = ConstantQ::new(440.0, 880.0, 12, sample_rate, 0.0005).unwrap();
        let n = cq.fft_len();
        let signal: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI64 * 440.0 * i as f64 / sample_rate).sin() as f32)
            .collect();
        let (re, im) = cq.forward(&signal).unwrap();
        let mags: Vec<f32> = re
            .iter()
            .zip(im.iter())
            .map(|(r, i)| (r * r + i * i).sqrt())
            .collect();
        assert_eq!(argmax(&mags), Some(0));
    }

    #[test]
    fn argmax_bin_matches_log2_formula() {
        let sample_rate = 16_000.0;
        let fmin = 220.0;
        let bins_per_octave = 12usize;
        let cq = ConstantQ::new(fmin, 880.0, bins_per_octave, sample_rate, 0.0005).unwrap();
        let f = 440.0; // one octave above fmin
        let n = cq.fft_len();
        let signal: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI64 * f * i as f64 / sample_rate).sin() as f32)
            .collect();
        let (re, im) = cq.forward(&signal).unwrap();
        let mags: Vec<f32> = re
            .iter()
            .zip(im.iter())
            .map(|(r, i)| (r * r + i * i).sqrt())
            .collect();
        let expected = (bins_per_octave as f64 * (f / fmin).log2()).round() as usize;
        assert_eq!(argmax(&mags), Some(expected));
    }

    #[test]
    fn rejects_invalid_range() {
        let err = ConstantQ::new(880.0, 440.0, 12, 16_000.0, 0.0005).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
