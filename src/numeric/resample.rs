//! Polyphase decimation/interpolation. Kept distinct from the naive
//! `upsample`/`downsample` helpers (§9 open question): the naive variants
//! insert zeros or drop samples with no anti-aliasing filter at all, for
//! callers that pre-filter themselves.

use super::filter::{lowpass_for_factor, Fir};
use crate::error::Result;

/// Low-pass then keep every `factor`-th sample. State persists across
/// `process` calls so streaming input does not glitch at block
/// boundaries.
#[derive(Clone, Debug)]
pub struct Decimator {
    fir: Fir,
    factor: usize,
    phase: usize,
}

impl Decimator {
    pub fn new(factor: usize) -> Result<Self> {
        let taps = lowpass_for_factor(factor)?;
        Ok(Decimator {
            fir: Fir::new(taps),
            factor,
            phase: 0,
        })
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn reset(&mut self) {
        self.fir.reset();
        self.phase = 0;
    }

    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let mut out = Vec::with_capacity(input.len() / self.factor + 1);
        for &x in input {
            let y = self.fir.tick(x);
            if self.phase == 0 {
                out.push(y);
            }
            self.phase = (self.phase + 1) % self.factor;
        }
        out
    }
}

/// Insert `factor - 1` zeros between samples, then low-pass (scaled by
/// `factor` to preserve amplitude after zero-stuffing).
#[derive(Clone, Debug)]
pub struct Interpolator {
    fir: Fir,
    factor: usize,
}

impl Interpolator {
    pub fn new(factor: usize) -> Result<Self> {
        let mut taps = lowpass_for_factor(factor)?;
        for tap in taps.iter_mut() {
            *tap *= factor as f32;
        }
        Ok(Interpolator {
            fir: Fir::new(taps),
            factor,
        })
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn reset(&mut self) {
        self.fir.reset();
    }

    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let mut out = Vec::with_capacity(input.len() * self.factor);
        for &x in input {
            out.push(self.fir.tick(x));
            for _ in 1..self.factor {
                out.push(self.fir.tick(0.0));
            }
        }
        out
    }
}

/// `Resample(L, M)`: an [`Interpolator`] by `l` feeding a [`Decimator`] by
/// `m`, i.e. the polyphase chain of §4.3.
#[derive(Clone, Debug)]
pub struct Resampler {
    interpolator: Interpolator,
    decimator: Decimator,
}

impl Resampler {
    pub fn new(l: usize, m: usize) -> Result<Self> {
        Ok(Resampler {
            interpolator: Interpolator::new(l)?,
            decimator: Decimator::new(m)?,
        })
    }

    pub fn reset(&mut self) {
        self.interpolator.reset();
        self.decimator.reset();
    }

    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let up = self.interpolator.process(input);
        self.decimator.process(&up)
    }
}

/// Zero-stuff by `factor` with no filtering.
pub fn upsample_naive(input: &[f32], factor: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(input.len() * factor);
    for &x in input {
        out.push(x);
        out.extend(std::iter::repeat(0.0).take(factor.saturating_sub(1)));
    }
    out
}

/// Keep every `factor`-th sample with no filtering.
pub fn downsample_naive(input: &[f32], factor: usize) -> Vec<f32> {
    input.iter().step_by(factor.max(1)).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimate_then_upsample_preserves_length_ratio() {
        let mut dec = Decimator::new(2).unwrap();
        let input = vec![1.0; 2000];
        let out = dec.process(&input);
        assert_eq!(out.len(), 1000);
    }

    #[test]
    fn decimate_of_dc_settles_near_one() {
        let mut dec = Decimator::new(4).unwrap();
        let input = vec![1.0; 4000];
        let out = dec.process(&input);
        assert!((out.last().copied().unwrap() - 1.0).abs() < 1e-2);
    }

    #[test]
    fn naive_upsample_inserts_zeros() {
        let out = upsample_naive(&[1.0, 2.0], 3);
        assert_eq!(out, vec![1.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn naive_downsample_keeps_every_nth() {
        let out = downsample_naive(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
        assert_eq!(out, vec![1.0, 4.0]);
    }
}
