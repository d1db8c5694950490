//! Novelty curve (§4.6): a rolling `K x K` self-similarity matrix
//! correlated against a Gaussian checkerboard kernel, one scalar per
//! advance.
//!
//! The kernel is centered, so a novelty value for position `t` needs
//! `half = K/2` buffered neighbors on both sides of `t`. Without
//! zero-padding those neighbors genuinely do not exist yet for the first
//! `half` inputs (their right-hand context has not arrived) and never
//! will for the last `half` (the stream ends before it arrives), so both
//! ends are suppressed. With zero-padding, missing neighbors at either
//! edge are synthesized as zero vectors instead: `half` zero entries are
//! pushed before the first real one, and `half` more are pushed at
//! `flush` to drain the trailing centers.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::{Error, Result};
use crate::format::AudioFormat;
use crate::frame::Frame;
use crate::numeric::aggregate::euclidean_norm;
use crate::numeric::Distance;
use std::collections::VecDeque;

/// A Gaussian-tapered checkerboard kernel of even `size`, optionally
/// normalized by the sum of its entries' absolute values.
#[derive(Clone, Copy, Debug)]
pub struct CheckerboardKernel {
    pub size: usize,
    pub sigma: f64,
    pub normalize: bool,
}

impl CheckerboardKernel {
    pub fn new(size: usize, sigma: f64, normalize: bool) -> Result<Self> {
        if size == 0 || size % 2 != 0 {
            log::warn!("CheckerboardKernel rejecting configuration: size {size} must be even and nonzero");
            return Err(Error::configuration(format!(
                "novelty kernel size must be even and nonzero, got {size}"
            )));
        }
        Ok(CheckerboardKernel { size, sigma, normalize })
    }

    fn build(&self) -> Vec<Vec<f32>> {
        let c = (self.size - 1) as f64 / 2.0;
        let mut weights = vec![vec![0f32; self.size]; self.size];
        let mut abs_sum = 0f64;
        for (i, row) in weights.iter_mut().enumerate() {
            for (j, slot) in row.iter_mut().enumerate() {
                let a = i as f64 - c;
                let b = j as f64 - c;
                let sign = a.signum() * b.signum();
                let gauss = (-(a * a + b * b) / (2.0 * self.sigma * self.sigma)).exp();
                let v = sign * gauss;
                *slot = v as f32;
                abs_sum += v.abs();
            }
        }
        if self.normalize && abs_sum > 0.0 {
            for row in weights.iter_mut() {
                for v in row.iter_mut() {
                    *v /= abs_sum as f32;
                }
            }
        }
        weights
    }
}

#[derive(Clone, Debug)]
pub struct Novelty {
    id: String,
    kernel: CheckerboardKernel,
    weights: Vec<Vec<f32>>,
    distance: Distance,
    zero_pad: bool,
    half: usize,
    history: VecDeque<(Vec<f32>, f32, u64)>,
    format: Option<AudioFormat>,
    seeded: bool,
    state: NodeState,
    output: Option<Frame>,
}

impl Novelty {
    pub fn new(kernel: CheckerboardKernel, distance: Distance, zero_pad: bool) -> Self {
        Novelty {
            id: format!("Novelty({},{:?},{zero_pad})", kernel.size, distance),
            weights: kernel.build(),
            half: kernel.size / 2,
            kernel,
            distance,
            zero_pad,
            history: VecDeque::with_capacity(kernel.size),
            format: None,
            seeded: false,
            state: NodeState::Idle,
            output: None,
        }
    }

    fn push(&mut self, v: Vec<f32>, frame_number: u64) -> Option<Emission> {
        let norm = euclidean_norm(&v);
        self.history.push_back((v, norm, frame_number));
        if self.history.len() > self.kernel.size {
            self.history.pop_front();
        }
        if self.history.len() < self.kernel.size {
            return None;
        }
        let k = self.kernel.size;
        let mut novelty = 0f32;
        for i in 0..k {
            for j in 0..k {
                let (vi, ni, _) = &self.history[i];
                let (vj, nj, _) = &self.history[j];
                novelty += self.weights[i][j] * self.distance.compute(vi, vj, *ni, *nj);
            }
        }
        let center_frame = self.history[self.half.saturating_sub(1)].2;
        let format = self.format?;
        let frame = Frame::real(format, center_frame, vec![novelty]);
        self.output = Some(frame.clone());
        Some(Emission::single(frame))
    }
}

impl PushNode for Novelty {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!(
            "Novelty({},{},{},{:?},{})",
            self.kernel.size, self.kernel.sigma, self.kernel.normalize, self.distance, self.zero_pad
        )
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        if !self.seeded {
            self.seeded = true;
            self.format = Some(input.format);
            if self.zero_pad {
                let width = input.len();
                for _ in 0..self.half {
                    self.history.push_back((vec![0.0; width], 0.0, 0));
                }
            }
        }
        let v = input.real_slice().to_vec();
        Ok(self.push(v, input.frame_number).into_iter().collect())
    }

    fn flush_self(&mut self) -> Result<Vec<Emission>> {
        if self.state == NodeState::Flushed {
            return Ok(Vec::new());
        }
        self.state = NodeState::Flushed;
        let mut emissions = Vec::new();
        if self.zero_pad {
            if let Some((_, _, last)) = self.history.back() {
                let last_frame = *last;
                let width = self.history.back().map(|(v, _, _)| v.len()).unwrap_or(0);
                for step in 1..=self.half {
                    if let Some(e) = self.push(vec![0.0; width], last_frame + step as u64) {
                        emissions.push(e);
                    }
                }
            }
        }
        Ok(emissions)
    }

    fn output(&self) -> Option<Output> {
        self.output.clone().map(Output::Frame)
    }
}
