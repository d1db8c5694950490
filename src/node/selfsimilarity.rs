//! Self-similarity accumulation (§4.6): buffers incoming feature vectors
//! and, on flush, produces a matrix `M[i][j] = d(x_i, x_j)` where `i`/`j`
//! are the frame's arrival order, not its `frame_number`.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::matrix::{Matrix, SymmetricBandedMatrix, SymmetricMatrix};
use crate::numeric::aggregate::euclidean_norm;
use crate::numeric::Distance;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct SelfSimilarity {
    id: String,
    distance: Distance,
    bandwidth: usize,
    count: usize,
    // Dense path (bandwidth == 0): every feature is kept, since every row
    // needs every other row.
    dense_features: Vec<Vec<f32>>,
    dense_norms: Vec<f32>,
    // Banded path: only features within `bandwidth / 2` of the most
    // recently seen one are kept (§4.6 "discarding buffered features
    // older than the band's reach"); distances are computed against this
    // window as each new feature arrives and recorded as `(row, col,
    // distance)` entries for the matrix `flush_self` builds once the
    // final frame count is known.
    window: VecDeque<(usize, Vec<f32>, f32)>,
    entries: Vec<(usize, usize, f32)>,
    state: NodeState,
    matrix: Option<Rc<dyn Matrix>>,
}

impl SelfSimilarity {
    /// `bandwidth == 0` keeps the full dense `O(n^2)` matrix; otherwise it
    /// must be odd and only entries with `|i - j| <= bandwidth / 2` are
    /// stored, in a [`SymmetricBandedMatrix`].
    pub fn new(distance: Distance, bandwidth: usize) -> Result<Self> {
        if bandwidth != 0 && bandwidth % 2 == 0 {
            log::warn!("SelfSimilarity rejecting configuration: bandwidth {bandwidth} must be odd or zero");
            return Err(Error::configuration(format!(
                "self-similarity bandwidth must be odd or zero, got {bandwidth}"
            )));
        }
        Ok(SelfSimilarity {
            id: format!("SelfSimilarity({distance:?},{bandwidth})"),
            distance,
            bandwidth,
            count: 0,
            dense_features: Vec::new(),
            dense_norms: Vec::new(),
            window: VecDeque::new(),
            entries: Vec::new(),
            state: NodeState::Idle,
            matrix: None,
        })
    }

    fn build_dense(&self) -> Result<SymmetricMatrix> {
        let n = self.dense_features.len();
        let mut m = SymmetricMatrix::new(n);
        for i in 0..n {
            for j in i..n {
                let d = self.distance.compute(
                    &self.dense_features[i],
                    &self.dense_features[j],
                    self.dense_norms[i],
                    self.dense_norms[j],
                );
                m.set(i, j, d)?;
            }
        }
        Ok(m)
    }

    fn build_banded(&self) -> Result<SymmetricBandedMatrix> {
        let mut m = SymmetricBandedMatrix::new(self.count, self.bandwidth, 0.0)?;
        for &(row, col, value) in &self.entries {
            m.set(row, col, value)?;
        }
        Ok(m)
    }

    /// Process one incoming feature against the banded window: record its
    /// distance to every currently buffered vector within reach (§4.6
    /// processes "in chunks of `bandwidth/2+1` rows"), then evict vectors
    /// that have fallen out of every future row's reach.
    fn process_banded(&mut self, idx: usize, v: Vec<f32>, norm: f32) {
        let half = self.bandwidth / 2;
        for (j, feat, jn) in &self.window {
            if idx - j <= half {
                let d = self.distance.compute(&v, feat, norm, *jn);
                self.entries.push((*j, idx, d));
            }
        }
        self.window.push_back((idx, v, norm));
        while let Some(&(front_idx, _, _)) = self.window.front() {
            if idx.saturating_sub(front_idx) > half {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }
}

impl PushNode for SelfSimilarity {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("SelfSimilarity({:?},{})", self.distance, self.bandwidth)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let v = input.real_slice().to_vec();
        let norm = euclidean_norm(&v);
        let idx = self.count;
        self.count += 1;
        if self.bandwidth == 0 {
            self.dense_norms.push(norm);
            self.dense_features.push(v);
        } else {
            self.process_banded(idx, v, norm);
        }
        Ok(Vec::new())
    }

    fn flush_self(&mut self) -> Result<Vec<Emission>> {
        if self.state == NodeState::Flushed {
            return Ok(Vec::new());
        }
        self.state = NodeState::Flushed;
        let matrix: Rc<dyn Matrix> = if self.bandwidth == 0 {
            Rc::new(self.build_dense()?)
        } else {
            Rc::new(self.build_banded()?)
        };
        self.matrix = Some(matrix);
        Ok(Vec::new())
    }

    fn output(&self) -> Option<Output> {
        self.matrix.clone().map(Output::Matrix)
    }
}
