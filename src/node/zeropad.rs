//! Zero-pad node: stretches (or truncates) every real frame to a fixed
//! target length, filling new tail samples with zero. Used ahead of
//! fixed-size transforms that would otherwise reject a shorter buffer.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::{Error, Result};
use crate::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Truncation {
    /// Reject input longer than the target length.
    Reject,
    /// Drop trailing samples past the target length.
    Truncate,
}

#[derive(Clone, Debug)]
pub struct ZeroPad {
    id: String,
    target_len: usize,
    truncation: Truncation,
    state: NodeState,
    output: Option<Frame>,
}

impl ZeroPad {
    pub fn new(target_len: usize, truncation: Truncation) -> Result<Self> {
        if target_len == 0 {
            log::warn!("ZeroPad rejecting configuration: target length must be nonzero");
            return Err(Error::configuration("zero-pad target length must be nonzero"));
        }
        Ok(ZeroPad {
            id: format!("ZeroPad({target_len})"),
            target_len,
            truncation,
            state: NodeState::Idle,
            output: None,
        })
    }
}

impl PushNode for ZeroPad {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("ZeroPad({},{:?})", self.target_len, self.truncation)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let mut samples = input.real_slice().to_vec();
        if samples.len() > self.target_len {
            match self.truncation {
                Truncation::Reject => {
                    return Err(Error::configuration(format!(
                        "zero-pad target {} is shorter than input length {}",
                        self.target_len,
                        samples.len()
                    )))
                }
                Truncation::Truncate => samples.truncate(self.target_len),
            }
        } else {
            samples.resize(self.target_len, 0.0);
        }
        let frame = Frame::real(input.format, input.frame_number, samples);
        self.output = Some(frame.clone());
        Ok(vec![Emission::single(frame)])
    }

    fn flush_self(&mut self) -> Result<Vec<Emission>> {
        self.state = NodeState::Flushed;
        Ok(Vec::new())
    }

    fn output(&self) -> Option<Output> {
        self.output.clone().map(Output::Frame)
    }
}
