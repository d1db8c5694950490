//! Frame-number filter: passes a frame through unchanged only if its
//! `frame_number` satisfies the configured rule, otherwise drops it
//! silently.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::Result;
use crate::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameFilterMode {
    /// Keep frames whose number is a multiple of `n`.
    Every(u64),
    /// Keep frames with `lo <= frame_number < hi`.
    Range { lo: u64, hi: u64 },
}

impl FrameFilterMode {
    fn keep(self, frame_number: u64) -> bool {
        match self {
            FrameFilterMode::Every(n) => n != 0 && frame_number % n == 0,
            FrameFilterMode::Range { lo, hi } => frame_number >= lo && frame_number < hi,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FrameFilter {
    id: String,
    mode: FrameFilterMode,
    state: NodeState,
    output: Option<Frame>,
}

impl FrameFilter {
    pub fn new(mode: FrameFilterMode) -> Self {
        FrameFilter {
            id: format!("FrameFilter({mode:?})"),
            mode,
            state: NodeState::Idle,
            output: None,
        }
    }
}

impl PushNode for FrameFilter {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("FrameFilter({:?})", self.mode)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        if !self.mode.keep(input.frame_number) {
            return Ok(Vec::new());
        }
        self.output = Some(input.clone());
        Ok(vec![Emission::single(input.clone())])
    }

    fn flush_self(&mut self) -> Result<Vec<Emission>> {
        self.state = NodeState::Flushed;
        Ok(Vec::new())
    }

    fn output(&self) -> Option<Output> {
        self.output.clone().map(Output::Frame)
    }
}
