//! `OverlapAdd(L, H)` (§4.3): the inverse of [`super::window::SlidingWindow`].
//! Incoming length-`L` frames are added into a pair of length-`L`
//! accumulators at a running offset `o`; once `o >= L` the filled
//! accumulator is complete and is emitted, the pair rotates, and `L` is
//! subtracted from `o`.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::{Error, Result};
use crate::format::AudioFormat;
use crate::frame::Frame;

#[derive(Clone, Debug)]
pub struct OverlapAdd {
    id: String,
    length: usize,
    hop: usize,
    // `acc[0]` is the accumulator due to complete next; `acc[1]` is the
    // one behind it by one hop.
    acc: [Vec<f32>; 2],
    offset: usize,
    base_frame: Option<u64>,
    format: Option<AudioFormat>,
    state: NodeState,
    output: Option<Frame>,
}

impl OverlapAdd {
    pub fn new(length: usize, hop: usize) -> Result<Self> {
        if length == 0 || hop == 0 || hop > length {
            log::warn!("OverlapAdd rejecting configuration: length={length} hop={hop}");
            return Err(Error::configuration(format!(
                "overlap-add requires 0 < hop <= length, got length={length} hop={hop}"
            )));
        }
        Ok(OverlapAdd {
            id: format!("OverlapAdd({length},{hop})"),
            length,
            hop,
            acc: [vec![0.0; length], vec![0.0; length]],
            offset: 0,
            base_frame: None,
            format: None,
            state: NodeState::Idle,
            output: None,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    fn add_window(&mut self, window: &[f32]) {
        for (i, &x) in window.iter().enumerate() {
            let pos = self.offset + i;
            if pos < self.length {
                self.acc[0][pos] += x;
            } else {
                self.acc[1][pos - self.length] += x;
            }
        }
    }

    fn rotate_if_complete(&mut self) -> Option<Frame> {
        if self.offset < self.length {
            return None;
        }
        let format = self.format?;
        let frame_number = self.base_frame.unwrap_or(0);
        let rotated_in = std::mem::replace(&mut self.acc[1], vec![0.0; self.length]);
        let completed = std::mem::replace(&mut self.acc[0], rotated_in);
        self.offset -= self.length;
        self.base_frame = Some(frame_number + self.length as u64);
        Some(Frame::real(format, frame_number, completed))
    }
}

impl PushNode for OverlapAdd {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("OverlapAdd({},{})", self.length, self.hop)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        if input.len() != self.length {
            return Err(Error::configuration(format!(
                "overlap-add expects frames of length {}, got {}",
                self.length,
                input.len()
            )));
        }
        self.state = NodeState::Running;
        self.format = Some(input.format);
        if self.base_frame.is_none() {
            self.base_frame = Some(input.frame_number);
        }
        self.add_window(input.real_slice());
        self.offset += self.hop;
        let mut emissions = Vec::new();
        while let Some(frame) = self.rotate_if_complete() {
            self.output = Some(frame.clone());
            emissions.push(Emission::single(frame));
        }
        Ok(emissions)
    }

    fn flush_self(&mut self) -> Result<Vec<Emission>> {
        if self.state == NodeState::Flushed {
            return Ok(Vec::new());
        }
        self.state = NodeState::Flushed;
        let format = match self.format {
            Some(f) => f,
            None => return Ok(Vec::new()),
        };
        let base = self.base_frame.unwrap_or(0);
        let first = Frame::real(format, base, std::mem::replace(&mut self.acc[0], Vec::new()));
        let second = Frame::real(
            format,
            base + self.length as u64,
            std::mem::replace(&mut self.acc[1], Vec::new()),
        );
        self.output = Some(second.clone());
        Ok(vec![Emission::single(first), Emission::single(second)])
    }

    fn output(&self) -> Option<Output> {
        self.output.clone().map(Output::Frame)
    }
}
