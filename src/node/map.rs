//! Elementwise mapping node: applies one of a small set of per-sample
//! functions to every value in a real frame, preserving length and
//! frame number.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::Result;
use crate::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MapFn {
    Abs,
    Ln1p,
    Sqrt,
    Negate,
    Scale(f32),
    Clamp(f32, f32),
}

impl MapFn {
    fn apply(self, x: f32) -> f32 {
        match self {
            MapFn::Abs => x.abs(),
            MapFn::Ln1p => (x.max(0.0) + 1.0).ln(),
            MapFn::Sqrt => x.max(0.0).sqrt(),
            MapFn::Negate => -x,
            MapFn::Scale(s) => x * s,
            MapFn::Clamp(lo, hi) => x.clamp(lo, hi),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Map {
    id: String,
    f: MapFn,
    state: NodeState,
    output: Option<Frame>,
}

impl Map {
    pub fn new(f: MapFn) -> Self {
        Map {
            id: format!("Map({f:?})"),
            f,
            state: NodeState::Idle,
            output: None,
        }
    }
}

impl PushNode for Map {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("Map({:?})", self.f)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let out: Vec<f32> = input.real_slice().iter().map(|&x| self.f.apply(x)).collect();
        let frame = Frame::real(input.format, input.frame_number, out);
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
