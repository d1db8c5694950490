//! Aggregation node: reduces one frame's samples to a single scalar via
//! one of [`crate::numeric::aggregate`]'s reductions. §8 scenario 2 pins
//! down `ZeroCrossingRate` applied to `[1,-1,1,-1]`: `3/4`.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::Result;
use crate::frame::Frame;
use crate::numeric::aggregate;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AggregateFn {
    Mean,
    Sum,
    Max,
    Min,
    Rms,
    ZeroCrossingRate,
}

impl AggregateFn {
    fn apply(self, v: &[f32]) -> f32 {
        match self {
            AggregateFn::Mean => aggregate::mean(v),
            AggregateFn::Sum => aggregate::sum(v),
            AggregateFn::Max => aggregate::max(v),
            AggregateFn::Min => aggregate::min(v),
            AggregateFn::Rms => aggregate::rms(v),
            AggregateFn::ZeroCrossingRate => aggregate::zero_crossing_rate(v),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Aggregate {
    id: String,
    f: AggregateFn,
    state: NodeState,
    output: Option<Frame>,
}

impl Aggregate {
    pub fn new(f: AggregateFn) -> Self {
        Aggregate {
            id: format!("Aggregate({f:?})"),
            f,
            state: NodeState::Idle,
            output: None,
        }
    }
}

impl PushNode for Aggregate {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("Aggregate({:?})", self.f)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let value = self.f.apply(input.real_slice());
        let frame = Frame::real(input.format, input.frame_number, vec![value]);
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
