//! Join (§4.2): a fan-in sink fed by `N` distinct parent edges, each
//! tagged with a distinct [`ChildSlot::Channel`]. Buffers one frame per
//! slot and, once every slot holds one (the round is "balanced"),
//! combines them elementwise with the configured aggregate function into
//! a single output frame and clears the round.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::{Error, Result};
use crate::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JoinFn {
    Mean,
    Sum,
    Max,
    Min,
}

impl JoinFn {
    fn combine(self, values: &[f32]) -> f32 {
        match self {
            JoinFn::Mean => values.iter().sum::<f32>() / values.len() as f32,
            JoinFn::Sum => values.iter().sum(),
            JoinFn::Max => values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            JoinFn::Min => values.iter().copied().fold(f32::INFINITY, f32::min),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Join {
    id: String,
    inputs: usize,
    f: JoinFn,
    slots: Vec<Option<Frame>>,
    state: NodeState,
    output: Option<Frame>,
}

impl Join {
    pub fn new(inputs: usize, f: JoinFn) -> Result<Self> {
        if inputs == 0 {
            log::warn!("Join rejecting configuration: requires at least one input");
            return Err(Error::configuration("join requires at least one input"));
        }
        Ok(Join {
            id: format!("Join({inputs},{f:?})"),
            inputs,
            f,
            slots: vec![None; inputs],
            state: NodeState::Idle,
            output: None,
        })
    }

    fn is_balanced(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    fn combine_and_clear(&mut self) -> Result<Emission> {
        let first = self.slots[0].as_ref().unwrap();
        let len = first.len();
        let format = first.format;
        let frame_number = first.frame_number;
        let mut out = vec![0f32; len];
        for i in 0..len {
            let values: Vec<f32> = self.slots.iter().map(|f| f.as_ref().unwrap().real_slice()[i]).collect();
            out[i] = self.f.combine(&values);
        }
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        let frame = Frame::real(format, frame_number, out);
        self.output = Some(frame.clone());
        Ok(Emission::single(frame))
    }
}

impl PushNode for Join {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("Join({},{:?})", self.inputs, self.f)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.process_port(ChildSlot::Channel(0), input)
    }

    fn process_port(&mut self, slot: ChildSlot, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let ChildSlot::Channel(c) = slot else {
            return Err(Error::configuration("join requires channel-tagged input edges"));
        };
        if c >= self.inputs {
            return Err(Error::configuration(format!(
                "join configured for {} inputs, got edge {c}",
                self.inputs
            )));
        }
        if let Some(existing) = &self.slots[c] {
            if existing.len() != input.len() {
                return Err(Error::configuration(
                    "join inputs must agree on length within a round",
                ));
            }
        }
        self.slots[c] = Some(input.clone());
        if self.is_balanced() {
            Ok(vec![self.combine_and_clear()?])
        } else {
            Ok(Vec::new())
        }
    }

    fn flush_self(&mut self) -> Result<Vec<Emission>> {
        if self.state == NodeState::Flushed {
            return Ok(Vec::new());
        }
        self.state = NodeState::Flushed;
        // Only a fully balanced partial round is meaningful to flush; an
        // unbalanced round (some slots never received a final frame) is
        // discarded rather than combined from stale or absent data.
        if self.is_balanced() {
            Ok(vec![self.combine_and_clear()?])
        } else {
            Ok(Vec::new())
        }
    }

    fn output(&self) -> Option<Output> {
        self.output.clone().map(Output::Frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::AudioFormat;

    fn fmt() -> AudioFormat {
        AudioFormat::mono(8000.0)
    }

    #[test]
    fn emits_once_all_slots_are_filled() {
        let mut join = Join::new(2, JoinFn::Mean).unwrap();
        let a = Frame::real(fmt(), 0, vec![1.0, 2.0]);
        let b = Frame::real(fmt(), 0, vec![3.0, 4.0]);
        assert!(join.process_port(ChildSlot::Channel(0), &a).unwrap().is_empty());
        let out = join.process_port(ChildSlot::Channel(1), &b).unwrap();
        assert_eq!(out[0].frame.real_slice(), &[2.0, 3.0]);
    }

    #[test]
    fn unbalanced_flush_emits_nothing() {
        let mut join = Join::new(2, JoinFn::Sum).unwrap();
        let a = Frame::real(fmt(), 0, vec![1.0]);
        join.process_port(ChildSlot::Channel(0), &a).unwrap();
        assert!(join.flush_self().unwrap().is_empty());
    }

    #[test]
    fn out_of_range_channel_is_configuration_error() {
        let mut join = Join::new(1, JoinFn::Sum).unwrap();
        let a = Frame::real(fmt(), 0, vec![1.0]);
        assert!(join.process_port(ChildSlot::Channel(2), &a).is_err());
    }
}
