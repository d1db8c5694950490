//! Channel selection and interleaved channel splitting (§4.2).

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::{Error, Result};
use crate::frame::Frame;

/// Picks one channel out of an interleaved multichannel frame, emitting
/// a single-channel real frame. Not a split: it has one ordinary child
/// list, not per-channel partitioning.
#[derive(Clone, Debug)]
pub struct ChannelSelect {
    id: String,
    channel: usize,
    state: NodeState,
    output: Option<Frame>,
}

impl ChannelSelect {
    pub fn new(channel: usize) -> Self {
        ChannelSelect {
            id: format!("ChannelSelect({channel})"),
            channel,
            state: NodeState::Idle,
            output: None,
        }
    }
}

impl PushNode for ChannelSelect {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("ChannelSelect({})", self.channel)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let channels = input.format.channels as usize;
        if self.channel >= channels {
            return Err(Error::configuration(format!(
                "channel select index {} out of range for {channels}-channel input",
                self.channel
            )));
        }
        let samples = input.real_slice();
        let frame_count = samples.len() / channels;
        let out: Vec<f32> = (0..frame_count).map(|i| samples[i * channels + self.channel]).collect();
        let frame = Frame::real(input.format.with_channels(1), input.frame_number, out);
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

/// A split with a fixed channel count `C` (§4.2): de-interleaves
/// `LRLR...` into per-channel frames, emitting one `Emission::channel`
/// per channel. Splits never merge (see [`PushNode::is_split`]).
#[derive(Clone, Debug)]
pub struct ChannelSplit {
    id: String,
    channels: usize,
    state: NodeState,
    outputs: Vec<Option<Frame>>,
}

impl ChannelSplit {
    pub fn new(channels: usize) -> Result<Self> {
        if channels == 0 {
            log::warn!("ChannelSplit rejecting configuration: requires at least one channel");
            return Err(Error::configuration("channel split requires at least one channel"));
        }
        Ok(ChannelSplit {
            id: format!("ChannelSplit({channels})"),
            channels,
            state: NodeState::Idle,
            outputs: vec![None; channels],
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

impl PushNode for ChannelSplit {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        // Splits are never merged, regardless of structural key
        // equality, so the disambiguating suffix only matters for
        // readability in `Pump::describe`.
        format!("ChannelSplit({})#split", self.channels)
    }

    fn is_split(&self) -> bool {
        true
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let channels = input.format.channels as usize;
        if channels != self.channels {
            return Err(Error::configuration(format!(
                "channel split configured for {} channels, got {channels}",
                self.channels
            )));
        }
        let samples = input.real_slice();
        let frame_count = samples.len() / channels;
        let format = input.format.with_channels(1);
        let mut emissions = Vec::with_capacity(channels);
        for c in 0..channels {
            let out: Vec<f32> = (0..frame_count).map(|i| samples[i * channels + c]).collect();
            let frame = Frame::real(format, input.frame_number, out);
            self.outputs[c] = Some(frame.clone());
            emissions.push(Emission::channel(c, frame));
        }
        Ok(emissions)
    }

    fn flush_self(&mut self) -> Result<Vec<Emission>> {
        self.state = NodeState::Flushed;
        Ok(Vec::new())
    }

    fn output(&self) -> Option<Output> {
        // A split has no single terminal value; its per-channel children
        // carry the retrievable outputs.
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{AudioFormat, Encoding, Endian};

    fn stereo_format() -> AudioFormat {
        AudioFormat::new(8000.0, 32, 2, Encoding::PcmSigned, Endian::Little)
    }

    #[test]
    fn splits_interleaved_lrlr_into_per_channel_frames() {
        let mut split = ChannelSplit::new(2).unwrap();
        let input = Frame::real(stereo_format(), 0, vec![1.0, -1.0, 2.0, -2.0]);
        let out = split.process_self(&input).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].slot, ChildSlot::Channel(0));
        assert_eq!(out[0].frame.real_slice(), &[1.0, 2.0]);
        assert_eq!(out[1].slot, ChildSlot::Channel(1));
        assert_eq!(out[1].frame.real_slice(), &[-1.0, -2.0]);
    }

    #[test]
    fn is_split_never_merges() {
        let split = ChannelSplit::new(2).unwrap();
        assert!(split.is_split());
    }

    #[test]
    fn select_picks_the_requested_channel() {
        let mut sel = ChannelSelect::new(1);
        let input = Frame::real(stereo_format(), 0, vec![1.0, -1.0, 2.0, -2.0]);
        let out = sel.process_self(&input).unwrap();
        assert_eq!(out[0].frame.real_slice(), &[-1.0, -2.0]);
    }

    #[test]
    fn channel_count_mismatch_is_configuration_error() {
        let mut split = ChannelSplit::new(3).unwrap();
        let input = Frame::real(stereo_format(), 0, vec![1.0, -1.0, 2.0, -2.0]);
        assert!(split.process_self(&input).is_err());
    }
}
