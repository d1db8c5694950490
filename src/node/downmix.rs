//! Mono downmix: averages interleaved channels down to one.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::{Error, Result};
use crate::frame::Frame;

#[derive(Clone, Debug)]
pub struct Downmix {
    id: String,
    state: NodeState,
    output: Option<Frame>,
}

impl Downmix {
    pub fn new() -> Self {
        Downmix {
            id: "Downmix".to_string(),
            state: NodeState::Idle,
            output: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl Default for Downmix {
    fn default() -> Self {
        Downmix::new()
    }
}

impl PushNode for Downmix {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        "Downmix".to_string()
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let channels = input.format.channels as usize;
        if channels == 0 {
            return Err(Error::configuration("downmix requires at least one channel"));
        }
        let samples = input.real_slice();
        if samples.len() % channels != 0 {
            return Err(Error::configuration(format!(
                "downmix input length {} is not a multiple of channel count {channels}",
                samples.len()
            )));
        }
        let frame_count = samples.len() / channels;
        let mut out = Vec::with_capacity(frame_count);
        for i in 0..frame_count {
            let sum: f32 = (0..channels).map(|c| samples[i * channels + c]).sum();
            out.push(sum / channels as f32);
        }
        let format = input.format.with_channels(1);
        let frame = Frame::real(format, input.frame_number, out);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{AudioFormat, Encoding, Endian};

    #[test]
    fn stereo_downmix_averages_channels() {
        // §8 scenario 3.
        let format = AudioFormat::new(8000.0, 32, 2, Encoding::PcmSigned, Endian::Little);
        let mut d = Downmix::new();
        let input = Frame::real(format, 0, vec![0.5, -0.5, 0.2, -0.2]);
        let out = d.process_self(&input).unwrap();
        let samples = out[0].frame.real_slice();
        assert!((samples[0] - 0.0).abs() < 1e-6);
        assert!((samples[1] - 0.0).abs() < 1e-6);
        assert_eq!(out[0].frame.format.channels, 1);
    }

    #[test]
    fn misaligned_length_is_configuration_error() {
        let format = AudioFormat::new(8000.0, 32, 2, Encoding::PcmSigned, Endian::Little);
        let mut d = Downmix::new();
        let input = Frame::real(format, 0, vec![0.5, -0.5, 0.2]);
        assert!(d.process_self(&input).is_err());
    }
}
