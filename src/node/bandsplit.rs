//! Band split (§4.2): accumulates `W` successive spectra and emits, per
//! spectral bin, a new real-time frame of length `W` (band-major
//! slicing). A split: each bin is a distinct channel with its own child
//! list.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::{Error, Result};
use crate::format::AudioFormat;
use crate::frame::Frame;

#[derive(Clone, Debug)]
pub struct BandSplit {
    id: String,
    window: usize,
    buffer: Vec<Frame>,
    format: Option<AudioFormat>,
    state: NodeState,
}

impl BandSplit {
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            log::warn!("BandSplit rejecting configuration: window must be nonzero");
            return Err(Error::configuration("band split window must be nonzero"));
        }
        Ok(BandSplit {
            id: format!("BandSplit({window})"),
            window,
            buffer: Vec::with_capacity(window),
            format: None,
            state: NodeState::Idle,
        })
    }

    fn emit_buffered(&mut self, pad_to: usize) -> Vec<Emission> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        let bins = self.buffer[0].len();
        let frame_number = self.buffer[0].frame_number;
        let format = self.format.unwrap();
        let mut emissions = Vec::with_capacity(bins);
        for bin in 0..bins {
            let mut values: Vec<f32> = self.buffer.iter().map(|f| f.real_slice()[bin]).collect();
            values.resize(pad_to, 0.0);
            emissions.push(Emission::channel(bin, Frame::real(format, frame_number, values)));
        }
        self.buffer.clear();
        emissions
    }
}

impl PushNode for BandSplit {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("BandSplit({})#split", self.window)
    }

    fn is_split(&self) -> bool {
        true
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        if let Some(prior) = self.buffer.first() {
            if prior.len() != input.len() {
                return Err(Error::configuration(format!(
                    "band split requires a constant bin count, got {} then {}",
                    prior.len(),
                    input.len()
                )));
            }
        }
        self.format = Some(input.format);
        self.buffer.push(input.clone());
        if self.buffer.len() == self.window {
            Ok(self.emit_buffered(self.window))
        } else {
            Ok(Vec::new())
        }
    }

    fn flush_self(&mut self) -> Result<Vec<Emission>> {
        if self.state == NodeState::Flushed {
            return Ok(Vec::new());
        }
        self.state = NodeState::Flushed;
        Ok(self.emit_buffered(self.window))
    }

    fn output(&self) -> Option<Output> {
        None
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
    fn emits_one_frame_per_bin_once_window_is_full() {
        let mut bs = BandSplit::new(2).unwrap();
        let f0 = Frame::real(fmt(), 0, vec![1.0, 2.0, 3.0]);
        let f1 = Frame::real(fmt(), 1, vec![4.0, 5.0, 6.0]);
        assert!(bs.process_self(&f0).unwrap().is_empty());
        let out = bs.process_self(&f1).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].slot, ChildSlot::Channel(0));
        assert_eq!(out[0].frame.real_slice(), &[1.0, 4.0]);
        assert_eq!(out[2].frame.real_slice(), &[3.0, 6.0]);
    }

    #[test]
    fn flush_zero_pads_partial_window() {
        let mut bs = BandSplit::new(3).unwrap();
        let f0 = Frame::real(fmt(), 0, vec![1.0, 2.0]);
        bs.process_self(&f0).unwrap();
        let out = bs.flush_self().unwrap();
        assert_eq!(out[0].frame.real_slice(), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn inconsistent_bin_count_is_configuration_error() {
        let mut bs = BandSplit::new(3).unwrap();
        let f0 = Frame::real(fmt(), 0, vec![1.0, 2.0]);
        let f1 = Frame::real(fmt(), 1, vec![1.0, 2.0, 3.0]);
        bs.process_self(&f0).unwrap();
        assert!(bs.process_self(&f1).is_err());
    }
}
