//! Instantaneous frequency (§4.5): from two successive linear spectra at
//! hop `h` frames, the expected phase advance `omega_k * h` is subtracted
//! from the observed phase change, wrapped into `[-pi, pi]`, divided by
//! `h`, and added back to `omega_k` to yield a per-bin Hz estimate.
//!
//! The output frame packs frequency (Hz) into the real array and the
//! averaged input magnitude into the imaginary array — a deliberate
//! departure from the usual re/im-as-complex-pair convention, since this
//! kind has no complex structure of its own but [`crate::frame::Frame`]
//! only carries two same-length arrays.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::Result;
use crate::frame::{Frame, Kind};
use std::f64::consts::PI;

fn wrap_phase(x: f64) -> f64 {
    let wrapped = (x + PI).rem_euclid(2.0 * PI) - PI;
    wrapped
}

#[derive(Clone, Debug)]
pub struct InstantaneousFrequency {
    id: String,
    hop: u64,
    previous: Option<Frame>,
    state: NodeState,
    output: Option<Frame>,
}

impl InstantaneousFrequency {
    pub fn new(hop: u64) -> Self {
        InstantaneousFrequency {
            id: format!("InstantaneousFrequency({hop})"),
            hop,
            previous: None,
            state: NodeState::Idle,
            output: None,
        }
    }
}

impl PushNode for InstantaneousFrequency {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("InstantaneousFrequency({})", self.hop)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let previous = match self.previous.take() {
            Some(p) => p,
            None => {
                self.previous = Some(input.clone());
                return Ok(Vec::new());
            }
        };

        let n = input.len();
        let sample_rate = input.format.sample_rate;
        let prev_mag = previous.magnitudes().to_vec();
        let cur_mag = input.magnitudes().to_vec();
        let mut freq_hz = vec![0f32; n];
        let mut avg_mag = vec![0f32; n];
        for k in 0..n {
            let omega_k = 2.0 * PI * k as f64 / n as f64;
            let phase_prev = (previous.imag_slice()[k] as f64).atan2(previous.real_slice()[k] as f64);
            let phase_cur = (input.imag_slice()[k] as f64).atan2(input.real_slice()[k] as f64);
            let expected = omega_k * self.hop as f64;
            let delta = wrap_phase(phase_cur - phase_prev - expected);
            let inst_omega = delta / self.hop as f64 + omega_k;
            freq_hz[k] = (inst_omega * sample_rate / (2.0 * PI)) as f32;
            avg_mag[k] = 0.5 * (prev_mag[k] + cur_mag[k]);
        }

        self.previous = Some(input.clone());
        let frame = Frame::spectrum(Kind::InstantaneousFrequency, input.format, input.frame_number, freq_hz, avg_mag)?;
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
    use crate::format::AudioFormat;

    fn fmt() -> AudioFormat {
        AudioFormat::mono(8000.0)
    }

    #[test]
    fn stationary_tone_has_zero_phase_drift() {
        // A bin whose phase advances by exactly `omega_k * hop` between
        // frames (a pure stationary tone at that bin) yields an
        // instantaneous frequency equal to the bin's own center freq.
        let n = 8;
        let hop = 4u64;
        let mut node = InstantaneousFrequency::new(hop);
        let re0 = vec![1.0f32; n];
        let im0 = vec![0.0f32; n];
        let f0 = Frame::spectrum(Kind::Linear, fmt(), 0, re0, im0).unwrap();
        node.process_self(&f0).unwrap();

        // Advance phase of bin 1 by exactly omega_1 * hop.
        let omega1 = 2.0 * PI * 1.0 / n as f64 * hop as f64;
        let mut re1 = vec![1.0f32; n];
        let mut im1 = vec![0.0f32; n];
        re1[1] = omega1.cos() as f32;
        im1[1] = omega1.sin() as f32;
        let f1 = Frame::spectrum(Kind::Linear, fmt(), hop, re1, im1).unwrap();
        let out = node.process_self(&f1).unwrap();
        let expected_hz = (1.0 * 8000.0 / n as f64) as f32;
        assert!((out[0].frame.real_slice()[1] - expected_hz).abs() < 1e-2);
    }

    #[test]
    fn first_frame_produces_no_output() {
        let mut node = InstantaneousFrequency::new(1);
        let f0 = Frame::spectrum(Kind::Linear, fmt(), 0, vec![1.0; 4], vec![0.0; 4]).unwrap();
        assert!(node.process_self(&f0).unwrap().is_empty());
    }

    #[test]
    fn magnitudes_are_the_average_of_the_two_inputs() {
        let mut node = InstantaneousFrequency::new(1);
        let f0 = Frame::spectrum(Kind::Linear, fmt(), 0, vec![2.0], vec![0.0]).unwrap();
        let f1 = Frame::spectrum(Kind::Linear, fmt(), 1, vec![4.0], vec![0.0]).unwrap();
        node.process_self(&f0).unwrap();
        let out = node.process_self(&f1).unwrap();
        assert!((out[0].frame.imag_slice()[0] - 3.0).abs() < 1e-5);
    }
}
