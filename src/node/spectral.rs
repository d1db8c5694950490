//! Multi-band, mel, and constant-Q spectral wrappers (§4.4, §4.5).

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::{Error, Result};
use crate::frame::{Frame, Kind};
use crate::transform::ConstantQ;

fn hz_to_mel(f: f64) -> f64 {
    2595.0 * (1.0 + f / 700.0).log10()
}

fn mel_to_hz(m: f64) -> f64 {
    700.0 * (10f64.powf(m / 2595.0) - 1.0)
}

/// Triangular mel filter bank (§4.5): `channels` filters with edges
/// equally spaced on the mel scale between `lower` and `upper`, each row
/// normalized to sum to 1.
#[derive(Clone, Debug)]
pub struct Mel {
    id: String,
    lower: f64,
    upper: f64,
    channels: usize,
    filter_powers: bool,
    filters: Option<Vec<Vec<f32>>>,
    boundaries_hz: Option<Vec<f64>>,
    state: NodeState,
    output: Option<Frame>,
}

impl Mel {
    pub fn new(lower: f64, upper: f64, channels: usize) -> Result<Self> {
        if !(lower > 0.0 && upper > lower) || channels == 0 {
            return Err(Error::configuration(
                "mel filter bank requires 0 < lower < upper and a nonzero channel count",
            ));
        }
        Ok(Mel {
            id: format!("Mel({lower},{upper},{channels})"),
            lower,
            upper,
            channels,
            filter_powers: false,
            filters: None,
            boundaries_hz: None,
            state: NodeState::Idle,
            output: None,
        })
    }

    pub fn set_lower(&mut self, lower: f64) {
        self.lower = lower;
        self.filters = None;
    }

    pub fn set_upper(&mut self, upper: f64) {
        self.upper = upper;
        self.filters = None;
    }

    pub fn set_channels(&mut self, channels: usize) {
        self.channels = channels;
        self.filters = None;
    }

    /// `filterPowers` (§6): sum input powers instead of magnitudes.
    pub fn set_filter_powers(&mut self, filter_powers: bool) {
        self.filter_powers = filter_powers;
    }

    fn build(&self, n_bins: usize, sample_rate: f64) -> (Vec<Vec<f32>>, Vec<f64>) {
        let mel_lo = hz_to_mel(self.lower);
        let mel_hi = hz_to_mel(self.upper);
        let edges_mel: Vec<f64> = (0..=self.channels + 1)
            .map(|i| mel_lo + (mel_hi - mel_lo) * i as f64 / (self.channels + 1) as f64)
            .collect();
        let edges_hz: Vec<f64> = edges_mel.into_iter().map(mel_to_hz).collect();
        let bin_hz = |k: usize| k as f64 * sample_rate / n_bins as f64;

        let mut filters = Vec::with_capacity(self.channels);
        for b in 0..self.channels {
            let (lo, mid, hi) = (edges_hz[b], edges_hz[b + 1], edges_hz[b + 2]);
            let mut row = vec![0f64; n_bins];
            for (k, slot) in row.iter_mut().enumerate() {
                let f = bin_hz(k);
                *slot = if f >= lo && f <= mid && mid > lo {
                    (f - lo) / (mid - lo)
                } else if f > mid && f <= hi && hi > mid {
                    (hi - f) / (hi - mid)
                } else {
                    0.0
                };
            }
            let sum: f64 = row.iter().sum();
            if sum > 0.0 {
                for v in row.iter_mut() {
                    *v /= sum;
                }
            }
            filters.push(row.into_iter().map(|v| v as f32).collect());
        }
        (filters, edges_hz)
    }
}

impl PushNode for Mel {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!(
            "Mel({},{},{},{})",
            self.lower, self.upper, self.channels, self.filter_powers
        )
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        if self.filters.is_none() {
            let (filters, boundaries) = self.build(input.len(), input.format.sample_rate);
            self.filters = Some(filters);
            self.boundaries_hz = Some(boundaries);
        }
        let values = if self.filter_powers {
            input.powers()
        } else {
            input.magnitudes()
        };
        let filters = self.filters.as_ref().unwrap();
        let out: Vec<f32> = filters
            .iter()
            .map(|row| row.iter().zip(values.iter()).map(|(w, v)| w * v).sum())
            .collect();
        let imag = vec![0.0; out.len()];
        let frame = Frame::spectrum(
            Kind::Mel {
                boundaries_hz: self.boundaries_hz.clone().unwrap(),
            },
            input.format,
            input.frame_number,
            out,
            imag,
        )?;
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

/// Rectangular multi-band summation (§4.5): sums input powers into each
/// band between strictly increasing Hz boundaries, then exposes
/// magnitudes as `sqrt(power)`.
#[derive(Clone, Debug)]
pub struct MultiBand {
    id: String,
    boundaries_hz: Vec<f64>,
    state: NodeState,
    output: Option<Frame>,
}

impl MultiBand {
    pub fn new(boundaries_hz: Vec<f64>) -> Result<Self> {
        if boundaries_hz.len() < 2 || boundaries_hz.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::configuration(
                "multi-band boundaries must be strictly increasing and have at least two entries",
            ));
        }
        Ok(MultiBand {
            id: "MultiBand".to_string(),
            boundaries_hz,
            state: NodeState::Idle,
            output: None,
        })
    }

    /// The band whose half-open interval `[boundaries[i], boundaries[i+1])`
    /// contains `f`, else `-1`.
    pub fn get_bin(&self, f: f64) -> i64 {
        for i in 0..self.boundaries_hz.len() - 1 {
            if f >= self.boundaries_hz[i] && f < self.boundaries_hz[i + 1] {
                return i as i64;
            }
        }
        -1
    }
}

impl PushNode for MultiBand {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("MultiBand({:?})", self.boundaries_hz)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let bands = self.boundaries_hz.len() - 1;
        let powers = input.powers();
        let mut sums = vec![0f32; bands];
        for (k, &p) in powers.iter().enumerate() {
            let f = input.linear_bin_hz(k);
            let bin = self.get_bin(f);
            if bin >= 0 {
                sums[bin as usize] += p;
            }
        }
        let magnitudes: Vec<f32> = sums.iter().map(|p| p.sqrt()).collect();
        let imag = vec![0.0; bands];
        let frame = Frame::spectrum(
            Kind::MultiBand {
                boundaries_hz: self.boundaries_hz.clone(),
            },
            input.format,
            input.frame_number,
            magnitudes,
            imag,
        )?;
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

/// Constant-Q transform wrapper (§4.4): builds the sparse spectral
/// kernel on the first frame, then applies it to subsequent frames.
#[derive(Clone, Debug)]
pub struct ConstantQNode {
    id: String,
    fmin: f64,
    fmax: f64,
    bins_per_octave: usize,
    threshold: f32,
    cq: Option<ConstantQ>,
    state: NodeState,
    output: Option<Frame>,
}

impl ConstantQNode {
    pub fn new(fmin: f64, fmax: f64, bins_per_octave: usize, threshold: f32) -> Self {
        ConstantQNode {
            id: format!("ConstantQ({fmin},{fmax},{bins_per_octave})"),
            fmin,
            fmax,
            bins_per_octave,
            threshold,
            cq: None,
            state: NodeState::Idle,
            output: None,
        }
    }
}

impl PushNode for ConstantQNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!(
            "ConstantQ({},{},{},{})",
            self.fmin, self.fmax, self.bins_per_octave, self.threshold
        )
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        if input.format.channels != 1 {
            return Err(Error::configuration("constant-Q requires mono input"));
        }
        if self.cq.is_none() {
            self.cq = Some(ConstantQ::new(
                self.fmin,
                self.fmax,
                self.bins_per_octave,
                input.format.sample_rate,
                self.threshold,
            )?);
        }
        let cq = self.cq.as_ref().unwrap();
        let (re, im) = cq.forward(input.real_slice())?;
        let frame = Frame::spectrum(
            Kind::Log {
                center_freqs_hz: cq.center_freqs_hz().to_vec(),
                q: cq.q(),
            },
            input.format,
            input.frame_number,
            re,
            im,
        )?;
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
        AudioFormat::mono(16000.0)
    }

    #[test]
    fn mel_rows_sum_to_one() {
        let mut mel = Mel::new(1.0, 8000.0, 4).unwrap();
        let input = Frame::real(fmt(), 0, vec![1.0; 64]);
        let fft = crate::transform::Fft::new(64).unwrap();
        let (re, im) = fft.forward_real(input.real_slice()).unwrap();
        let spectrum = Frame::spectrum(Kind::Linear, fmt(), 0, re, im).unwrap();
        mel.process_self(&spectrum).unwrap();
        for row in mel.filters.as_ref().unwrap() {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4 || sum == 0.0);
        }
    }

    #[test]
    fn multiband_bin_lookup_is_half_open() {
        let mb = MultiBand::new(vec![0.0, 100.0, 200.0]).unwrap();
        assert_eq!(mb.get_bin(50.0), 0);
        assert_eq!(mb.get_bin(100.0), 1);
        assert_eq!(mb.get_bin(200.0), -1);
    }

    #[test]
    fn non_increasing_boundaries_is_configuration_error() {
        assert!(MultiBand::new(vec![100.0, 50.0]).is_err());
    }

    #[test]
    fn constant_q_rejects_non_mono_input() {
        use crate::format::{Encoding, Endian};
        let mut node = ConstantQNode::new(440.0, 880.0, 12, 0.0005);
        let stereo = AudioFormat::new(16000.0, 32, 2, Encoding::PcmSigned, Endian::Little);
        let input = Frame::real(stereo, 0, vec![0.0; 8]);
        assert!(node.process_self(&input).is_err());
    }
}
