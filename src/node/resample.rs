//! Push-node wrappers around [`crate::numeric::resample`]: `Decimate`,
//! `Interpolate`, `Resample`, and the naive `Upsample`/`Downsample` pair
//! kept distinct per §9's open question.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::Result;
use crate::format::AudioFormat;
use crate::frame::Frame;
use crate::numeric::resample::{downsample_naive, upsample_naive, Decimator, Interpolator, Resampler};

/// Low-pass filter then keep every `factor`-th sample. Unsupported
/// factors fail with a configuration error at construction (equivalently
/// "on first input" per §4.3, since the table lookup happens eagerly).
#[derive(Clone, Debug)]
pub struct Decimate {
    id: String,
    factor: usize,
    decimator: Decimator,
    next_frame_number: Option<u64>,
    format: Option<AudioFormat>,
    state: NodeState,
    output: Option<Frame>,
}

impl Decimate {
    pub fn new(factor: usize) -> Result<Self> {
        Ok(Decimate {
            id: format!("Decimate({factor})"),
            factor,
            decimator: Decimator::new(factor)?,
            next_frame_number: None,
            format: None,
            state: NodeState::Idle,
            output: None,
        })
    }

    /// Construct from a source/target sample rate pair instead of a raw
    /// factor (§6 "for Decimate: `factor` or `targetSampleRate`").
    pub fn for_target_rate(source_rate: f64, target_rate: f64) -> Result<Self> {
        let factor = (source_rate / target_rate).round() as usize;
        Decimate::new(factor)
    }

    pub fn factor(&self) -> usize {
        self.factor
    }
}

impl PushNode for Decimate {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("Decimate({})", self.factor)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let out_format = input.format.with_sample_rate(input.format.sample_rate / self.factor as f64);
        self.format = Some(out_format);
        let frame_number = self
            .next_frame_number
            .unwrap_or(input.frame_number / self.factor as u64);
        let samples = self.decimator.process(input.real_slice());
        let n = samples.len() as u64;
        self.next_frame_number = Some(frame_number + n);
        let frame = Frame::real(out_format, frame_number, samples);
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

/// Insert `factor - 1` zeros then low-pass.
#[derive(Clone, Debug)]
pub struct Interpolate {
    id: String,
    factor: usize,
    interpolator: Interpolator,
    next_frame_number: Option<u64>,
    state: NodeState,
    output: Option<Frame>,
}

impl Interpolate {
    pub fn new(factor: usize) -> Result<Self> {
        Ok(Interpolate {
            id: format!("Interpolate({factor})"),
            factor,
            interpolator: Interpolator::new(factor)?,
            next_frame_number: None,
            state: NodeState::Idle,
            output: None,
        })
    }

    pub fn for_target_rate(source_rate: f64, target_rate: f64) -> Result<Self> {
        let factor = (target_rate / source_rate).round() as usize;
        Interpolate::new(factor)
    }

    pub fn factor(&self) -> usize {
        self.factor
    }
}

impl PushNode for Interpolate {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("Interpolate({})", self.factor)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let out_format = input.format.with_sample_rate(input.format.sample_rate * self.factor as f64);
        let frame_number = self
            .next_frame_number
            .unwrap_or(input.frame_number * self.factor as u64);
        let samples = self.interpolator.process(input.real_slice());
        let n = samples.len() as u64;
        self.next_frame_number = Some(frame_number + n);
        let frame = Frame::real(out_format, frame_number, samples);
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

/// `Resample(L, M)`: polyphase chain of an interpolator by `l` feeding a
/// decimator by `m`.
#[derive(Clone, Debug)]
pub struct Resample {
    id: String,
    l: usize,
    m: usize,
    resampler: Resampler,
    next_frame_number: Option<u64>,
    state: NodeState,
    output: Option<Frame>,
}

impl Resample {
    pub fn new(l: usize, m: usize) -> Result<Self> {
        Ok(Resample {
            id: format!("Resample({l},{m})"),
            l,
            m,
            resampler: Resampler::new(l, m)?,
            next_frame_number: None,
            state: NodeState::Idle,
            output: None,
        })
    }
}

impl PushNode for Resample {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("Resample({},{})", self.l, self.m)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let out_rate = input.format.sample_rate * self.l as f64 / self.m as f64;
        let out_format = input.format.with_sample_rate(out_rate);
        let frame_number = self
            .next_frame_number
            .unwrap_or(input.frame_number * self.l as u64 / self.m as u64);
        let samples = self.resampler.process(input.real_slice());
        let n = samples.len() as u64;
        self.next_frame_number = Some(frame_number + n);
        let frame = Frame::real(out_format, frame_number, samples);
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

/// Naive zero-stuffing upsample, with no anti-imaging filter, for
/// callers that pre-filter themselves (§9 open question).
#[derive(Clone, Debug)]
pub struct Upsample {
    id: String,
    factor: usize,
    next_frame_number: Option<u64>,
    state: NodeState,
    output: Option<Frame>,
}

impl Upsample {
    pub fn new(factor: usize) -> Self {
        Upsample {
            id: format!("Upsample({factor})"),
            factor,
            next_frame_number: None,
            state: NodeState::Idle,
            output: None,
        }
    }
}

impl PushNode for Upsample {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("Upsample({})", self.factor)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let out_format = input.format.with_sample_rate(input.format.sample_rate * self.factor as f64);
        let frame_number = self
            .next_frame_number
            .unwrap_or(input.frame_number * self.factor as u64);
        let samples = upsample_naive(input.real_slice(), self.factor);
        let n = samples.len() as u64;
        self.next_frame_number = Some(frame_number + n);
        let frame = Frame::real(out_format, frame_number, samples);
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

/// Naive keep-every-nth-sample downsample, with no anti-aliasing filter.
#[derive(Clone, Debug)]
pub struct Downsample {
    id: String,
    factor: usize,
    next_frame_number: Option<u64>,
    state: NodeState,
    output: Option<Frame>,
}

impl Downsample {
    pub fn new(factor: usize) -> Self {
        Downsample {
            id: format!("Downsample({factor})"),
            factor,
            next_frame_number: None,
            state: NodeState::Idle,
            output: None,
        }
    }
}

impl PushNode for Downsample {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("Downsample({})", self.factor)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let out_format = input.format.with_sample_rate(input.format.sample_rate / self.factor as f64);
        let frame_number = self
            .next_frame_number
            .unwrap_or(input.frame_number / self.factor as u64);
        let samples = downsample_naive(input.real_slice(), self.factor);
        let n = samples.len() as u64;
        self.next_frame_number = Some(frame_number + n);
        let frame = Frame::real(out_format, frame_number, samples);
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
    fn decimate_by_two_of_dc_settles_to_dc() {
        // §8 scenario 4.
        let mut d = Decimate::new(2).unwrap();
        let input = Frame::real(fmt(), 0, vec![1.0; 4000]);
        let out = d.process_self(&input).unwrap();
        let samples = out[0].frame.real_slice();
        assert!((samples.last().copied().unwrap() - 1.0).abs() < 1e-2);
    }

    #[test]
    fn decimate_halves_the_sample_rate() {
        let mut d = Decimate::new(2).unwrap();
        let input = Frame::real(fmt(), 0, vec![1.0; 100]);
        let out = d.process_self(&input).unwrap();
        assert_eq!(out[0].frame.format.sample_rate, 4000.0);
    }

    #[test]
    fn interpolate_doubles_the_sample_rate() {
        let mut i = Interpolate::new(2).unwrap();
        let input = Frame::real(fmt(), 0, vec![1.0; 10]);
        let out = i.process_self(&input).unwrap();
        assert_eq!(out[0].frame.format.sample_rate, 16000.0);
        assert_eq!(out[0].frame.len(), 20);
    }

    #[test]
    fn unsupported_factor_is_configuration_error() {
        assert!(Decimate::new(7).is_err());
    }

    #[test]
    fn naive_upsample_then_downsample_round_trips_originals() {
        let mut up = Upsample::new(3);
        let mut down = Downsample::new(3);
        let input = Frame::real(fmt(), 0, vec![1.0, 2.0, 3.0]);
        let upped = up.process_self(&input).unwrap();
        let downed = down.process_self(&upped[0].frame).unwrap();
        assert_eq!(downed[0].frame.real_slice(), &[1.0, 2.0, 3.0]);
    }
}
