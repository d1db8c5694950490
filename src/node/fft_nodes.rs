//! Push-node wrappers around the transform backbone: forward/inverse FFT
//! and DCT-II (§4.4). All three are mono-only; multichannel input is a
//! configuration error raised on first frame.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::{Error, Result};
use crate::frame::{Frame, Kind};
use crate::transform::{Dct, Fft};

fn require_mono(channels: u32) -> Result<()> {
    if channels != 1 {
        return Err(Error::configuration(format!(
            "transform requires mono input, got {channels} channels"
        )));
    }
    Ok(())
}

/// How an FFT/DCT's length is determined (§4.4): fixed at construction,
/// deduced from the first buffer seen, or deduced from a required Hz
/// resolution.
#[derive(Clone, Copy, Debug)]
pub enum SizeSpec {
    Fixed(usize),
    FromFirstBuffer,
    Resolution(f64),
}

/// Forward FFT, emitting a [`Kind::Linear`] spectrum frame.
#[derive(Clone, Debug)]
pub struct FftNode {
    id: String,
    size: SizeSpec,
    fft: Option<Fft>,
    state: NodeState,
    output: Option<Frame>,
}

impl FftNode {
    pub fn new(size: SizeSpec) -> Self {
        FftNode {
            id: "Fft".to_string(),
            size,
            fft: None,
            state: NodeState::Idle,
            output: None,
        }
    }

    fn resolve(&mut self, input: &Frame) -> Result<Fft> {
        if let Some(fft) = self.fft {
            return Ok(fft);
        }
        let fft = match self.size {
            SizeSpec::Fixed(n) => Fft::new(n)?,
            SizeSpec::FromFirstBuffer => Fft::new(input.len())?,
            SizeSpec::Resolution(hz) => Fft::for_resolution(input.format.sample_rate, hz)?,
        };
        self.fft = Some(fft);
        Ok(fft)
    }
}

impl PushNode for FftNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("Fft({:?})", (self.size.fixed_or_zero()))
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        require_mono(input.format.channels)?;
        let fft = self.resolve(input)?;
        let (re, im) = fft.forward_real(input.real_slice())?;
        let frame = Frame::spectrum(Kind::Linear, input.format, input.frame_number, re, im)?;
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

impl SizeSpec {
    fn fixed_or_zero(self) -> usize {
        match self {
            SizeSpec::Fixed(n) => n,
            _ => 0,
        }
    }
}

/// Inverse FFT: the forward kernel with conjugation and `1/n` scaling,
/// emitting a [`Kind::Complex`] time-domain frame.
#[derive(Clone, Debug)]
pub struct IfftNode {
    id: String,
    state: NodeState,
    output: Option<Frame>,
}

impl IfftNode {
    pub fn new() -> Self {
        IfftNode {
            id: "Ifft".to_string(),
            state: NodeState::Idle,
            output: None,
        }
    }
}

impl Default for IfftNode {
    fn default() -> Self {
        IfftNode::new()
    }
}

impl PushNode for IfftNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        "Ifft".to_string()
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        require_mono(input.format.channels)?;
        let fft = Fft::new(input.len())?;
        let (re, im) = fft.inverse(input.real_slice(), input.imag_slice())?;
        let frame = Frame::complex(input.format, input.frame_number, re, im)?;
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

/// DCT-II via a `2N`-point FFT (§4.4).
#[derive(Clone, Debug)]
pub struct DctNode {
    id: String,
    size: SizeSpec,
    dct: Option<Dct>,
    state: NodeState,
    output: Option<Frame>,
}

impl DctNode {
    pub fn new(size: SizeSpec) -> Self {
        DctNode {
            id: "Dct".to_string(),
            size,
            dct: None,
            state: NodeState::Idle,
            output: None,
        }
    }

    fn resolve(&mut self, input: &Frame) -> Result<Dct> {
        if let Some(dct) = self.dct {
            return Ok(dct);
        }
        let dct = match self.size {
            SizeSpec::Fixed(n) => Dct::new(n)?,
            SizeSpec::FromFirstBuffer => Dct::new(input.len())?,
            SizeSpec::Resolution(hz) => Dct::for_resolution(input.format.sample_rate, hz)?,
        };
        self.dct = Some(dct);
        Ok(dct)
    }
}

impl PushNode for DctNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("Dct({:?})", self.size.fixed_or_zero())
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        require_mono(input.format.channels)?;
        let dct = self.resolve(input)?;
        let coeffs = dct.forward(input.real_slice())?;
        let frame = Frame::real(input.format, input.frame_number, coeffs);
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
