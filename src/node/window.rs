//! `SlidingWindow(L, H)` (§4.3): overlapping frames of length `L` with
//! hop `H <= L`. The windowing logic itself lives in [`WindowAccumulator`]
//! so both the push node below and [`SlidingWindowPull`] share it rather
//! than duplicating the fill/drain bookkeeping.

use super::{ChildSlot, Emission, NodeState, Output, PullNode, PushNode};
use crate::error::{Error, Result};
use crate::format::AudioFormat;
use crate::frame::Frame;

/// Accumulates samples and slices off length-`L` windows at hop `H`,
/// independent of whether it is driven by push or pull.
#[derive(Clone, Debug)]
struct WindowAccumulator {
    length: usize,
    hop: usize,
    pending: Vec<f32>,
    pending_start: Option<u64>,
    format: Option<AudioFormat>,
    drained: bool,
}

impl WindowAccumulator {
    fn new(length: usize, hop: usize) -> Result<Self> {
        if length == 0 || hop == 0 || hop > length {
            log::warn!("SlidingWindow rejecting configuration: length={length} hop={hop}");
            return Err(Error::configuration(format!(
                "sliding window requires 0 < hop <= length, got length={length} hop={hop}"
            )));
        }
        Ok(WindowAccumulator {
            length,
            hop,
            pending: Vec::new(),
            pending_start: None,
            format: None,
            drained: true,
        })
    }

    /// Feed one input frame, returning every window that became complete.
    fn push(&mut self, input: &Frame) -> Vec<Frame> {
        self.format = Some(input.format);
        if self.pending_start.is_none() {
            self.pending_start = Some(input.frame_number);
        }
        self.pending.extend_from_slice(input.real_slice());
        self.drained = self.pending.is_empty();
        self.drain_full_windows()
    }

    fn drain_full_windows(&mut self) -> Vec<Frame> {
        let mut out = Vec::new();
        while self.pending.len() >= self.length {
            let window = self.pending[..self.length].to_vec();
            let frame_number = self.pending_start.unwrap_or(0);
            out.push(Frame::real(self.format.unwrap(), frame_number, window));
            self.pending.drain(..self.hop);
            self.pending_start = Some(frame_number + self.hop as u64);
        }
        out
    }

    /// Zero-pad and emit the residual window once, then mark drained so a
    /// second call is a no-op (flush idempotence).
    fn flush(&mut self) -> Option<Frame> {
        if self.drained || self.pending.is_empty() {
            self.drained = true;
            return None;
        }
        let format = self.format?;
        let mut window = self.pending.clone();
        window.resize(self.length, 0.0);
        let frame_number = self.pending_start.unwrap_or(0);
        self.pending.clear();
        self.drained = true;
        Some(Frame::real(format, frame_number, window))
    }
}

/// Push-mode sliding window: accumulates into an internal buffer and
/// emits whenever fill reaches `L`, advancing the buffer by `H` each
/// time.
#[derive(Clone, Debug)]
pub struct SlidingWindow {
    id: String,
    acc: WindowAccumulator,
    state: NodeState,
    output: Option<Frame>,
}

impl SlidingWindow {
    pub fn new(length: usize, hop: usize) -> Result<Self> {
        Ok(SlidingWindow {
            id: format!("SlidingWindow({length},{hop})"),
            acc: WindowAccumulator::new(length, hop)?,
            state: NodeState::Idle,
            output: None,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn set_slice_length(&mut self, length: usize) -> Result<()> {
        self.acc = WindowAccumulator::new(length, self.acc.hop)?;
        Ok(())
    }

    pub fn set_hop_size(&mut self, hop: usize) -> Result<()> {
        self.acc = WindowAccumulator::new(self.acc.length, hop)?;
        Ok(())
    }

    pub fn length(&self) -> usize {
        self.acc.length
    }

    pub fn hop(&self) -> usize {
        self.acc.hop
    }
}

impl PushNode for SlidingWindow {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!("SlidingWindow({},{})", self.acc.length, self.acc.hop)
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        let windows = self.acc.push(input);
        if let Some(last) = windows.last() {
            self.output = Some(last.clone());
        }
        Ok(windows.into_iter().map(Emission::single).collect())
    }

    fn flush_self(&mut self) -> Result<Vec<Emission>> {
        if self.state == NodeState::Flushed {
            return Ok(Vec::new());
        }
        let residual = self.acc.flush();
        self.state = NodeState::Flushed;
        if let Some(frame) = &residual {
            self.output = Some(frame.clone());
        }
        Ok(residual.into_iter().map(Emission::single).collect())
    }

    fn output(&self) -> Option<Output> {
        self.output.clone().map(Output::Frame)
    }
}

/// Pull-mode sliding window (§4.3 "pull mode mirrors this"): reads from
/// an upstream pull source on demand instead of being pushed into.
pub struct SlidingWindowPull {
    acc: WindowAccumulator,
    source: Box<dyn PullNode>,
    upstream_exhausted: bool,
    ready: std::collections::VecDeque<Frame>,
}

impl SlidingWindowPull {
    pub fn new(length: usize, hop: usize, source: Box<dyn PullNode>) -> Result<Self> {
        Ok(SlidingWindowPull {
            acc: WindowAccumulator::new(length, hop)?,
            source,
            upstream_exhausted: false,
            ready: std::collections::VecDeque::new(),
        })
    }

    pub fn get_source(&self) -> &dyn PullNode {
        self.source.as_ref()
    }
}

impl PullNode for SlidingWindowPull {
    fn read(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Ok(Some(frame));
            }
            if self.upstream_exhausted {
                return Ok(self.acc.flush());
            }
            match self.source.read()? {
                Some(input) => self.ready.extend(self.acc.push(&input)),
                None => self.upstream_exhausted = true,
            }
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.source.reset()?;
        self.acc = WindowAccumulator::new(self.acc.length, self.acc.hop)?;
        self.upstream_exhausted = false;
        self.ready.clear();
        Ok(())
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
    fn rejects_hop_greater_than_length() {
        assert!(SlidingWindow::new(4, 5).is_err());
    }

    #[test]
    fn emits_a_window_once_full() {
        let mut w = SlidingWindow::new(4, 4).unwrap();
        let input = Frame::real(fmt(), 0, vec![1.0, 2.0, 3.0, 4.0]);
        let out = w.process_self(&input).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].frame.real_slice(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out[0].frame.frame_number, 0);
    }

    #[test]
    fn non_overlapping_windows_concatenate_with_zero_tail() {
        // §8: hop == length -> output frames concatenate to the input
        // plus a zero tail shorter than `length`.
        let mut w = SlidingWindow::new(3, 3).unwrap();
        let input = Frame::real(fmt(), 0, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut out: Vec<f32> = w
            .process_self(&input)
            .unwrap()
            .into_iter()
            .flat_map(|e| e.frame.real_slice().to_vec())
            .collect();
        out.extend(w.flush_self().unwrap().into_iter().flat_map(|e| e.frame.real_slice().to_vec()));
        assert_eq!(out, vec![1.0, 2.0, 3.0, 4.0, 5.0, 0.0]);
    }

    #[test]
    fn flush_is_idempotent() {
        let mut w = SlidingWindow::new(4, 2).unwrap();
        let input = Frame::real(fmt(), 0, vec![1.0, 2.0, 3.0]);
        w.process_self(&input).unwrap();
        let first = w.flush_self().unwrap();
        assert!(!first.is_empty());
        let second = w.flush_self().unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn overlapping_hop_advances_frame_number_by_hop() {
        let mut w = SlidingWindow::new(4, 2).unwrap();
        let input = Frame::real(fmt(), 0, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let out = w.process_self(&input).unwrap();
        assert_eq!(out[0].frame.frame_number, 0);
        assert_eq!(out[1].frame.frame_number, 2);
    }
}
