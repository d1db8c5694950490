//! Onset strength curve (§4.6): per incoming linear spectrum, bins in
//! `[f_lo, f_hi]` whose power rose by more than `increase_factor` since
//! the previous frame contribute `log(P(t)+1) - log(P(t-1)+1)` to that
//! frame's sample; the average over in-band bins is one point on the
//! curve. The whole curve is buffered and only emitted, max-normalized,
//! on `flush`, at the decimated rate `sr / hop`.

use super::{ChildSlot, Emission, NodeState, Output, PushNode};
use crate::error::{Error, Result};
use crate::format::AudioFormat;
use crate::frame::Frame;
use crate::numeric::aggregate::normalize_max_in_place;

#[derive(Clone, Debug)]
pub struct OnsetStrength {
    id: String,
    f_lo: f64,
    f_hi: f64,
    hop: u64,
    increase_factor: f32,
    previous_power: Option<Vec<f32>>,
    curve: Vec<f32>,
    format: Option<AudioFormat>,
    state: NodeState,
    output: Option<Frame>,
}

impl OnsetStrength {
    pub fn new(f_lo: f64, f_hi: f64, hop: u64, increase_factor: f32) -> Result<Self> {
        if !(f_lo >= 0.0 && f_hi > f_lo) || hop == 0 {
            log::warn!("OnsetStrength rejecting configuration: f_lo={f_lo} f_hi={f_hi} hop={hop}");
            return Err(Error::configuration(
                "onset strength requires 0 <= f_lo < f_hi and a nonzero hop",
            ));
        }
        Ok(OnsetStrength {
            id: format!("OnsetStrength({f_lo},{f_hi},{hop},{increase_factor})"),
            f_lo,
            f_hi,
            hop,
            increase_factor,
            previous_power: None,
            curve: Vec::new(),
            format: None,
            state: NodeState::Idle,
            output: None,
        })
    }
}

impl PushNode for OnsetStrength {
    fn id(&self) -> &str {
        &self.id
    }

    fn structural_key(&self) -> String {
        format!(
            "OnsetStrength({},{},{},{})",
            self.f_lo, self.f_hi, self.hop, self.increase_factor
        )
    }

    fn state(&self) -> NodeState {
        self.state
    }

    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>> {
        self.state = NodeState::Running;
        if self.format.is_none() {
            self.format = Some(input.format);
        }
        let powers = input.powers().to_vec();
        if let Some(previous) = &self.previous_power {
            let mut sum = 0f32;
            let mut count = 0usize;
            for (k, &p) in powers.iter().enumerate() {
                let f = input.linear_bin_hz(k);
                if f < self.f_lo || f > self.f_hi {
                    continue;
                }
                count += 1;
                let prior = previous[k];
                if p > self.increase_factor * prior {
                    sum += (p + 1.0).ln() - (prior + 1.0).ln();
                }
            }
            self.curve.push(if count > 0 { sum / count as f32 } else { 0.0 });
        }
        self.previous_power = Some(powers);
        Ok(Vec::new())
    }

    fn flush_self(&mut self) -> Result<Vec<Emission>> {
        if self.state == NodeState::Flushed {
            return Ok(Vec::new());
        }
        self.state = NodeState::Flushed;
        let Some(format) = self.format else {
            return Ok(Vec::new());
        };
        normalize_max_in_place(&mut self.curve);
        let decimated = format.with_sample_rate(format.sample_rate / self.hop as f64);
        let frame = Frame::real(decimated, 0, self.curve.clone());
        self.output = Some(frame.clone());
        Ok(vec![Emission::single(frame)])
    }

    fn output(&self) -> Option<Output> {
        self.output.clone().map(Output::Frame)
    }
}
