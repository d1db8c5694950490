//! The central frame abstraction: one multichannel sample, or one spectral
//! slice, indexed by a monotone frame counter.
//!
//! The original design this crate implements distinguishes real, complex,
//! linear/log/mel/multi-band spectrum, and instantaneous-frequency frames
//! by subclassing. Here they collapse into a single [`Frame`] carrying a
//! [`Kind`] tag, a real array, an optional imaginary array, and lazily
//! computed magnitude/power caches. The tag carries exactly the
//! kind-specific metadata (bin center frequencies, mel boundaries, constant
//! Q, ...) each spectral variety needs.

mod zero_cache;

pub use zero_cache::zeros;

use crate::error::{Error, Result};
use crate::format::AudioFormat;
use std::sync::OnceLock;

/// The kind of data a [`Frame`] carries, plus whatever metadata is
/// specific to that kind.
#[derive(Clone, Debug)]
pub enum Kind {
    /// Time-domain PCM samples. The imaginary view is logically all-zero.
    Real,
    /// Time-domain complex pair.
    Complex,
    /// Linear spectrum: bin `k` corresponds to frequency `k * sr / n`.
    Linear,
    /// Log-frequency spectrum with explicit per-bin center frequencies and
    /// a constant Q.
    Log { center_freqs_hz: Vec<f64>, q: f64 },
    /// Mel-scale spectrum with triangular-filter bin boundaries in Hz.
    Mel { boundaries_hz: Vec<f64> },
    /// Multi-band (rectangular summation) spectrum with bin boundaries in
    /// Hz.
    MultiBand { boundaries_hz: Vec<f64> },
    /// Per-bin instantaneous frequency in Hz, derived from two successive
    /// linear spectra.
    InstantaneousFrequency,
}

impl Kind {
    pub fn is_spectrum(&self) -> bool {
        !matches!(self, Kind::Real | Kind::Complex)
    }
}

/// One frame flowing through the graph.
///
/// `real` and `imag` (when present) always have equal length (§3
/// invariant). Magnitude and power are write-once caches computed from
/// `real`/`imag` on first access and are consistent with
/// `mag = sqrt(re^2 + im^2)`.
#[derive(Clone, Debug)]
pub struct Frame {
    pub kind: Kind,
    pub format: AudioFormat,
    pub frame_number: u64,
    real: Vec<f32>,
    imag: Option<Vec<f32>>,
    magnitude: OnceLock<Vec<f32>>,
    power: OnceLock<Vec<f32>>,
}

impl Frame {
    /// Construct a real (time-domain) frame. The imaginary view is
    /// logically all-zero and materialized lazily from the shared zero
    /// cache on demand.
    pub fn real(format: AudioFormat, frame_number: u64, samples: Vec<f32>) -> Self {
        Frame {
            kind: Kind::Real,
            format,
            frame_number,
            real: samples,
            imag: None,
            magnitude: OnceLock::new(),
            power: OnceLock::new(),
        }
    }

    /// Construct a complex time-domain frame.
    pub fn complex(
        format: AudioFormat,
        frame_number: u64,
        real: Vec<f32>,
        imag: Vec<f32>,
    ) -> Result<Self> {
        if real.len() != imag.len() {
            return Err(Error::invariant(
                "complex frame real/imaginary length mismatch",
            ));
        }
        Ok(Frame {
            kind: Kind::Complex,
            format,
            frame_number,
            real,
            imag: Some(imag),
            magnitude: OnceLock::new(),
            power: OnceLock::new(),
        })
    }

    /// Construct a spectral frame of the given `kind` from `(real, imag)`
    /// bin arrays.
    pub fn spectrum(
        kind: Kind,
        format: AudioFormat,
        frame_number: u64,
        real: Vec<f32>,
        imag: Vec<f32>,
    ) -> Result<Self> {
        if real.len() != imag.len() {
            return Err(Error::invariant("spectrum real/imaginary length mismatch"));
        }
        Ok(Frame {
            kind,
            format,
            frame_number,
            real,
            imag: Some(imag),
            magnitude: OnceLock::new(),
            power: OnceLock::new(),
        })
    }

    /// Number of samples/bins.
    pub fn len(&self) -> usize {
        self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    pub fn real_slice(&self) -> &[f32] {
        &self.real
    }

    pub fn real_slice_mut(&mut self) -> &mut [f32] {
        self.invalidate_caches();
        &mut self.real
    }

    /// The imaginary view. For a [`Kind::Real`] frame this materializes
    /// (and shares, via the process-wide cache) a zero vector the first
    /// time it is requested.
    pub fn imag_slice(&self) -> &[f32] {
        match &self.imag {
            Some(v) => v,
            None => zeros(self.real.len()),
        }
    }

    pub fn has_explicit_imag(&self) -> bool {
        self.imag.is_some()
    }

    pub fn timestamp(&self) -> f64 {
        self.frame_number as f64 / self.format.sample_rate
    }

    /// Per-bin magnitude, `sqrt(re^2 + im^2)`, computed once and cached.
    pub fn magnitudes(&self) -> &[f32] {
        self.magnitude.get_or_init(|| {
            let imag = self.imag_slice();
            self.real
                .iter()
                .zip(imag.iter())
                .map(|(re, im)| (re * re + im * im).sqrt())
                .collect()
        })
    }

    /// Per-bin power, `re^2 + im^2`, computed once and cached.
    pub fn powers(&self) -> &[f32] {
        self.power.get_or_init(|| {
            let imag = self.imag_slice();
            self.real
                .iter()
                .zip(imag.iter())
                .map(|(re, im)| re * re + im * im)
                .collect()
        })
    }

    /// Overwrite this frame's contents in place (the "reuse" pattern, see
    /// §3 Ownership): a node may keep emitting the same `Frame` object
    /// across calls provided children do not retain it past `process`.
    pub fn reuse_real(&mut self, frame_number: u64, samples: Vec<f32>) {
        self.kind = Kind::Real;
        self.frame_number = frame_number;
        self.real = samples;
        self.imag = None;
        self.invalidate_caches();
    }

    pub fn reuse_spectrum(
        &mut self,
        kind: Kind,
        frame_number: u64,
        real: Vec<f32>,
        imag: Vec<f32>,
    ) -> Result<()> {
        if real.len() != imag.len() {
            return Err(Error::invariant("spectrum real/imaginary length mismatch"));
        }
        self.kind = kind;
        self.frame_number = frame_number;
        self.real = real;
        self.imag = Some(imag);
        self.invalidate_caches();
        Ok(())
    }

    fn invalidate_caches(&mut self) {
        self.magnitude = OnceLock::new();
        self.power = OnceLock::new();
    }

    /// Bin center frequency for a linear spectrum of this frame's length,
    /// `bin * sr / n`. Valid for [`Kind::Linear`] and
    /// [`Kind::InstantaneousFrequency`] frames.
    pub fn linear_bin_hz(&self, bin: usize) -> f64 {
        bin as f64 * self.format.sample_rate / self.len() as f64
    }
}
