//! Convenience re-exports of the crate's most commonly used types.

pub use crate::error::{Error, Result};
pub use crate::format::{AudioFormat, Encoding, Endian};
pub use crate::frame::{Frame, Kind as FrameKind};
pub use crate::graph::{Canceller, Pump, PumpOutcome, PumpResults};
pub use crate::matrix::{Backing, DenseMatrix, Matrix, SparseMatrix, SymmetricBandedMatrix, SymmetricMatrix};
pub use crate::node::aggregate::{Aggregate, AggregateFn};
pub use crate::node::bandsplit::BandSplit;
pub use crate::node::channel::{ChannelSelect, ChannelSplit};
pub use crate::node::downmix::Downmix;
pub use crate::node::fft_nodes::{DctNode, FftNode, IfftNode, SizeSpec};
pub use crate::node::framefilter::{FrameFilter, FrameFilterMode};
pub use crate::node::instfreq::InstantaneousFrequency;
pub use crate::node::join::{Join, JoinFn};
pub use crate::node::map::{Map, MapFn};
pub use crate::node::novelty::{CheckerboardKernel, Novelty};
pub use crate::node::onset::OnsetStrength;
pub use crate::node::overlap_add::OverlapAdd;
pub use crate::node::resample::{Decimate, Downsample, Interpolate, Resample, Upsample};
pub use crate::node::selfsimilarity::SelfSimilarity;
pub use crate::node::spectral::{ConstantQNode, Mel, MultiBand};
pub use crate::node::window::{SlidingWindow, SlidingWindowPull};
pub use crate::node::zeropad::{Truncation, ZeroPad};
pub use crate::node::{ChildSlot, Emission, Frag, NodeState, Output, Pipeline, PullNode, PushNode};
pub use crate::numeric::{Distance, Window};
pub use crate::source::{PcmByteSource, ReadOutcome, SignalSource, VecSource};
pub use crate::transform::{ConstantQ, Dct, Fft, GriffinLim};

#[cfg(feature = "decode")]
pub use crate::source::decode::SymphoniaSource;
