//! The transform backbone: FFT, DCT, constant-Q, and Griffin-Lim phase
//! recovery. These are hand-rolled rather than delegated to an FFT crate
//! because the constant-Q kernel and Bluestein path both need direct
//! control over the intermediate complex buffers.

pub mod cqt;
pub mod dct;
pub mod fft;
pub mod griffinlim;

pub use cqt::ConstantQ;
pub use dct::Dct;
pub use fft::Fft;
pub use griffinlim::GriffinLim;
