//! ia-dsp: Sample-domain kernels for the Corven immersive-audio renderer
//!
//! ## Modules
//! - `vector` - Bulk float operations (add/mul/ramp/fill) behind a
//!   per-instance capability report
//! - `gains` - Per-entity channel-gain application with slope-capped
//!   linear smoothing and cross-frame gain history
//! - `decorr` - Fixed per-channel decorrelator bank (delay + all-pass)

pub mod decorr;
pub mod gains;
pub mod vector;

pub use decorr::DecorrelatorBank;
pub use gains::{ChannelGainsProcessor, GainsError, GainsResult};
pub use vector::{KernelLevel, VectorDsp};
