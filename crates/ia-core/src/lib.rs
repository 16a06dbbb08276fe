//! ia-core: Shared types and tables for the Corven immersive-audio renderer
//!
//! This crate provides the foundational types used across the renderer
//! crates: sample/rate primitives, frame timing tables, 3-D geometry, and
//! the bed-channel identity table.

mod channel;
mod timing;
mod vector3;

pub use channel::*;
pub use timing::*;
pub use vector3::*;

/// Audio sample type used throughout the renderer
pub type Sample = f32;

/// Tolerance used by the panner and coordinate conversions
pub const EPSILON: f32 = 1e-6;

/// Largest number of samples a frame can carry per channel
/// (23.976 fps at 48 kHz)
pub const MAX_FRAME_SAMPLES: usize = 6403;

/// Largest number of samples a pan sub-block can carry
pub const MAX_SUBBLOCK_SAMPLES: usize = 801;

/// Scale factor converting decoded i32 audio to f32 in [-1, 1)
pub const INT32_SCALE: f32 = 2_147_483_648.0;

/// Supported program sample rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u32)]
pub enum SampleRate {
    Hz48000 = 48_000,
    Hz96000 = 96_000,
}

impl SampleRate {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self as u32 as f64
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::Hz48000
    }
}
