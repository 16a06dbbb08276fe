//! Frame model: the element tree a parsed program hands to the renderer
//!
//! Bitstream parsing is out of scope; these types are the parsed form.
//! A frame is immutable while it renders. Audio payloads live in asset
//! elements addressed by ID: PCM assets carry unpacked i32 samples, DLC
//! assets defer to an external decoder behind [`DlcDecoder`].

use crate::error::{RenderError, RenderResult};
use ia_core::{ChannelId, CubePosition, FrameRate, SampleRate, UseCase};
use serde::{Deserialize, Serialize};

/// Identifies an audio asset within its frame; 0 means "no audio"
pub type AudioDataId = u32;

/// Identifies an object or bed across frames
pub type MetaId = u32;

/// Decoder for DLC-coded assets (external collaborator).
///
/// A 96 kHz element asked for 48 kHz output decimates during decode.
pub trait DlcDecoder: Send + Sync {
    /// Native sample rate of the coded element
    fn sample_rate(&self) -> SampleRate;

    /// Decode into `dest`, returning the samples written
    fn decode(&self, dest: &mut [i32], target_rate: SampleRate) -> RenderResult<usize>;
}

/// Object spread (apparent size) metadata
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Spread {
    /// Point source
    #[default]
    None,
    /// 1-D spread, low resolution
    LowRes1d(f32),
    /// 1-D spread, high resolution
    HighRes1d(f32),
    /// 3-D spread; rendered as the average of the three components
    HighRes3d(f32, f32, f32),
}

impl Spread {
    /// Effective 1-D spread value, if any dimension is non-zero
    pub fn effective_1d(&self) -> Option<f32> {
        match *self {
            Spread::None => None,
            Spread::LowRes1d(s) | Spread::HighRes1d(s) => (s > 0.0).then_some(s),
            Spread::HighRes3d(x, y, z) => {
                (x > 0.0 || y > 0.0 || z > 0.0).then_some((x + y + z) / 3.0)
            }
        }
    }
}

/// Object decorrelation coefficient prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecorPrefix {
    /// No decorrelation
    #[default]
    NoDecor,
    /// Maximum decorrelation: route through the decorrelator bank
    MaxDecor,
    /// Coefficient-valued decorrelation; unsupported, treated as none
    Reserved,
}

/// Per-sub-block object panning state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSubBlock {
    /// Pan info present? Always true for the first sub-block; later
    /// blocks without it reuse the previous gains.
    pub pan_info_exists: bool,
    /// Object gain, linear
    pub gain: f32,
    pub position: CubePosition,
    pub spread: Spread,
    /// 12-bit quantized snap tolerance, when snapping is requested
    pub snap_tolerance: Option<u16>,
    /// Zone-9 gains, when zone control applies to this sub-block
    pub zone_gains: Option<[f32; 9]>,
    pub decor: DecorPrefix,
}

impl Default for ObjectSubBlock {
    fn default() -> Self {
        Self {
            pan_info_exists: true,
            gain: 1.0,
            position: CubePosition::default(),
            spread: Spread::None,
            snap_tolerance: None,
            zone_gains: None,
            decor: DecorPrefix::NoDecor,
        }
    }
}

/// An audio object with per-sub-block panning metadata
#[derive(Debug, Default)]
pub struct ObjectDefinition {
    pub meta_id: MetaId,
    pub audio_data_id: AudioDataId,
    /// Conditional elements render only when their use case matches
    pub conditional: bool,
    pub use_case: UseCase,
    pub sub_blocks: Vec<ObjectSubBlock>,
    /// Child elements; at most one activated Object child replaces this one
    pub children: Vec<Element>,
}

/// One channel of a bed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedChannel {
    pub id: ChannelId,
    pub gain: f32,
    pub audio_data_id: AudioDataId,
}

/// A channel bed
#[derive(Debug, Default)]
pub struct BedDefinition {
    pub meta_id: MetaId,
    pub conditional: bool,
    pub use_case: UseCase,
    pub channels: Vec<BedChannel>,
    /// At most one activated Bed child replaces this bed; an activated
    /// Remap child renders it through its coefficient matrix instead
    pub children: Vec<Element>,
}

/// Remap coefficients for one destination channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemapCoeff {
    pub destination: ChannelId,
    /// One coefficient per source channel
    pub gains: Vec<f32>,
}

/// Per-sub-block remap state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemapSubBlock {
    /// When false, the previous sub-block's coefficients carry forward
    pub remap_info_exists: bool,
    pub coeffs: Vec<RemapCoeff>,
}

/// Bed remap: re-matrix a parent bed toward a different channel set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BedRemap {
    pub use_case: UseCase,
    pub source_channel_count: usize,
    pub destination_channel_count: usize,
    pub sub_blocks: Vec<RemapSubBlock>,
}

/// PCM audio asset, already unpacked to i32 samples
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioDataPcm {
    pub id: AudioDataId,
    pub samples: Vec<i32>,
}

/// DLC-coded audio asset with its external decoder
pub struct AudioDataDlc {
    pub id: AudioDataId,
    pub decoder: Box<dyn DlcDecoder>,
}

impl std::fmt::Debug for AudioDataDlc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDataDlc")
            .field("id", &self.id)
            .field("sample_rate", &self.decoder.sample_rate())
            .finish()
    }
}

/// Reserved 19-zone object zone definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectZone19 {
    pub meta_id: MetaId,
}

/// A frame sub-element (closed sum; exhaustive matching replaces RTTI)
#[derive(Debug)]
pub enum Element {
    Object(ObjectDefinition),
    Bed(BedDefinition),
    /// Valid only as a bed child
    Remap(BedRemap),
    AudioPcm(AudioDataPcm),
    AudioDlc(AudioDataDlc),
    /// Reserved; rendering one is an explicit error
    ObjectZone19(ObjectZone19),
}

/// A program frame: rates plus the sub-element list, immutable while
/// rendering
#[derive(Debug)]
pub struct Frame {
    pub frame_rate: FrameRate,
    pub sample_rate: SampleRate,
    pub elements: Vec<Element>,
}

impl Frame {
    pub fn new(frame_rate: FrameRate, sample_rate: SampleRate) -> Self {
        Self {
            frame_rate,
            sample_rate,
            elements: Vec::new(),
        }
    }

    /// Decode the asset with the given ID into `dest` (i32 domain).
    ///
    /// Returns the samples written; PCM assets must match the frame
    /// length exactly.
    pub fn decode_asset(
        &self,
        id: AudioDataId,
        target_rate: SampleRate,
        dest: &mut [i32],
    ) -> RenderResult<usize> {
        if id == 0 {
            return Err(RenderError::BadArguments("audio data id 0 has no asset"));
        }

        for element in &self.elements {
            match element {
                Element::AudioPcm(pcm) if pcm.id == id => {
                    if pcm.samples.len() != dest.len() {
                        return Err(RenderError::SampleCountMismatch {
                            expected: dest.len(),
                            got: pcm.samples.len(),
                        });
                    }
                    dest.copy_from_slice(&pcm.samples);
                    return Ok(dest.len());
                }
                Element::AudioDlc(dlc) if dlc.id == id => {
                    let written = dlc.decoder.decode(dest, target_rate)?;
                    if written != dest.len() {
                        return Err(RenderError::SampleCountMismatch {
                            expected: dest.len(),
                            got: written,
                        });
                    }
                    return Ok(written);
                }
                _ => {}
            }
        }

        Err(RenderError::BadArguments("audio data id not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spread_effective_value() {
        assert_eq!(Spread::None.effective_1d(), None);
        assert_eq!(Spread::LowRes1d(0.0).effective_1d(), None);
        assert_eq!(Spread::HighRes1d(0.4).effective_1d(), Some(0.4));

        // 3-D spread averages to 1-D.
        let s = Spread::HighRes3d(0.3, 0.6, 0.0).effective_1d().unwrap();
        assert!((s - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_decode_pcm_asset() {
        let mut frame = Frame::new(FrameRate::Fps24, SampleRate::Hz48000);
        frame.elements.push(Element::AudioPcm(AudioDataPcm {
            id: 1,
            samples: vec![7; 2000],
        }));

        let mut dest = vec![0i32; 2000];
        let n = frame.decode_asset(1, SampleRate::Hz48000, &mut dest).unwrap();
        assert_eq!(n, 2000);
        assert!(dest.iter().all(|&v| v == 7));
    }

    #[test]
    fn test_decode_length_mismatch() {
        let mut frame = Frame::new(FrameRate::Fps24, SampleRate::Hz48000);
        frame.elements.push(Element::AudioPcm(AudioDataPcm {
            id: 1,
            samples: vec![0; 100],
        }));

        let mut dest = vec![0i32; 2000];
        assert!(matches!(
            frame.decode_asset(1, SampleRate::Hz48000, &mut dest),
            Err(RenderError::SampleCountMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_unknown_id() {
        let frame = Frame::new(FrameRate::Fps24, SampleRate::Hz48000);
        let mut dest = vec![0i32; 16];
        assert!(frame.decode_asset(5, SampleRate::Hz48000, &mut dest).is_err());
        assert!(frame.decode_asset(0, SampleRate::Hz48000, &mut dest).is_err());
    }
}
