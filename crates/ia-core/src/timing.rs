//! Frame timing: frame rates, per-frame sample counts, pan sub-block layout

use crate::SampleRate;

/// Program frame rates
///
/// The full ST 2098-2 set is representable; only a subset is renderable
/// (see [`FrameRate::is_supported`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FrameRate {
    Fps23_976,
    Fps24,
    Fps25,
    Fps30,
    Fps48,
    Fps50,
    Fps60,
    Fps96,
    Fps100,
    Fps120,
}

/// Per-sub-block sample counts for 23.976 fps at 48 kHz.
///
/// 48000 / 23.976 is fractional; the bitstream fixes the frame at 6403
/// samples, split into eight uneven sub-blocks.
pub const SUBBLOCK_SIZES_23_976_48K: [usize; 8] = [801, 801, 801, 801, 801, 801, 800, 797];

impl FrameRate {
    /// Samples per frame per channel at the given sample rate
    pub fn samples_per_frame(self, sample_rate: SampleRate) -> usize {
        let at_48k = match self {
            Self::Fps23_976 => SUBBLOCK_SIZES_23_976_48K.iter().sum(),
            Self::Fps24 => 2000,
            Self::Fps25 => 1920,
            Self::Fps30 => 1600,
            Self::Fps48 => 1000,
            Self::Fps50 => 960,
            Self::Fps60 => 800,
            Self::Fps96 => 500,
            Self::Fps100 => 480,
            Self::Fps120 => 400,
        };

        match sample_rate {
            SampleRate::Hz48000 => at_48k,
            SampleRate::Hz96000 => at_48k * 2,
        }
    }

    /// Number of pan sub-blocks per frame
    pub fn num_sub_blocks(self) -> usize {
        match self {
            Self::Fps23_976 | Self::Fps24 | Self::Fps25 | Self::Fps30 => 8,
            Self::Fps48 | Self::Fps50 | Self::Fps60 => 4,
            Self::Fps96 | Self::Fps100 | Self::Fps120 => 2,
        }
    }

    /// Whether the renderer supports this frame rate at the given sample rate.
    ///
    /// 48 kHz: 23.976, 24, 25, 30, 48, 60 and 120 fps.
    /// 96 kHz: 24 and 48 fps only (rendered decimated to 48 kHz).
    pub fn is_supported(self, sample_rate: SampleRate) -> bool {
        match sample_rate {
            SampleRate::Hz48000 => matches!(
                self,
                Self::Fps23_976
                    | Self::Fps24
                    | Self::Fps25
                    | Self::Fps30
                    | Self::Fps48
                    | Self::Fps60
                    | Self::Fps120
            ),
            SampleRate::Hz96000 => matches!(self, Self::Fps24 | Self::Fps48),
        }
    }
}

/// Sub-block schedule for one frame: per-block sample counts and start offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubBlockSchedule {
    pub counts: Vec<usize>,
    pub offsets: Vec<usize>,
}

impl SubBlockSchedule {
    /// Build the schedule for a frame-rate / frame-length combination.
    ///
    /// `frame_samples` must already account for 96 kHz decimation; uniform
    /// rates divide it evenly, 23.976 fps uses the fixed table.
    pub fn new(frame_rate: FrameRate, frame_samples: usize) -> Self {
        let n = frame_rate.num_sub_blocks();
        let counts: Vec<usize> = if frame_rate == FrameRate::Fps23_976 {
            SUBBLOCK_SIZES_23_976_48K.to_vec()
        } else {
            vec![frame_samples / n; n]
        };

        let mut offsets = Vec::with_capacity(n);
        let mut acc = 0;
        for &c in &counts {
            offsets.push(acc);
            acc += c;
        }

        Self { counts, offsets }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
