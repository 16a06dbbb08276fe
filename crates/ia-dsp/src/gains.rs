//! Per-entity channel-gain application with smoothing
//!
//! Every rendered entity (object, or bed channel routed as one) carries a
//! per-output-channel gain vector per sub-block. This processor applies
//! those gains to mono input samples, accumulating into the output
//! channels, and smooths gain changes across sub-block boundaries with a
//! slope-capped linear ramp.
//!
//! Gain history is keyed by entity ID and survives across frames: the
//! gains reached at the end of one sub-block are the ramp start of the
//! next. Entries not touched during a frame are evicted at the next frame
//! boundary.

use crate::vector::VectorDsp;
use ia_core::{MAX_FRAME_SAMPLES, Sample};
use std::collections::HashMap;
use thiserror::Error;

/// Maximum smoothing ramp length in samples
pub const MAX_RAMP_SAMPLES: usize = 4800;

/// Maximum per-sample gain change (full range in 480 samples, ~10 ms at
/// 48 kHz; tuned by listening tests)
pub const MAX_SLOPE: f32 = 1.0 / 480.0;

/// Ramp length used whenever the slope had to be capped
pub const MAX_SLOPE_RAMP_SAMPLES: usize = 480;

/// Gain-processor error kinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GainsError {
    #[error("bad arguments: {0}")]
    BadArguments(&'static str),

    #[error("smoothing ramp period is zero")]
    DivisionByZero,
}

pub type GainsResult<T> = Result<T, GainsError>;

/// Channel gains reached by an entity at the end of its last sub-block
#[derive(Debug, Clone, Default)]
struct GainHistory {
    gains: Vec<Sample>,
    /// Whether the entity was rendered in the current frame
    touched: bool,
    /// Whether any gains were ever written for the entity
    valid: bool,
}

/// Applies per-channel gains to mono input, with cross-sub-block smoothing
#[derive(Debug)]
pub struct ChannelGainsProcessor {
    dsp: VectorDsp,
    history: HashMap<u32, GainHistory>,
    /// Per-sample gain curve scratch, one sub-block (at most one frame) long
    smoothed: Vec<Sample>,
    /// Gain-applied input scratch
    applied: Vec<Sample>,
}

impl ChannelGainsProcessor {
    pub fn new() -> Self {
        Self {
            dsp: VectorDsp::new(),
            history: HashMap::new(),
            smoothed: vec![0.0; MAX_FRAME_SAMPLES],
            applied: vec![0.0; MAX_FRAME_SAMPLES],
        }
    }

    /// Apply `target_gains` to `input`, accumulating into
    /// `outputs[channel][offset .. offset + input.len()]`.
    ///
    /// With smoothing enabled, gains ramp linearly from the entity's
    /// previous gains toward the targets, capped at [`MAX_SLOPE`] per
    /// sample. The gains reached at the last sample are written back to
    /// the entity's history. A first-seen entity starts at the target
    /// gains: ramping up from zero on first activation is itself an
    /// audible artifact.
    pub fn apply_channel_gains(
        &mut self,
        entity_id: u32,
        input: &[Sample],
        outputs: &mut [Vec<Sample>],
        offset: usize,
        target_gains: &[Sample],
        enable_smoothing: bool,
    ) -> GainsResult<()> {
        let sample_count = input.len();
        let channel_count = outputs.len();

        if sample_count == 0 || sample_count > MAX_FRAME_SAMPLES {
            return Err(GainsError::BadArguments("sample count out of range"));
        }
        if channel_count == 0 || target_gains.len() != channel_count {
            return Err(GainsError::BadArguments("channel count mismatch"));
        }
        for channel in outputs.iter() {
            if channel.len() < offset + sample_count {
                return Err(GainsError::BadArguments("output buffer too short"));
            }
        }

        let Self {
            dsp,
            history,
            smoothed,
            applied,
        } = self;

        let history = history.entry(entity_id).or_insert_with(|| GainHistory {
            gains: target_gains.to_vec(),
            touched: false,
            valid: false,
        });

        if history.gains.len() != channel_count {
            return Err(GainsError::BadArguments("history channel count mismatch"));
        }

        // Smoothing degrades to the plain path when every channel already
        // sits at its target.
        let smoothing = enable_smoothing
            && target_gains
                .iter()
                .zip(history.gains.iter())
                .any(|(t, c)| t != c);

        if smoothing {
            let init_ramp = MAX_RAMP_SAMPLES.min(sample_count);
            if init_ramp == 0 {
                return Err(GainsError::DivisionByZero);
            }

            for (channel, out) in outputs.iter_mut().enumerate() {
                let current = history.gains[channel];
                let target = target_gains[channel];
                let mut slope = (target - current) / init_ramp as f32;

                let real_ramp = if slope > MAX_SLOPE {
                    slope = MAX_SLOPE;
                    MAX_SLOPE_RAMP_SAMPLES
                } else if slope < -MAX_SLOPE {
                    slope = -MAX_SLOPE;
                    MAX_SLOPE_RAMP_SAMPLES
                } else if slope == 0.0 {
                    0
                } else {
                    init_ramp
                };

                // First smoothed sample sits one slope step beyond the
                // stored gain; the ramp then runs to the target.
                let ramp_start = current + slope;
                dsp.ramp(ramp_start, target, &mut smoothed[..real_ramp]);
                if real_ramp < sample_count {
                    dsp.fill(target, &mut smoothed[real_ramp..sample_count]);
                }

                let achieved = smoothed[sample_count - 1];

                dsp.mul(input, &smoothed[..sample_count], &mut applied[..sample_count]);
                dsp.add_assign(
                    &mut out[offset..offset + sample_count],
                    &applied[..sample_count],
                );

                history.gains[channel] = achieved;
            }
        } else {
            for (channel, out) in outputs.iter_mut().enumerate() {
                let target = target_gains[channel];
                dsp.fill(target, &mut smoothed[..sample_count]);
                dsp.mul(input, &smoothed[..sample_count], &mut applied[..sample_count]);
                dsp.add_assign(
                    &mut out[offset..offset + sample_count],
                    &applied[..sample_count],
                );

                history.gains[channel] = target;
            }
        }

        history.touched = true;
        history.valid = true;

        Ok(())
    }

    /// Frame-boundary update: evict entities untouched in the previous
    /// frame, clear the touched flag on survivors.
    pub fn update_history(&mut self) {
        self.history.retain(|_, entry| entry.touched);
        for entry in self.history.values_mut() {
            entry.touched = false;
        }
    }

    /// Drop all gain history (program gap or configuration change)
    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    /// Number of tracked entities
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Last gains written for an entity, if any
    pub fn entity_gains(&self, entity_id: u32) -> Option<&[Sample]> {
        self.history
            .get(&entity_id)
            .filter(|e| e.valid)
            .map(|e| e.gains.as_slice())
    }
}

impl Default for ChannelGainsProcessor {
    fn default() -> Self {
        Self::new()
    }
}
