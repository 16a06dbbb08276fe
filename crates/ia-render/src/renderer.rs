//! Frame rendering pipeline
//!
//! One renderer instance owns all mutable rendering state (extended-source
//! cache, gain history, decorrelator) and drives a frame through:
//! activation gating, per-sub-block object panning (snap, transform,
//! interior split, VBAP, zone gains), bed routing (direct, virtual
//! downmix, or render-as-object), bed remapping, smoothed gain
//! application, and decorrelation with a tail-off.
//!
//! The configuration and everything derived from it (hull, virtual-source
//! grid, transforms) are immutable and may be shared between instances.

use crate::config::RendererConfig;
use crate::elements::{
    AudioDataId, BedChannel, BedDefinition, BedRemap, DecorPrefix, Element, Frame, MetaId,
    ObjectDefinition, ObjectSubBlock, RemapCoeff,
};
use crate::error::{RenderError, RenderResult, RenderWarning};
use crate::interior::InteriorPanner;
use crate::transform::SpatialTransform;
use crate::vbap::{ExtendedSource, VbapObject, VbapRenderer};
use crate::zone::ObjectZone9;
use ia_core::{
    ChannelId, CubePosition, INT32_SCALE, LFE_URI, MAX_FRAME_SAMPLES, MAX_SUBBLOCK_SAMPLES, Sample,
    SampleRate, SubBlockSchedule, UseCase,
};
use ia_dsp::{ChannelGainsProcessor, DecorrelatorBank, VectorDsp};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Frames of decorrelator tail after the last decor-flagged object
pub const DECORR_TAIL_FRAMES: u32 = 2;

/// Renderer construction options
#[derive(Debug, Clone, Copy)]
pub struct RendererOptions {
    /// Keep gain history and the extended-source cache across frames,
    /// evicting untouched entries at frame boundaries. Disabling clears
    /// both at the start of every frame.
    pub frame_gains_cache: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            frame_gains_cache: true,
        }
    }
}

/// Per-frame context threaded through the render passes
struct FrameCtx<'a> {
    frame: &'a Frame,
    schedule: &'a SubBlockSchedule,
    frame_samples: usize,
    decode_rate: SampleRate,
}

/// Immersive-audio frame renderer
pub struct Renderer {
    config: Arc<RendererConfig>,
    options: RendererOptions,

    transform: SpatialTransform,
    interior: InteriorPanner,
    vbap: VbapRenderer,
    gains: ChannelGainsProcessor,
    decorr: DecorrelatorBank,
    zone9: ObjectZone9,
    dsp: VectorDsp,

    /// (output index, cube position) for snap-eligible speakers
    snap_positions: Vec<(usize, CubePosition)>,
    /// v1 renders 96 kHz programs decimated to 48 kHz
    render_96k_to_48k: bool,

    sample_buffer_int: Vec<i32>,
    sample_buffer_float: Vec<Sample>,
    decorr_bus: Vec<Vec<Sample>>,
    work_object: VbapObject,

    warnings: BTreeSet<RenderWarning>,
    has_decorr_objects: bool,
    decorr_tail_frames: u32,
    decorr_in_reset: bool,
    parent_meta_id: MetaId,
}

impl Renderer {
    /// Build a renderer for a validated configuration
    pub fn new(config: Arc<RendererConfig>, options: RendererOptions) -> RenderResult<Self> {
        let transform = SpatialTransform::new();
        let vbap = VbapRenderer::new(config.clone())?;
        let output_channels = config.output_channel_count();

        let mut decorr = DecorrelatorBank::setup(output_channels);
        decorr.reset();

        // Convert hull speaker positions to cube coordinates once; snap
        // compares against these. A conversion failure disables snap.
        let mut snap_positions = Vec::new();
        for (index, speaker) in config.speakers().iter().enumerate() {
            if speaker.is_virtual() || !config.is_vbap_speaker(index) {
                continue;
            }
            if speaker.uri.as_deref() == Some(LFE_URI) {
                continue;
            }
            let Some(channel) = speaker.channel else {
                continue;
            };
            let Some(output_index) = config.output_index_for_channel(channel) else {
                continue;
            };
            match transform.cartesian_to_cube(speaker.position) {
                Ok(cube) => snap_positions.push((output_index, cube)),
                Err(err) => {
                    log::warn!("snap disabled: speaker {} unconvertible: {err}", speaker.name);
                    snap_positions.clear();
                    break;
                }
            }
        }

        Ok(Self {
            zone9: ObjectZone9::from_config(&config),
            interior: InteriorPanner::new(),
            gains: ChannelGainsProcessor::new(),
            dsp: VectorDsp::new(),
            transform,
            vbap,
            decorr,
            snap_positions,
            render_96k_to_48k: true,
            sample_buffer_int: vec![0; MAX_FRAME_SAMPLES],
            sample_buffer_float: vec![0.0; MAX_FRAME_SAMPLES],
            decorr_bus: vec![vec![0.0; MAX_FRAME_SAMPLES]; output_channels],
            work_object: VbapObject::new(output_channels),
            warnings: BTreeSet::new(),
            has_decorr_objects: false,
            decorr_tail_frames: 0,
            decorr_in_reset: true,
            parent_meta_id: 0,
            config,
            options,
        })
    }

    /// Number of output channels this renderer produces
    pub fn output_channel_count(&self) -> usize {
        self.config.output_channel_count()
    }

    /// Upper bound on samples per channel per frame
    pub fn max_output_sample_count(&self) -> usize {
        MAX_FRAME_SAMPLES
    }

    pub fn config(&self) -> &Arc<RendererConfig> {
        &self.config
    }

    /// Warnings collected by the last successful [`Self::render_frame`],
    /// in precedence order
    pub fn warnings(&self) -> Vec<RenderWarning> {
        self.warnings.iter().copied().collect()
    }

    /// Render one frame into `output[channel][0..n]`, returning the
    /// samples written per channel.
    ///
    /// Each output buffer must hold at least one frame of samples. On
    /// error the buffers are partially written and undefined.
    pub fn render_frame(
        &mut self,
        frame: &Frame,
        output: &mut [Vec<Sample>],
    ) -> RenderResult<usize> {
        self.warnings.clear();

        let frame_rate = frame.frame_rate;
        let sample_rate = frame.sample_rate;
        if !frame_rate.is_supported(sample_rate) {
            return Err(RenderError::UnsupportedFrameRate);
        }

        let mut frame_samples = frame_rate.samples_per_frame(sample_rate);
        let decode_rate = if sample_rate == SampleRate::Hz96000 && self.render_96k_to_48k {
            frame_samples /= 2;
            SampleRate::Hz48000
        } else {
            sample_rate
        };
        if frame_samples == 0 || frame_samples > MAX_FRAME_SAMPLES {
            return Err(RenderError::BadArguments("frame sample count out of range"));
        }

        let schedule = SubBlockSchedule::new(frame_rate, frame_samples);

        if output.len() != self.config.output_channel_count() {
            return Err(RenderError::BadArguments("output channel count mismatch"));
        }
        for channel in output.iter_mut() {
            if channel.len() < frame_samples {
                return Err(RenderError::BadArguments("output buffer too short"));
            }
            channel[..frame_samples].fill(0.0);
        }
        for channel in self.decorr_bus.iter_mut() {
            channel.fill(0.0);
        }

        // Frame-boundary cache maintenance.
        if self.options.frame_gains_cache {
            self.vbap.evict_untouched();
            self.gains.update_history();
        } else {
            self.vbap.reset_cache();
            self.gains.reset_history();
        }

        if frame.elements.is_empty() {
            // Nothing to render: a silent frame is a valid program.
            return Ok(frame_samples);
        }

        self.has_decorr_objects = false;
        let ctx = FrameCtx {
            frame,
            schedule: &schedule,
            frame_samples,
            decode_rate,
        };

        let mut bus = std::mem::take(&mut self.decorr_bus);
        let result = self.render_elements(&ctx, output, &mut bus);
        self.decorr_bus = bus;
        result?;

        // Decorrelation: fresh decor content re-arms the tail counter;
        // decor-free frames run the counter down, then the bank resets
        // once.
        if self.has_decorr_objects {
            self.decorr_tail_frames = DECORR_TAIL_FRAMES;
        }
        if self.has_decorr_objects || self.decorr_tail_frames > 0 {
            let mut bus = std::mem::take(&mut self.decorr_bus);
            self.decorr.process(&mut bus, frame_samples);
            for (channel, bus_channel) in output.iter_mut().zip(bus.iter()) {
                self.dsp.add_assign(
                    &mut channel[..frame_samples],
                    &bus_channel[..frame_samples],
                );
            }
            self.decorr_bus = bus;
            if !self.has_decorr_objects {
                self.decorr_tail_frames -= 1;
            }
            self.decorr_in_reset = false;
        } else if !self.decorr_in_reset {
            self.decorr.reset();
            self.decorr_in_reset = true;
        }

        Ok(frame_samples)
    }

    // ============ Element pass ============

    fn render_elements(
        &mut self,
        ctx: &FrameCtx<'_>,
        output: &mut [Vec<Sample>],
        decorr_bus: &mut [Vec<Sample>],
    ) -> RenderResult<()> {
        for element in &ctx.frame.elements {
            match element {
                Element::Object(object) => {
                    // Decor resolution is frame-level, taken from the
                    // first sub-block.
                    let decor_on = object
                        .sub_blocks
                        .first()
                        .is_some_and(|sb| sb.decor == DecorPrefix::MaxDecor);

                    let rendered = if decor_on && self.config.decorrelation_enabled {
                        self.has_decorr_objects = true;
                        self.render_object_def(ctx, object, decorr_bus)?
                    } else {
                        self.render_object_def(ctx, object, output)?
                    };
                    if rendered != ctx.frame_samples {
                        return Err(RenderError::ObjectDefinition("rendered sample count"));
                    }
                }
                Element::Bed(bed) => {
                    let rendered = self.render_bed_def(ctx, bed, output)?;
                    if rendered != ctx.frame_samples {
                        return Err(RenderError::BedDefinition("rendered sample count"));
                    }
                }
                Element::Remap(_) => {
                    return Err(RenderError::BedRemap("remap element outside a bed"));
                }
                Element::AudioPcm(_) | Element::AudioDlc(_) => {
                    // Assets are fetched by ID from the consuming element.
                }
                Element::ObjectZone19(_) => {
                    return Err(RenderError::NotImplemented("object zone 19"));
                }
            }
        }
        Ok(())
    }

    // ============ Activation ============

    fn is_active(&self, conditional: bool, use_case: UseCase) -> bool {
        if !conditional {
            return true;
        }
        use_case == UseCase::Always
            || (use_case == self.config.target_use_case && use_case != UseCase::None)
    }

    fn is_remap_active(&self, use_case: UseCase) -> bool {
        use_case == UseCase::Always
            || (use_case == self.config.target_use_case && use_case != UseCase::None)
    }

    // ============ Objects ============

    fn render_object_def(
        &mut self,
        ctx: &FrameCtx<'_>,
        object: &ObjectDefinition,
        output: &mut [Vec<Sample>],
    ) -> RenderResult<usize> {
        if !self.is_active(object.conditional, object.use_case) {
            return Ok(ctx.frame_samples);
        }

        // An activated Object child replaces its parent (depth 1).
        for child in &object.children {
            match child {
                Element::Object(child_object) => {
                    if self.is_active(child_object.conditional, child_object.use_case) {
                        return self.render_object_def(ctx, child_object, output);
                    }
                }
                Element::ObjectZone19(_) => continue,
                _ => {}
            }
        }

        if object.audio_data_id == 0 {
            // No audio this frame.
            return Ok(ctx.frame_samples);
        }
        if object.sub_blocks.len() != ctx.schedule.len() {
            return Err(RenderError::ObjectDefinition("sub-block count"));
        }

        let mut int_buf = std::mem::take(&mut self.sample_buffer_int);
        let mut flt_buf = std::mem::take(&mut self.sample_buffer_float);
        let mut work = std::mem::replace(&mut self.work_object, VbapObject::new(0));

        let result = (|| -> RenderResult<usize> {
            decode_to_float(ctx, object.audio_data_id, &mut int_buf, &mut flt_buf)?;

            work.reset();
            work.id = object.meta_id;

            let mut rendered = 0;
            for (block, (&count, &offset)) in ctx
                .schedule
                .counts
                .iter()
                .zip(ctx.schedule.offsets.iter())
                .enumerate()
            {
                self.render_object_sub_block(
                    &object.sub_blocks[block],
                    &mut work,
                    &flt_buf[offset..offset + count],
                    output,
                    offset,
                )?;
                rendered += count;
            }
            Ok(rendered)
        })();

        self.sample_buffer_int = int_buf;
        self.sample_buffer_float = flt_buf;
        self.work_object = work;

        let rendered = result?;
        if rendered != ctx.frame_samples {
            return Err(RenderError::ObjectDefinition("rendered sample count"));
        }
        Ok(rendered)
    }

    fn render_object_sub_block(
        &mut self,
        sub_block: &ObjectSubBlock,
        work: &mut VbapObject,
        input: &[Sample],
        output: &mut [Vec<Sample>],
        offset: usize,
    ) -> RenderResult<()> {
        // Without fresh pan info the previous sub-block's gains carry
        // forward into the smoothing stage.
        if sub_block.pan_info_exists {
            let spread = sub_block.spread.effective_1d();

            // Spread wins over snap.
            let snapped = if spread.is_none() {
                sub_block.snap_tolerance.and_then(|q| {
                    let tolerance = q.min(4095) as f32 / 4095.0;
                    (tolerance > 0.0)
                        .then(|| self.find_snap_speaker(sub_block.position, tolerance))
                        .flatten()
                })
            } else {
                None
            };

            if let Some(speaker) = snapped {
                for (index, gain) in work.channel_gains.iter_mut().enumerate() {
                    *gain = if index == speaker { 1.0 } else { 0.0 };
                }
            } else {
                let position = sub_block.position;
                let spherical =
                    self.transform
                        .cube_to_spherical(position.x, position.y, position.z)?;
                let (aperture, divergence) = match spread {
                    Some(s) => self.transform.spread_to_extent(s)?,
                    None => (0.0, 0.0),
                };

                let mut sources = self.interior.map_to_extended_sources(
                    spherical.azimuth,
                    spherical.elevation,
                    spherical.radius,
                    aperture,
                    divergence,
                )?;
                for source in sources.iter_mut() {
                    source.prepare(
                        self.config.total_speaker_count(),
                        self.config.output_channel_count(),
                    );
                }

                work.extended_sources = sources;
                work.object_gain = sub_block.gain;
                self.vbap.render_object(work)?;
            }

            if let Some(zone_gains) = &sub_block.zone_gains {
                self.zone9.process(zone_gains, &mut work.channel_gains);
            }
        }

        self.gains.apply_channel_gains(
            work.id,
            input,
            output,
            offset,
            &work.channel_gains,
            self.config.smoothing_enabled,
        )?;
        Ok(())
    }

    /// Chebyshev-nearest snap candidate within tolerance; ties resolve by
    /// Euclidean distance
    fn find_snap_speaker(&self, position: CubePosition, tolerance: f32) -> Option<usize> {
        let mut best = None;
        let mut last_max = 2.0f32;
        let mut candidates: Vec<(usize, CubePosition)> = Vec::new();

        for &(output_index, speaker) in &self.snap_positions {
            let diff = (speaker.x - position.x)
                .abs()
                .max((speaker.y - position.y).abs())
                .max((speaker.z - position.z).abs());

            if diff < tolerance {
                if diff < last_max {
                    candidates.clear();
                    last_max = diff;
                    best = Some(output_index);
                    candidates.push((output_index, speaker));
                } else if diff == last_max {
                    candidates.push((output_index, speaker));
                }
            }
        }

        if candidates.len() > 1 {
            let mut closest = 3.0f64;
            for (output_index, speaker) in candidates {
                let dx = (speaker.x - position.x) as f64;
                let dy = (speaker.y - position.y) as f64;
                let dz = (speaker.z - position.z) as f64;
                let squared = dx * dx + dy * dy + dz * dz;
                if squared < closest {
                    closest = squared;
                    best = Some(output_index);
                }
            }
        }

        best
    }

    // ============ Beds ============

    fn render_bed_def(
        &mut self,
        ctx: &FrameCtx<'_>,
        bed: &BedDefinition,
        output: &mut [Vec<Sample>],
    ) -> RenderResult<usize> {
        self.parent_meta_id = bed.meta_id;

        if !self.is_active(bed.conditional, bed.use_case) {
            return Ok(ctx.frame_samples);
        }

        // An activated Bed child replaces the parent; an activated Remap
        // child renders the parent through its matrix.
        for child in &bed.children {
            match child {
                Element::Bed(child_bed) => {
                    if self.is_active(child_bed.conditional, child_bed.use_case) {
                        return self.render_bed_def(ctx, child_bed, output);
                    }
                }
                Element::Remap(remap) => {
                    if self.is_remap_active(remap.use_case) {
                        return self.render_bed_remap(ctx, remap, bed, output);
                    }
                }
                _ => {}
            }
        }

        if bed.channels.is_empty() {
            return Err(RenderError::BedDefinition("bed has no channels"));
        }

        let mut int_buf = std::mem::take(&mut self.sample_buffer_int);
        let mut flt_buf = std::mem::take(&mut self.sample_buffer_float);

        let result = (|| -> RenderResult<()> {
            for channel in &bed.channels {
                if channel.audio_data_id == 0 {
                    // Silent bed channel this frame.
                    continue;
                }
                decode_to_float(ctx, channel.audio_data_id, &mut int_buf, &mut flt_buf)?;
                self.render_bed_channel(ctx, channel, &flt_buf[..ctx.frame_samples], output)?;
            }
            Ok(())
        })();

        self.sample_buffer_int = int_buf;
        self.sample_buffer_float = flt_buf;
        result?;

        Ok(ctx.frame_samples)
    }

    fn render_bed_channel(
        &mut self,
        ctx: &FrameCtx<'_>,
        channel: &BedChannel,
        input: &[Sample],
        output: &mut [Vec<Sample>],
    ) -> RenderResult<()> {
        let gain = channel.gain;
        if gain == 0.0 {
            return Ok(());
        }

        let config = self.config.clone();
        let uri = channel.id.uri();

        if let Some(output_index) = config.output_index_for_uri(uri) {
            // Direct hit on a physical speaker.
            let out = &mut output[output_index][..input.len()];
            if gain == 1.0 {
                for (o, i) in out.iter_mut().zip(input.iter()) {
                    *o += i;
                }
            } else {
                for (o, i) in out.iter_mut().zip(input.iter()) {
                    *o += i * gain;
                }
            }
            Ok(())
        } else if let Some(speaker_index) = config.speaker_index_for_uri(uri) {
            // Virtual speaker: fold through its downmix.
            let speaker = &config.speakers()[speaker_index];
            for entry in &speaker.downmix {
                let output_index = config
                    .output_index_for_channel(entry.channel)
                    .ok_or(RenderError::DownmixChannel(entry.channel))?;
                let combined = entry.coefficient * gain;
                let out = &mut output[output_index][..input.len()];
                for (o, i) in out.iter_mut().zip(input.iter()) {
                    *o += i * combined;
                }
            }
            Ok(())
        } else if !channel.id.is_lfe() {
            // Not in the layout: render at the channel's canonical dome
            // position.
            self.render_channel_as_object(channel.id, gain, input, output, 0)
        } else {
            self.warnings.insert(RenderWarning::BedLfeNotInLayout);
            Ok(())
        }
    }

    fn render_channel_as_object(
        &mut self,
        channel_id: ChannelId,
        gain: f32,
        input: &[Sample],
        output: &mut [Vec<Sample>],
        offset: usize,
    ) -> RenderResult<()> {
        let mut work = std::mem::replace(&mut self.work_object, VbapObject::new(0));

        let result = (|| -> RenderResult<()> {
            work.reset();
            // Synthesized entity ID: channel code plus bed meta ID in a
            // reserved range, so bed channels get their own gain history.
            work.id = (channel_id.code() as u32)
                .wrapping_add(self.parent_meta_id.wrapping_shl(8))
                .wrapping_add(0xff00_0000);

            let mut source = ExtendedSource::new(channel_id.canonical_position(), 1.0, 0.0, 0.0)?;
            source.prepare(
                self.config.total_speaker_count(),
                self.config.output_channel_count(),
            );
            work.extended_sources.push(source);
            work.object_gain = gain;

            self.vbap.render_object(&mut work)?;

            self.gains.apply_channel_gains(
                work.id,
                input,
                output,
                offset,
                &work.channel_gains,
                self.config.smoothing_enabled,
            )?;
            Ok(())
        })();

        self.work_object = work;
        result
    }

    // ============ Bed remap ============

    fn render_bed_remap(
        &mut self,
        ctx: &FrameCtx<'_>,
        remap: &BedRemap,
        parent: &BedDefinition,
        output: &mut [Vec<Sample>],
    ) -> RenderResult<usize> {
        if !self.is_remap_active(remap.use_case) {
            return Err(RenderError::BedRemap("remap use case mismatch"));
        }

        let source_count = remap.source_channel_count;
        let dest_count = remap.destination_channel_count;
        let n = ctx.frame_samples;

        if source_count == 0 || parent.channels.len() != source_count || dest_count == 0 {
            return Err(RenderError::BedRemap("channel counts"));
        }
        if remap.sub_blocks.is_empty() || remap.sub_blocks.len() != ctx.schedule.len() {
            return Err(RenderError::BedRemap("sub-block count"));
        }

        // Source assets decode once per frame (frame-atomic), whatever
        // the sub-block layout does afterwards.
        let mut source_pcm: Vec<Vec<Sample>> = vec![vec![0.0; n]; source_count];
        let mut source_scales = vec![0.0f32; source_count];
        {
            let mut int_buf = std::mem::take(&mut self.sample_buffer_int);
            let result = (|| -> RenderResult<()> {
                for (index, channel) in parent.channels.iter().enumerate() {
                    source_scales[index] = channel.gain;
                    if channel.audio_data_id == 0 {
                        // Source stays silent.
                        continue;
                    }
                    ctx.frame
                        .decode_asset(channel.audio_data_id, ctx.decode_rate, &mut int_buf[..n])?;
                    for (f, v) in source_pcm[index].iter_mut().zip(int_buf[..n].iter()) {
                        *f = *v as f32 / INT32_SCALE;
                    }
                }
                Ok(())
            })();
            self.sample_buffer_int = int_buf;
            result?;
        }

        let config = self.config.clone();
        let mut scratch = vec![0.0f32; MAX_SUBBLOCK_SAMPLES];

        // The coefficient matrix persists across sub-blocks unless
        // re-signalled.
        let mut current: &[RemapCoeff] = &[];

        for (block, (&count, &offset)) in ctx
            .schedule
            .counts
            .iter()
            .zip(ctx.schedule.offsets.iter())
            .enumerate()
        {
            let sub_block = &remap.sub_blocks[block];
            if sub_block.remap_info_exists {
                current = &sub_block.coeffs;
            }
            if current.len() != dest_count {
                return Err(RenderError::BedRemap("coefficient rows"));
            }

            for coeff in current {
                if coeff.gains.len() != source_count {
                    return Err(RenderError::BedRemap("coefficient columns"));
                }
                let uri = coeff.destination.uri();

                if let Some(output_index) = config.output_index_for_uri(uri) {
                    // Physical destination: direct matrix accumulate.
                    for j in 0..source_count {
                        let combined = coeff.gains[j] * source_scales[j];
                        if combined == 0.0 {
                            continue;
                        }
                        let src = &source_pcm[j][offset..offset + count];
                        let dst = &mut output[output_index][offset..offset + count];
                        for (o, s) in dst.iter_mut().zip(src.iter()) {
                            *o += s * combined;
                        }
                    }
                } else if let Some(speaker_index) = config.speaker_index_for_uri(uri) {
                    // Virtual destination: matrix then downmix.
                    let speaker = &config.speakers()[speaker_index];
                    for entry in &speaker.downmix {
                        let output_index = config
                            .output_index_for_channel(entry.channel)
                            .ok_or(RenderError::DownmixChannel(entry.channel))?;
                        for j in 0..source_count {
                            let combined = entry.coefficient * coeff.gains[j] * source_scales[j];
                            if combined == 0.0 {
                                continue;
                            }
                            let src = &source_pcm[j][offset..offset + count];
                            let dst = &mut output[output_index][offset..offset + count];
                            for (o, s) in dst.iter_mut().zip(src.iter()) {
                                *o += s * combined;
                            }
                        }
                    }
                } else if !coeff.destination.is_lfe() {
                    // Destination missing from the layout: remap into
                    // scratch, then render as a point-source object.
                    scratch[..count].fill(0.0);
                    for j in 0..source_count {
                        let combined = coeff.gains[j] * source_scales[j];
                        if combined == 0.0 {
                            continue;
                        }
                        for (o, s) in scratch[..count]
                            .iter_mut()
                            .zip(source_pcm[j][offset..offset + count].iter())
                        {
                            *o += s * combined;
                        }
                    }
                    // Source gains are already folded in; render at unity.
                    self.render_channel_as_object(
                        coeff.destination,
                        1.0,
                        &scratch[..count],
                        output,
                        offset,
                    )?;
                } else {
                    self.warnings.insert(RenderWarning::RemapLfeNotInLayout);
                }
            }
        }

        Ok(n)
    }
}

/// Decode an asset and convert it to float samples
fn decode_to_float(
    ctx: &FrameCtx<'_>,
    id: AudioDataId,
    int_buf: &mut [i32],
    flt_buf: &mut [Sample],
) -> RenderResult<()> {
    let n = ctx.frame_samples;
    ctx.frame.decode_asset(id, ctx.decode_rate, &mut int_buf[..n])?;
    for (f, v) in flt_buf[..n].iter_mut().zip(int_buf[..n].iter()) {
        *f = *v as f32 / INT32_SCALE;
    }
    Ok(())
}
