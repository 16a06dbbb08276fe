//! VBAP rendering against the triangulated speaker hull
//!
//! Point sources resolve to the triangle patch enclosing them; extent
//! sources integrate pre-rendered virtual sources over the aperture/
//! divergence arc of every latitude ring. Rendered extended sources are
//! memoized per frame: program material routinely repeats identical pan
//! positions across sub-blocks, and a cache hit skips both the hull walk
//! and the downmix.

use crate::config::{RendererConfig, mat3_mul_vec3};
use crate::error::{VbapError, VbapResult};
use crate::virtual_sources::{HemisphereGrid, LongitudeRing, VirtualSource, VirtualSourceTree};
use ia_core::{EPSILON, Sample, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

/// Azimuthal divisions of the virtual-source hemisphere at the horizon
pub const THETA_DIVISIONS: usize = 128;
/// Latitude rings between horizon and zenith
pub const PHI_DIVISIONS: usize = 32;

/// Round-to-zero quantized atan2 (1 mrad steps).
///
/// Keeps ring selection identical across libm implementations.
fn quantized_atan2(a: f32, b: f32) -> f32 {
    let v = a.atan2(b) / 0.001;
    let r = if v >= 0.0 {
        -(-v + 0.5).floor()
    } else {
        (v + 0.5).floor()
    };
    0.001 * r
}

/// A panning atom: on-dome position plus extent, with its rendered gains
#[derive(Debug, Clone)]
pub struct ExtendedSource {
    /// Unit Cartesian position, z >= 0
    pub position: Vec3,
    /// Extent half-angle, 0..=pi
    pub aperture: f32,
    /// Extent divergence, 0..=pi/2
    pub divergence: f32,
    /// Source gain, 0..=1
    pub gain: f32,
    /// Rendered per-speaker gains (virtual speakers included)
    pub speaker_gains: Vec<Sample>,
    /// Rendered per-output-channel gains
    pub channel_gains: Vec<Sample>,
    /// Cache marker: used during the current frame
    pub touched: bool,
}

impl ExtendedSource {
    /// Validating constructor; gain vectors start empty and are sized by
    /// the renderer before use.
    pub fn new(position: Vec3, gain: f32, aperture: f32, divergence: f32) -> VbapResult<Self> {
        if !(-1.0..=1.0).contains(&position.x)
            || !(-1.0..=1.0).contains(&position.y)
            || !(0.0..=1.0).contains(&position.z)
        {
            return Err(VbapError::ParameterOutOfBounds("position"));
        }
        if !(0.0..=1.0).contains(&gain) {
            return Err(VbapError::ParameterOutOfBounds("gain"));
        }
        if !(0.0..=PI).contains(&aperture) {
            return Err(VbapError::ParameterOutOfBounds("aperture"));
        }
        if !(0.0..=FRAC_PI_2).contains(&divergence) {
            return Err(VbapError::ParameterOutOfBounds("divergence"));
        }
        Ok(Self {
            position,
            aperture,
            divergence,
            gain,
            speaker_gains: Vec::new(),
            channel_gains: Vec::new(),
            touched: false,
        })
    }

    /// Size (and clear) the gain vectors for the configured counts
    pub fn prepare(&mut self, speaker_count: usize, channel_count: usize) {
        self.speaker_gains.clear();
        self.speaker_gains.resize(speaker_count, 0.0);
        self.channel_gains.clear();
        self.channel_gains.resize(channel_count, 0.0);
    }

    /// Bit-identical comparison of the rendering parameters (cache key)
    pub fn has_same_rendering_params(&self, other: &Self) -> bool {
        self.position.x.to_bits() == other.position.x.to_bits()
            && self.position.y.to_bits() == other.position.y.to_bits()
            && self.position.z.to_bits() == other.position.z.to_bits()
            && self.aperture.to_bits() == other.aperture.to_bits()
            && self.divergence.to_bits() == other.divergence.to_bits()
            && self.gain.to_bits() == other.gain.to_bits()
    }
}

/// A renderable object: one on-dome source or an interior triple
#[derive(Debug, Clone)]
pub struct VbapObject {
    pub id: u32,
    pub object_gain: f32,
    /// Sum of extended-source gains; the normalization target
    pub norm_gain: f32,
    pub extended_sources: Vec<ExtendedSource>,
    pub channel_gains: Vec<Sample>,
}

impl VbapObject {
    pub fn new(channel_count: usize) -> Self {
        Self {
            id: 0,
            object_gain: 1.0,
            norm_gain: 0.0,
            extended_sources: Vec::new(),
            channel_gains: vec![0.0; channel_count],
        }
    }

    /// Return the object to its default state, keeping allocations
    pub fn reset(&mut self) {
        self.id = 0;
        self.object_gain = 1.0;
        self.norm_gain = 0.0;
        self.extended_sources.clear();
        self.channel_gains.fill(0.0);
    }
}

/// VBAP panner over a shared renderer configuration
#[derive(Debug)]
pub struct VbapRenderer {
    config: Arc<RendererConfig>,
    grid: HemisphereGrid,
    /// Previously rendered extended sources (frame-scoped memo)
    cache: Vec<ExtendedSource>,
    scratch_patch: Vec<Sample>,
    scratch_extent: Vec<Sample>,
    scratch_ring: Vec<Sample>,
}

impl VbapRenderer {
    /// Build the panner and its virtual-source hemisphere
    pub fn new(config: Arc<RendererConfig>) -> VbapResult<Self> {
        let speaker_count = config.total_speaker_count();
        let mut scratch = vec![0.0; speaker_count];
        let grid = Self::build_hemisphere(&config, &mut scratch)?;
        Ok(Self {
            config,
            grid,
            cache: Vec::new(),
            scratch_patch: scratch,
            scratch_extent: vec![0.0; speaker_count],
            scratch_ring: vec![0.0; speaker_count],
        })
    }

    fn build_hemisphere(
        config: &RendererConfig,
        scratch: &mut [Sample],
    ) -> VbapResult<HemisphereGrid> {
        let speaker_count = config.total_speaker_count();
        let delta_phi = FRAC_PI_2 / PHI_DIVISIONS as f32;
        let mut rings = Vec::with_capacity(PHI_DIVISIONS + 1);
        let mut uncovered = 0usize;

        for i in 0..=PHI_DIVISIONS {
            // Polar angle from the zenith; the i = 0 ring is the zenith
            // itself with a single source.
            let phi = i as f32 * delta_phi;
            let n = if i == 0 {
                1
            } else {
                (THETA_DIVISIONS as f32 * phi.sin()).floor() as usize
            };
            let delta_theta = 2.0 * PI / n as f32;

            let mut sources = Vec::with_capacity(n);
            for j in 0..n {
                let theta = delta_theta * j as f32;
                let direction = Vec3::new(
                    (theta.sin() * phi.sin()).clamp(-1.0, 1.0),
                    (theta.cos() * phi.sin()).clamp(-1.0, 1.0),
                    phi.cos().clamp(-1.0, 1.0),
                );

                let mut gains = vec![0.0; speaker_count];
                if Self::point_source_gains(config, direction, scratch, &mut gains) <= 0.0 {
                    uncovered += 1;
                }
                sources.push(VirtualSource {
                    theta_index: j as i32,
                    theta,
                    speaker_gains: gains,
                });
            }

            rings.push(LongitudeRing {
                phi,
                phi_index: i,
                delta_theta,
                max_theta_index: n as i32 - 1,
                tree: VirtualSourceTree::build(&sources),
            });
        }

        if uncovered > 0 {
            log::warn!("{uncovered} virtual sources fall outside the speaker hull");
        }

        Ok(HemisphereGrid { delta_phi, rings })
    }

    // ============ Core VBAP ============

    /// Render a pure point source against the triangulated hull.
    ///
    /// Adds the averaged patch gains into `out` and returns the active
    /// patch count (0 when the hull does not cover the direction).
    fn point_source_gains(
        config: &RendererConfig,
        source: Vec3,
        scratch: &mut [Sample],
        out: &mut [Sample],
    ) -> f32 {
        scratch.fill(0.0);
        let normalized = source.scaled(1.0 / source.norm());

        let mut active_patches = 0.0f32;
        for patch in config.patches() {
            let coefs = mat3_mul_vec3(&patch.inv_basis, normalized);
            if coefs.x < -EPSILON || coefs.y < -EPSILON || coefs.z < -EPSILON {
                continue;
            }

            let significant = (coefs.x > EPSILON) as u32
                + (coefs.y > EPSILON) as u32
                + (coefs.z > EPSILON) as u32;

            if significant == 2 {
                // Triangle border: rendered by both adjacent patches, so
                // each contributes half.
                scratch[patch.s1] += 0.5 * coefs.x;
                scratch[patch.s2] += 0.5 * coefs.y;
                scratch[patch.s3] += 0.5 * coefs.z;
                active_patches += 0.5;
            } else {
                scratch[patch.s1] += coefs.x;
                scratch[patch.s2] += coefs.y;
                scratch[patch.s3] += coefs.z;
                active_patches += 1.0;
            }

            // Coincident with a hull speaker: nothing else can contribute.
            if significant == 1 {
                break;
            }
        }

        if active_patches != 0.0 {
            for (o, s) in out.iter_mut().zip(scratch.iter()) {
                *o += s / active_patches;
            }
        }

        active_patches
    }

    /// Arc of a latitude ring lying inside the aperture disk.
    ///
    /// `phi` and `latitude` are polar angles from the zenith. `None`
    /// means the ring does not intersect the disk.
    fn latitude_sigma(phi: f32, aperture: f32, latitude: f32) -> Option<f32> {
        let ca = aperture.cos();
        let cp = (phi + latitude).cos();
        let cm = (phi - latitude).cos();

        if ca <= cp {
            // Ring fully inside the disk
            return Some(PI);
        }
        if cm > cp {
            if ca == cm {
                return Some(0.0);
            }
            if ca < cm {
                return Some(((2.0 * ca - cp - cm) / (cm - cp)).acos());
            }
        }
        None
    }

    /// Integrate virtual sources over the extent arc of every ring
    fn hemisphere_gains(
        grid: &HemisphereGrid,
        mut theta: f32,
        phi: f32,
        aperture: f32,
        divergence: f32,
        out: &mut [Sample],
        ring_scratch: &mut [Sample],
    ) -> i32 {
        if theta < 0.0 {
            theta += 2.0 * PI;
        }

        // Snap phi onto the nearest ring so a zero aperture with nonzero
        // divergence still selects sources.
        let phi = grid.delta_phi * (phi / grid.delta_phi + 0.5).floor();

        let mut found = 0;
        for ring in &grid.rings {
            let Some(sigma) = Self::latitude_sigma(phi, aperture, ring.phi) else {
                continue;
            };

            let arc = (divergence + sigma).clamp(0.0, PI);
            let theta_max = theta + arc;
            let theta_min = theta - arc;

            let mut min_i = (theta_min / ring.delta_theta + 0.5).floor() as i32;
            let mut max_i = (theta_max / ring.delta_theta + 0.5).floor() as i32;

            if max_i - min_i > ring.max_theta_index {
                min_i = 0;
                max_i = ring.max_theta_index;
            }

            ring_scratch.fill(0.0);
            let top = ring.max_theta_index;
            if max_i > top {
                found += ring
                    .tree
                    .average_gains_over_range(0, max_i - top - 1, 0, top, ring_scratch);
                found += ring
                    .tree
                    .average_gains_over_range(min_i, top, 0, top, ring_scratch);
            } else if min_i < 0 {
                found += ring
                    .tree
                    .average_gains_over_range(0, max_i, 0, top, ring_scratch);
                found += ring
                    .tree
                    .average_gains_over_range(top + min_i + 1, top, 0, top, ring_scratch);
            } else {
                found += ring
                    .tree
                    .average_gains_over_range(min_i, max_i, 0, top, ring_scratch);
            }

            for (o, g) in out.iter_mut().zip(ring_scratch.iter()) {
                *o += g;
            }
        }

        found
    }

    /// Render a source with extent, falling back to a point source when
    /// too few virtual sources are hit
    fn render_extent(
        config: &RendererConfig,
        grid: &HemisphereGrid,
        scratch_patch: &mut [Sample],
        scratch_extent: &mut [Sample],
        scratch_ring: &mut [Sample],
        position: Vec3,
        aperture: f32,
        divergence: f32,
        out: &mut [Sample],
    ) -> VbapResult<()> {
        let norm = position.norm();
        if norm <= 0.0 {
            return Err(VbapError::BadArguments("zero-length source vector"));
        }
        let center = position.scaled(1.0 / norm);

        if center.z < 0.0 {
            // No speakers below the horizon.
            return Err(VbapError::NotInConvexHull);
        }

        let phi = center.z.acos();
        let theta = quantized_atan2(center.x, center.y);

        scratch_extent.fill(0.0);
        let mut found = 0;
        if aperture != 0.0 || divergence != 0.0 {
            found = Self::hemisphere_gains(
                grid,
                theta,
                phi,
                aperture,
                divergence,
                scratch_extent,
                scratch_ring,
            );
        }

        // A point source (or an extent so small it hits fewer than two
        // virtual sources) renders directly against the hull.
        if found < 2 {
            scratch_extent.fill(0.0);
            if Self::point_source_gains(config, position, scratch_patch, scratch_extent) <= 0.0 {
                return Err(VbapError::NotInConvexHull);
            }
        }

        for (o, g) in out.iter_mut().zip(scratch_extent.iter()) {
            *o += g;
        }

        Ok(())
    }

    // ============ Public rendering API ============

    /// Render one extended source, consulting the frame cache first
    pub fn render_extended_source(&mut self, source: &mut ExtendedSource) -> VbapResult<()> {
        if source.speaker_gains.len() != self.config.total_speaker_count()
            || source.channel_gains.len() != self.config.output_channel_count()
        {
            return Err(VbapError::BadArguments("unsized source gain vectors"));
        }
        if !(0.0..=1.0).contains(&source.gain) {
            return Err(VbapError::ParameterOutOfBounds("gain"));
        }

        source.speaker_gains.fill(0.0);

        // Cache scan: bit-identical parameters reuse the rendered gains.
        for entry in &mut self.cache {
            if entry.has_same_rendering_params(source) {
                source.speaker_gains.copy_from_slice(&entry.speaker_gains);
                source.channel_gains.copy_from_slice(&entry.channel_gains);
                entry.touched = true;
                return Ok(());
            }
        }

        let Self {
            config,
            grid,
            scratch_patch,
            scratch_extent,
            scratch_ring,
            ..
        } = self;

        Self::render_extent(
            config,
            grid,
            scratch_patch,
            scratch_extent,
            scratch_ring,
            source.position,
            source.aperture,
            source.divergence,
            &mut source.speaker_gains,
        )?;

        Self::speaker_downmix(config, &source.speaker_gains, &mut source.channel_gains)?;

        source.touched = true;
        self.cache.push(source.clone());
        Ok(())
    }

    /// Render an object: a single on-dome source or an interior group
    pub fn render_object(&mut self, object: &mut VbapObject) -> VbapResult<()> {
        if object.channel_gains.is_empty() {
            return Err(VbapError::BadArguments("object has no channel gains"));
        }
        object.channel_gains.fill(0.0);

        match object.extended_sources.len() {
            0 => return Err(VbapError::NoExtendedSource),
            1 => {
                // On the dome: the object's gains are the source's.
                self.render_extended_source(&mut object.extended_sources[0])?;
                let source = &object.extended_sources[0];
                object.channel_gains.copy_from_slice(&source.channel_gains);
                object.norm_gain = source.gain;
            }
            _ => {
                // Interior group: sum the sources weighted by their gains
                // and normalize to the gain sum.
                for source in object.extended_sources.iter_mut() {
                    self.render_extended_source(source)?;
                }
                object.norm_gain = 0.0;
                for source in &object.extended_sources {
                    for (sum, g) in object
                        .channel_gains
                        .iter_mut()
                        .zip(source.channel_gains.iter())
                    {
                        *sum += g * source.gain;
                    }
                    object.norm_gain += source.gain;
                }
            }
        }

        Self::normalize_channel_gains(object.norm_gain, &mut object.channel_gains);
        for g in object.channel_gains.iter_mut() {
            *g *= object.object_gain;
        }
        Ok(())
    }

    /// Route an LFE gain through the LFE speaker's downmix
    pub fn render_lfe(&self, gain: f32, channel_gains: &mut [Sample]) -> VbapResult<()> {
        let lfe = self.config.lfe_index().ok_or(VbapError::NoLfeSpeaker)?;
        if !(0.0..=1.0).contains(&gain) {
            return Err(VbapError::ParameterOutOfBounds("gain"));
        }
        let mut speaker_gains = vec![0.0; self.config.total_speaker_count()];
        speaker_gains[lfe] = gain;
        Self::speaker_downmix(&self.config, &speaker_gains, channel_gains)
    }

    /// Fold per-speaker gains into physical output channels
    fn speaker_downmix(
        config: &RendererConfig,
        speaker_gains: &[Sample],
        channel_gains: &mut [Sample],
    ) -> VbapResult<()> {
        if speaker_gains.is_empty() || channel_gains.is_empty() {
            return Err(VbapError::BadArguments("empty downmix buffers"));
        }
        channel_gains.fill(0.0);

        for (speaker, gain) in config.speakers().iter().zip(speaker_gains.iter()) {
            for entry in &speaker.downmix {
                let output = config
                    .output_index_for_channel(entry.channel)
                    .ok_or(VbapError::ParameterOutOfBounds("downmix channel"))?;
                channel_gains[output] += entry.coefficient * gain;
            }
        }
        Ok(())
    }

    /// L2-normalize channel gains to the norm target, zeroing when either
    /// is insignificant
    fn normalize_channel_gains(norm_gain: f32, channel_gains: &mut [Sample]) {
        let norm = channel_gains.iter().map(|g| g * g).sum::<f32>().sqrt();
        if norm > EPSILON && norm_gain > 0.0 {
            let scale = norm_gain / norm;
            for g in channel_gains.iter_mut() {
                *g *= scale;
            }
        } else {
            channel_gains.fill(0.0);
        }
    }

    // ============ Cache maintenance ============

    /// Frame-boundary sweep: evict entries untouched in the previous
    /// frame and clear the flag on survivors
    pub fn evict_untouched(&mut self) {
        self.cache.retain(|e| e.touched);
        for entry in &mut self.cache {
            entry.touched = false;
        }
        log::debug!("extended-source cache: {} entries retained", self.cache.len());
    }

    /// Drop the whole cache (program gap or configuration change)
    pub fn reset_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn config(&self) -> &Arc<RendererConfig> {
        &self.config
    }

    pub fn grid(&self) -> &HemisphereGrid {
        &self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn renderer(config: RendererConfig) -> VbapRenderer {
        VbapRenderer::new(Arc::new(config)).unwrap()
    }

    fn object_at(renderer: &VbapRenderer, position: Vec3, gain: f32) -> VbapObject {
        let config = renderer.config();
        let mut object = VbapObject::new(config.output_channel_count());
        let mut source = ExtendedSource::new(position, 1.0, 0.0, 0.0).unwrap();
        source.prepare(config.total_speaker_count(), config.output_channel_count());
        object.extended_sources.push(source);
        object.object_gain = gain;
        object
    }

    #[test]
    fn test_grid_shape() {
        let r = renderer(RendererConfig::surround_5_1());
        let grid = r.grid();
        assert_eq!(grid.rings.len(), PHI_DIVISIONS + 1);
        // Zenith ring has a single source; the horizon ring has the full
        // azimuthal resolution.
        assert_eq!(grid.rings[0].max_theta_index, 0);
        assert_eq!(
            grid.rings[PHI_DIVISIONS].max_theta_index,
            THETA_DIVISIONS as i32 - 1
        );
    }

    #[test]
    fn test_point_source_on_speaker_is_one_hot() {
        let mut r = renderer(RendererConfig::surround_5_1());
        let mut object = object_at(&r, Vec3::new(0.0, 1.0, 0.0), 1.0);
        r.render_object(&mut object).unwrap();

        // Output order: L R C LFE LS RS
        assert_abs_diff_eq!(object.channel_gains[2], 1.0, epsilon = 1e-5);
        for (i, g) in object.channel_gains.iter().enumerate() {
            if i != 2 {
                assert_abs_diff_eq!(*g, 0.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_point_source_between_speakers() {
        let mut r = renderer(RendererConfig::surround_5_1());
        let mut object = object_at(&r, Vec3::from_degrees(-15.0, 0.0), 1.0);
        r.render_object(&mut object).unwrap();

        // Energy splits between L and C only.
        assert!(object.channel_gains[0] > 0.1);
        assert!(object.channel_gains[2] > 0.1);
        for i in [1usize, 3, 4, 5] {
            assert_abs_diff_eq!(object.channel_gains[i], 0.0, epsilon = 1e-5);
        }
        let energy: f32 = object.channel_gains.iter().map(|g| g * g).sum();
        assert_abs_diff_eq!(energy, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_object_gain_scales_output() {
        let mut r = renderer(RendererConfig::surround_5_1());
        let mut object = object_at(&r, Vec3::new(0.0, 1.0, 0.0), 0.5);
        r.render_object(&mut object).unwrap();
        assert_abs_diff_eq!(object.channel_gains[2], 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_extent_spreads_energy() {
        let mut r = renderer(RendererConfig::surround_5_1());
        let config = r.config().clone();

        let mut object = VbapObject::new(config.output_channel_count());
        let mut source = ExtendedSource::new(Vec3::new(0.0, 1.0, 0.0), 1.0, 1.2, 0.0).unwrap();
        source.prepare(config.total_speaker_count(), config.output_channel_count());
        object.extended_sources.push(source);

        r.render_object(&mut object).unwrap();

        let active = object.channel_gains.iter().filter(|g| **g > 1e-4).count();
        assert!(active >= 3, "extent touched only {active} channels");
        let energy: f32 = object.channel_gains.iter().map(|g| g * g).sum();
        assert_abs_diff_eq!(energy, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_cache_reuse_and_eviction() {
        let mut r = renderer(RendererConfig::surround_5_1());
        let mut object = object_at(&r, Vec3::from_degrees(20.0, 10.0), 1.0);

        r.render_object(&mut object).unwrap();
        assert_eq!(r.cache_len(), 1);
        let first = object.channel_gains.clone();

        // Identical parameters hit the cache and reproduce the gains
        // bit for bit.
        let mut object2 = object_at(&r, Vec3::from_degrees(20.0, 10.0), 1.0);
        r.render_object(&mut object2).unwrap();
        assert_eq!(r.cache_len(), 1);
        assert_eq!(first, object2.channel_gains);

        // Frame boundary keeps touched entries once, then evicts.
        r.evict_untouched();
        assert_eq!(r.cache_len(), 1);
        r.evict_untouched();
        assert_eq!(r.cache_len(), 0);

        r.render_object(&mut object).unwrap();
        assert_eq!(r.cache_len(), 1);
        r.reset_cache();
        assert_eq!(r.cache_len(), 0);
    }

    #[test]
    fn test_interior_triple_energy() {
        let mut r = renderer(RendererConfig::surround_5_1());
        let config = r.config().clone();

        let mut object = VbapObject::new(config.output_channel_count());
        for (az, gain) in [(-90.0, 0.5), (90.0, 0.5)] {
            let mut source = ExtendedSource::new(Vec3::from_degrees(az, 0.0), gain, 0.0, 0.0).unwrap();
            source.prepare(config.total_speaker_count(), config.output_channel_count());
            object.extended_sources.push(source);
        }

        r.render_object(&mut object).unwrap();
        // Norm target is the source gain sum.
        assert_abs_diff_eq!(object.norm_gain, 1.0, epsilon = 1e-6);
        let energy: f32 = object.channel_gains.iter().map(|g| g * g).sum();
        assert_abs_diff_eq!(energy, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_lfe_routing() {
        let r = renderer(RendererConfig::surround_5_1());
        let mut gains = vec![0.0; 6];
        r.render_lfe(0.8, &mut gains).unwrap();
        assert_abs_diff_eq!(gains[3], 0.8, epsilon = 1e-6);
        assert_eq!(gains.iter().filter(|g| **g != 0.0).count(), 1);
    }

    #[test]
    fn test_source_parameter_validation() {
        assert!(ExtendedSource::new(Vec3::new(0.0, 1.0, -0.1), 1.0, 0.0, 0.0).is_err());
        assert!(ExtendedSource::new(Vec3::new(0.0, 1.0, 0.0), 1.5, 0.0, 0.0).is_err());
        assert!(ExtendedSource::new(Vec3::new(0.0, 1.0, 0.0), 1.0, 4.0, 0.0).is_err());
        assert!(ExtendedSource::new(Vec3::new(0.0, 1.0, 0.0), 1.0, 0.0, 2.0).is_err());
        assert!(ExtendedSource::new(Vec3::new(0.0, 1.0, 0.0), 1.0, PI, FRAC_PI_2).is_ok());
    }

    #[test]
    fn test_latitude_sigma_cases() {
        // Huge aperture swallows the ring.
        assert_eq!(
            VbapRenderer::latitude_sigma(0.5, PI, 0.4),
            Some(PI)
        );
        // Disjoint ring.
        assert_eq!(VbapRenderer::latitude_sigma(0.1, 0.05, 1.2), None);
        // Partial intersection lies strictly between.
        let sigma = VbapRenderer::latitude_sigma(0.8, 0.3, 0.6).unwrap();
        assert!(sigma > 0.0 && sigma < PI, "sigma {sigma}");
    }

    #[test]
    fn test_no_extended_source_error() {
        let mut r = renderer(RendererConfig::surround_5_1());
        let mut object = VbapObject::new(6);
        assert!(matches!(
            r.render_object(&mut object),
            Err(VbapError::NoExtendedSource)
        ));
    }
}
