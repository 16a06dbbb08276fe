//! Interior panning: triple-balance decomposition
//!
//! The VBAP engine only renders on-dome sources. An interior position
//! (radius < 1) is decomposed into up to three on-dome extended sources:
//! a left/right pair on the horizontal circle at the object's height plus
//! a projected source at the object's own direction whose gain falls off
//! toward the listener.

use crate::error::{VbapError, VbapResult};
use crate::vbap::ExtendedSource;
use ia_core::{EPSILON, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

/// Entries in the pan-profile gain table
const GAIN_TABLE_SIZE: usize = 201;

/// Normalized room side-speaker azimuths (radians)
const SIDE_FRONT_RIGHT: f32 = PI / 4.0;
const SIDE_FRONT_LEFT: f32 = -PI / 4.0;
const SIDE_REAR_RIGHT: f32 = 3.0 * PI / 4.0;
const SIDE_REAR_LEFT: f32 = -3.0 * PI / 4.0;

/// Radius (0-100 scale) where the projected source's gain reaches zero.
/// Chosen by listening tests for inward-panning directionality.
const INWARD_PAN_ZERO_GAIN_RADIUS: f32 = 75.0;

/// Decomposes interior positions into on-dome extended sources
#[derive(Debug, Clone)]
pub struct InteriorPanner {
    /// Sine pan profile mapping a left-right balance to linear gain
    gain_table: Vec<f32>,
}

impl InteriorPanner {
    pub fn new() -> Self {
        let gain_table = (0..GAIN_TABLE_SIZE)
            .map(|i| ((i as f32 / GAIN_TABLE_SIZE as f32) * FRAC_PI_2).sin())
            .collect();
        Self { gain_table }
    }

    /// Map a spherical source to one on-dome extended source (radius on
    /// the dome) or a left/right/projected triple (interior).
    ///
    /// Extent parameters pass through to every produced source.
    pub fn map_to_extended_sources(
        &self,
        azimuth: f32,
        elevation: f32,
        radius: f32,
        aperture: f32,
        divergence: f32,
    ) -> VbapResult<Vec<ExtendedSource>> {
        if radius >= 1.0 - EPSILON {
            // On the dome: a single source at the input direction.
            return Ok(vec![make_source(
                azimuth, elevation, 1.0, aperture, divergence,
            )?]);
        }
        if radius < 0.0 {
            return Err(VbapError::ParameterOutOfBounds("radius"));
        }

        // Project onto the horizontal circle at the object's height.
        let height = radius * elevation.sin();
        let r_circle = (1.0 - height * height).sqrt();
        let r_obj = radius * elevation.cos();

        let mut y1 = r_obj * azimuth.cos();
        let mut x1 = r_obj * azimuth.sin();
        x1 = x1.clamp(-r_circle, r_circle);
        y1 = y1.clamp(-r_circle, r_circle);

        // Right intersection of the horizontal line through the object
        // with the circle; the left source mirrors it.
        let x_right = (r_circle * r_circle - y1 * y1).sqrt();
        let mut right_azimuth = x_right.atan2(y1);
        let mut left_azimuth = -right_azimuth;

        let pair_elevation = height.atan2(r_circle).min(FRAC_PI_2);

        // Left/right balance from the sine profile.
        let index = if x_right > EPSILON {
            (((x_right + x1) / (2.0 * x_right)) * GAIN_TABLE_SIZE as f32) as i64
        } else {
            (GAIN_TABLE_SIZE / 2) as i64
        };
        let index = index.clamp(0, GAIN_TABLE_SIZE as i64 - 1) as usize;

        let mut right_gain = self.gain_table[index];
        let mut left_gain = self.gain_table[GAIN_TABLE_SIZE - 1 - index];

        let pair_sum = left_gain + right_gain;
        right_gain /= pair_sum;
        left_gain /= pair_sum;

        // Third source at the original direction, fading out as the
        // object approaches the listener.
        let projected_gain = (((100.0 * radius) - INWARD_PAN_ZERO_GAIN_RADIUS)
            / (100.0 - INWARD_PAN_ZERO_GAIN_RADIUS))
            .max(0.0);

        // Keep the pair off the mid-side region: clamp onto the side
        // wedge boundaries, trading gain for the restriction.
        if right_azimuth < SIDE_FRONT_RIGHT {
            let ratio = right_azimuth / SIDE_FRONT_RIGHT;
            right_gain *= ratio;
            left_gain *= ratio;
            right_azimuth = SIDE_FRONT_RIGHT;
            left_azimuth = SIDE_FRONT_LEFT;
        } else if right_azimuth > SIDE_REAR_RIGHT {
            let ratio = (PI - right_azimuth) / (PI - SIDE_REAR_RIGHT);
            right_gain *= ratio;
            left_gain *= ratio;
            right_azimuth = SIDE_REAR_RIGHT;
            left_azimuth = SIDE_REAR_LEFT;
        }

        // Renormalize the triple and clamp out negatives.
        let gain_sum = left_gain + right_gain + projected_gain;
        let projected_gain = projected_gain / gain_sum;
        let left_gain = (left_gain / gain_sum).max(0.0);
        let right_gain = (right_gain / gain_sum).max(0.0);

        Ok(vec![
            make_source(left_azimuth, pair_elevation, left_gain, aperture, divergence)?,
            make_source(right_azimuth, pair_elevation, right_gain, aperture, divergence)?,
            make_source(azimuth, elevation, projected_gain, aperture, divergence)?,
        ])
    }
}

impl Default for InteriorPanner {
    fn default() -> Self {
        Self::new()
    }
}

fn make_source(
    azimuth: f32,
    elevation: f32,
    gain: f32,
    aperture: f32,
    divergence: f32,
) -> VbapResult<ExtendedSource> {
    let position = Vec3::from_azimuth_elevation(azimuth, elevation);
    ExtendedSource::new(position, gain, aperture, divergence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_on_dome_passthrough() {
        let panner = InteriorPanner::new();
        let sources = panner
            .map_to_extended_sources(0.5, 0.25, 1.0, 0.1, 0.05)
            .unwrap();
        assert_eq!(sources.len(), 1);
        assert_abs_diff_eq!(sources[0].gain, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sources[0].aperture, 0.1, epsilon = 1e-6);

        let expected = Vec3::from_azimuth_elevation(0.5, 0.25);
        assert_abs_diff_eq!(sources[0].position.x, expected.x, epsilon = 1e-6);
        assert_abs_diff_eq!(sources[0].position.z, expected.z, epsilon = 1e-6);
    }

    #[test]
    fn test_negative_radius_rejected() {
        let panner = InteriorPanner::new();
        assert!(
            panner
                .map_to_extended_sources(0.0, 0.0, -0.1, 0.0, 0.0)
                .is_err()
        );
    }

    #[test]
    fn test_listener_position_triple() {
        let panner = InteriorPanner::new();
        let sources = panner
            .map_to_extended_sources(0.0, 0.0, 0.0, 0.0, 0.0)
            .unwrap();
        assert_eq!(sources.len(), 3);

        let (left, right, projected) = (&sources[0], &sources[1], &sources[2]);

        // Pair sits at +-90 degrees with equal gains; the projected
        // source is fully faded at the listener.
        assert_abs_diff_eq!(left.gain, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(right.gain, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(projected.gain, 0.0, epsilon = 1e-6);

        assert_abs_diff_eq!(right.position.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(left.position.x, -1.0, epsilon = 1e-5);

        let total: f32 = sources.iter().map(|s| s.gain).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_gain_sum_unity_across_radii() {
        let panner = InteriorPanner::new();
        for radius in [0.0, 0.2, 0.5, 0.75, 0.9, 0.99] {
            let sources = panner
                .map_to_extended_sources(0.3, 0.2, radius, 0.0, 0.0)
                .unwrap();
            let total: f32 = sources.iter().map(|s| s.gain).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-5);
            for s in &sources {
                assert!(s.gain >= 0.0);
            }
        }
    }

    #[test]
    fn test_projected_gain_falloff() {
        let panner = InteriorPanner::new();

        // Below the zero-gain radius the projected source is silent.
        let sources = panner
            .map_to_extended_sources(0.0, 0.0, 0.5, 0.0, 0.0)
            .unwrap();
        assert_abs_diff_eq!(sources[2].gain, 0.0, epsilon = 1e-6);

        // Above it, the projected source fades back in.
        let sources = panner
            .map_to_extended_sources(0.0, 0.0, 0.9, 0.0, 0.0)
            .unwrap();
        assert!(sources[2].gain > 0.0);
    }

    #[test]
    fn test_front_wedge_clamp() {
        let panner = InteriorPanner::new();
        // An object close to the front wall: the pair intersection lands
        // inside the front wedge and is clamped to +-45 degrees.
        let sources = panner
            .map_to_extended_sources(0.0, 0.0, 0.9, 0.0, 0.0)
            .unwrap();

        let left = sources[0].position.to_spherical();
        let right = sources[1].position.to_spherical();
        assert_abs_diff_eq!(right.azimuth, SIDE_FRONT_RIGHT, epsilon = 1e-5);
        assert_abs_diff_eq!(left.azimuth, SIDE_FRONT_LEFT, epsilon = 1e-5);
    }

    #[test]
    fn test_elevated_interior_pair_height() {
        let panner = InteriorPanner::new();
        let elevation = 0.6f32;
        let radius = 0.5f32;
        let sources = panner
            .map_to_extended_sources(0.0, elevation, radius, 0.0, 0.0)
            .unwrap();

        // The pair's elevation matches the circle at the object's height.
        let height = radius * elevation.sin();
        let r_circle = (1.0 - height * height).sqrt();
        let expected = height.atan2(r_circle);
        let left = sources[0].position.to_spherical();
        assert_abs_diff_eq!(left.elevation, expected, epsilon = 1e-5);
    }
}
