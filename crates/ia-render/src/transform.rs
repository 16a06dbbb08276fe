//! Coordinate transforms between program space and the panner domain
//!
//! Forward: the "shoebox" transform maps unit-cube program positions onto
//! room-centered spherical coordinates, interpolating over a normalized
//! theatrical room model (floor, mid-plane and ceiling speaker bands).
//!
//! Inverse: a pyra-mesa decomposition maps on-dome Cartesian positions
//! back onto the unit cube. The patch tables are derived at construction
//! from the same room model: every cube-face region over which the
//! forward map is projective gets a patch whose MDA basis is the raw
//! forward image of its vertices, which makes the inverse exact on the
//! linear regions (floor ring, wall bands, ceiling) and consistent at all
//! patch boundaries.

use crate::config::{invert_columns, mat3_mul_vec3};
use crate::error::{TransformError, TransformResult};
use ia_core::{CubePosition, EPSILON, Spherical, Vec3};
use nalgebra::{Matrix3, Vector3};
use std::f32::consts::PI;

/// Listener distance from the front of a room of depth 2.0
const ROOM_LISTENER_LOCATION: f32 = 1.0;

/// Rows in the speaker tables belonging to the floor band
const FLOOR_SPEAKER_ROWS: usize = 8;

/// y position (normalized, front positive) of the front side speakers
const Y_FRONT_SIDE_SPEAKER: f32 = 0.75;
/// y position of the rear side speakers
const Y_REAR_SIDE_SPEAKER: f32 = -0.75;

// Room corner directions (azimuth deg, elevation deg), ordered
// left/right front low, left/right rear low, then the same for the top.
const ROOM_CORNER_DIRECTIONS: [[f32; 2]; 8] = [
    [-37.5, 0.0],
    [37.5, 0.0],
    [-142.5, 0.0],
    [142.5, 0.0],
    [-37.5, 25.97],
    [37.5, 25.97],
    [-142.5, 25.97],
    [142.5, 25.97],
];

// Theatrical speaker directions. Rows 0-3: front/rear wall boundaries,
// rows 4-7: side wall boundaries, rows 8-15: ceiling band (side heights
// coincide with the ceiling corner speakers).
const SPEAKER_DIRECTIONS_THEATRICAL: [[f32; 2]; 16] = [
    [-30.0, 0.0],
    [30.0, 0.0],
    [-150.0, 0.0],
    [150.0, 0.0],
    [-45.0, 0.0],
    [45.0, 0.0],
    [-135.0, 0.0],
    [135.0, 0.0],
    [-24.79, 35.99],
    [24.79, 35.99],
    [-155.21, 35.99],
    [155.21, 35.99],
    [-24.79, 35.99],
    [24.79, 35.99],
    [-155.21, 35.99],
    [155.21, 35.99],
];

// Mid-plane (half room height) variant of the same table. The mid-plane
// elevations put the middle of the side walls on the height speakers.
const SPEAKER_DIRECTIONS_MID_PLANE: [[f32; 2]; 16] = [
    [-30.0, 0.0],
    [30.0, 0.0],
    [-150.0, 0.0],
    [150.0, 0.0],
    [-45.0, 0.0],
    [45.0, 0.0],
    [-135.0, 0.0],
    [135.0, 0.0],
    [-30.0, 21.0],
    [30.0, 21.0],
    [-150.0, 21.0],
    [150.0, 21.0],
    [-45.0, 22.2],
    [45.0, 22.2],
    [-135.0, 22.2],
    [135.0, 22.2],
];

// Speaker-table row indices used by the wedge logic
const ROW_RIGHT_FRONT_TOP: usize = 9;
const ROW_RIGHT_REAR_TOP: usize = 11;
const ROW_RIGHT_FRONT_SIDE_TOP: usize = 13;
const ROW_RIGHT_REAR_SIDE_TOP: usize = 15;

// Corner-table row indices
const CORNER_LEFT_FRONT_TOP: usize = 4;
const CORNER_RIGHT_FRONT_TOP: usize = 5;
const CORNER_LEFT_REAR_TOP: usize = 6;

/// One pyra-mesa patch: MDA-domain inverse basis, cube-domain basis, and
/// the cube face it projects onto
#[derive(Debug, Clone)]
struct CubePatch {
    mda_inv: [[f32; 3]; 3],
    /// Columns are the cube vertices (room-centered domain)
    iab_basis: [[f32; 3]; 3],
    normal: Vec3,
    v_dot_n: f32,
}

/// Program-space / panner-space coordinate transforms, built once
#[derive(Debug, Clone)]
pub struct SpatialTransform {
    room_corners: [[f32; 3]; 8],
    /// Speaker band for the upper half of the room (mid-plane to ceiling)
    speakers_upper: [[f32; 3]; 16],
    /// Speaker band for the lower half (floor to mid-plane)
    speakers_mid: [[f32; 3]; 16],
    patches: Vec<CubePatch>,
}

/// Compute the wall point a direction hits, assuming front/rear walls at
/// y = +-1 and scaling x by tan(azimuth)
fn direction_to_wall_point(az_deg: f32, el_deg: f32) -> [f32; 3] {
    let cy = if (-90.0..=90.0).contains(&az_deg) {
        ROOM_LISTENER_LOCATION
    } else {
        -(2.0 - ROOM_LISTENER_LOCATION)
    };
    let cx = cy * (az_deg.to_radians()).tan();
    let rh = (cx * cx + cy * cy).sqrt();
    let cz = rh * (el_deg.to_radians()).tan();
    [cx, cy, cz]
}

impl SpatialTransform {
    pub fn new() -> Self {
        let mut room_corners = [[0.0f32; 3]; 8];
        for (corner, dir) in room_corners.iter_mut().zip(ROOM_CORNER_DIRECTIONS.iter()) {
            *corner = direction_to_wall_point(dir[0], dir[1]);
        }

        // Ceiling speakers do not lie on the walls: project them along
        // their ray onto the plane of the top room corners.
        let mut speakers_upper = [[0.0f32; 3]; 16];
        for (row, dir) in speakers_upper
            .iter_mut()
            .zip(SPEAKER_DIRECTIONS_THEATRICAL.iter())
        {
            let mut p = direction_to_wall_point(dir[0], dir[1]);
            if dir[1] > 0.0 {
                if let Some(t) = intersect_ceiling(&p, &room_corners) {
                    p = [p[0] * (1.0 - t), p[1] * (1.0 - t), p[2] * (1.0 - t)];
                }
            }
            *row = p;
        }

        let mut speakers_mid = [[0.0f32; 3]; 16];
        for (i, dir) in SPEAKER_DIRECTIONS_MID_PLANE.iter().enumerate() {
            let p = direction_to_wall_point(dir[0], dir[1]);
            speakers_mid[i] = p;
            // The mid-plane band doubles as the floor band of the upper
            // half of the room.
            if i >= FLOOR_SPEAKER_ROWS {
                speakers_upper[i - FLOOR_SPEAKER_ROWS] = p;
            }
        }

        let mut transform = Self {
            room_corners,
            speakers_upper,
            speakers_mid,
            patches: Vec::new(),
        };
        transform.patches = transform.build_cube_patches();
        transform
    }

    // ============ Forward (shoebox) ============

    /// Unit-cube program position to room-centered spherical coordinates.
    ///
    /// Radius 1.0 means the position sits on the dome (a cube face);
    /// interior positions come out with radius < 1.
    pub fn cube_to_spherical(&self, x: f32, y: f32, z: f32) -> TransformResult<Spherical> {
        let in_range = |v: f32| (0.0..=1.0).contains(&v);
        if !(in_range(x) && in_range(y) && in_range(z)) {
            return Err(TransformError::OutOfRange);
        }

        // Shift origin from the front-left corner to the room center.
        let cx = 2.0 * x - 1.0;
        let cy = 1.0 - 2.0 * y;
        let cz = z;

        let [x1, y1, z1] = self.mapped_point(cx, cy, cz);

        let r1 = (x1 * x1 + y1 * y1 + z1 * z1).sqrt();
        let (azimuth, elevation) = if r1 != 0.0 {
            (x1.atan2(y1), (z1 / r1).asin().max(0.0))
        } else {
            (0.0, 0.0)
        };

        // Radius is the ratio of the listener->object distance to the
        // listener->cube-face distance along the same ray.
        let x2 = cx.abs();
        let y2 = cy.abs();

        let ceiling = cz > 0.0 && x2 / cz < 1.0 && y2 / cz < 1.0;
        let (xi, yi, zi) = if ceiling {
            (x2 / cz, y2 / cz, 1.0)
        } else if x2 > y2 {
            if x2 != 0.0 {
                (1.0, y2 / x2, cz / x2)
            } else {
                (1.0, 0.0, 0.0)
            }
        } else if y2 != 0.0 {
            (x2 / y2, 1.0, cz / y2)
        } else {
            (0.0, 1.0, 0.0)
        };

        let r_face = (xi * xi + yi * yi + zi * zi).sqrt();
        let r_obj = (x2 * x2 + y2 * y2 + cz * cz).sqrt();
        let radius = if r_face != 0.0 { r_obj / r_face } else { 0.0 };

        Ok(Spherical::new(azimuth, elevation, radius))
    }

    /// Unit-cube program position to room-centered Cartesian
    pub fn cube_to_cartesian(&self, x: f32, y: f32, z: f32) -> TransformResult<Vec3> {
        let s = self.cube_to_spherical(x, y, z)?;
        Ok(s.to_cartesian())
    }

    /// 1-D spread to extent: aperture grows linearly to pi/4 below spread
    /// 0.5, then steeper toward pi. Divergence is fixed at zero.
    pub fn spread_to_extent(&self, spread: f32) -> TransformResult<(f32, f32)> {
        if !(0.0..=1.0).contains(&spread) {
            return Err(TransformError::OutOfRange);
        }
        let aperture = if spread < 0.5 {
            spread / 2.0
        } else {
            spread / 2.0 + (spread - 0.5)
        } * PI;
        Ok((aperture, 0.0))
    }

    // ============ Inverse (pyra-mesa) ============

    /// On-dome Cartesian position back to the unit cube.
    ///
    /// Accumulates the projections of every intersecting patch; boundary
    /// hits count half, a vertex hit short-circuits.
    pub fn cartesian_to_cube(&self, position: Vec3) -> TransformResult<CubePosition> {
        let mut count = 0.0f32;
        let mut cube = Vec3::default();

        for patch in &self.patches {
            let coefs = mat3_mul_vec3(&patch.mda_inv, position);
            if coefs.x < -EPSILON || coefs.y < -EPSILON || coefs.z < -EPSILON {
                continue;
            }

            let significant = (coefs.x > EPSILON) as u32
                + (coefs.y > EPSILON) as u32
                + (coefs.z > EPSILON) as u32;

            // Map the patch coefficients into the cube basis, then push
            // the point onto the cube face along the patch normal.
            let c = mat3_mul_vec3(&patch.iab_basis, coefs);
            let c_dot_n = c.dot(&patch.normal);
            if c_dot_n.abs() < EPSILON {
                continue;
            }
            let d = c.scaled(patch.v_dot_n / c_dot_n);

            if significant == 2 {
                cube = cube + d.scaled(0.5);
                count += 0.5;
            } else {
                cube = cube + d;
                count += 1.0;
            }

            if significant == 1 {
                break;
            }
        }

        if count == 0.0 {
            return Err(TransformError::NoPatchIntersection);
        }

        let averaged = cube.scaled(1.0 / count);
        Ok(CubePosition::clamped(
            (averaged.x + 1.0) / 2.0,
            (1.0 - averaged.y) / 2.0,
            averaged.z,
        ))
    }

    // ============ Internals ============

    /// Scale the speaker bands to the height of the object
    fn scaled_speaker_coordinates(&self, z: f32) -> [[f32; 3]; 16] {
        let mut scaled = [[0.0f32; 3]; 16];
        let lower = z <= 0.5;
        for i in 0..16 {
            if i < FLOOR_SPEAKER_ROWS {
                scaled[i] = if lower {
                    self.speakers_mid[i]
                } else {
                    self.speakers_upper[i]
                };
            } else if lower {
                let j = i - FLOOR_SPEAKER_ROWS;
                let blend = (0.5 - z) / 0.5;
                scaled[i][0] =
                    self.speakers_mid[i][0] + blend * (self.speakers_mid[j][0] - self.speakers_mid[i][0]);
                scaled[i][1] =
                    self.speakers_mid[i][1] + blend * (self.speakers_mid[j][1] - self.speakers_mid[i][1]);
                scaled[i][2] = self.speakers_mid[i][2] * (z / 0.5);
            } else {
                let j = i - FLOOR_SPEAKER_ROWS;
                let blend = (1.0 - z) / 0.5;
                scaled[i][0] = self.speakers_upper[i][0]
                    + blend * (self.speakers_upper[j][0] - self.speakers_upper[i][0]);
                scaled[i][1] = self.speakers_upper[i][1]
                    + blend * (self.speakers_upper[j][1] - self.speakers_upper[i][1]);
                scaled[i][2] = self.speakers_upper[j][2]
                    + (self.speakers_upper[i][2] - self.speakers_upper[j][2]) * ((z - 0.5) / 0.5);
            }
        }
        scaled
    }

    /// Map a room-centered cube position onto the scaled speaker polygon.
    ///
    /// Returns the unnormalized direction vector; its angles are the
    /// object's azimuth/elevation. The (x, y) plane splits into wedges at
    /// the corner diagonal and the side-speaker lines.
    fn mapped_point(&self, x: f32, y: f32, z: f32) -> [f32; 3] {
        let scaled = self.scaled_speaker_coordinates(z);
        let xabs = x.abs();

        if y >= 0.0 {
            let (slope, steep) = if xabs != 0.0 {
                (y / xabs, false)
            } else {
                (0.0, true)
            };

            // Side-speaker line pulls toward the corner as z approaches
            // the ceiling.
            let mut y_side = Y_FRONT_SIDE_SPEAKER;
            if z > 0.5 {
                y_side += (1.0 - y_side) * ((z - 0.5) * 2.0);
            }

            let ys1 = scaled[ROW_RIGHT_FRONT_SIDE_TOP][1];
            let xs1 = scaled[ROW_RIGHT_FRONT_SIDE_TOP][0];
            let ys2 = scaled[ROW_RIGHT_FRONT_TOP][1];
            let xs2 = scaled[ROW_RIGHT_FRONT_TOP][0];

            if slope >= 1.0 || steep {
                [x * xs2, y * ys2, scaled[ROW_RIGHT_FRONT_TOP][2]]
            } else if slope >= y_side {
                // Between the corner diagonal and the side-speaker line
                let y1 = xabs * ys2;
                if 1.0 - y_side != 0.0 {
                    let x1 = x * xs2 + (x * (1.0 - slope)) * ((xs1 - xs2) / (1.0 - y_side));
                    let f = (slope - y_side) / (1.0 - y_side);
                    let z1 = f * scaled[ROW_RIGHT_FRONT_TOP][2]
                        + (1.0 - f) * scaled[ROW_RIGHT_FRONT_SIDE_TOP][2];
                    [x1, y1, z1]
                } else {
                    [x * xs1, y1, scaled[ROW_RIGHT_FRONT_TOP][2]]
                }
            } else {
                // Behind the side-speaker line but in front of the listener
                [x * xs1, (y / y_side) * ys1, scaled[ROW_RIGHT_FRONT_SIDE_TOP][2]]
            }
        } else {
            let (slope, steep) = if xabs > EPSILON {
                (-y / xabs, false)
            } else {
                (0.0, true)
            };

            let mut y_side = -Y_REAR_SIDE_SPEAKER;
            if z > 0.5 {
                y_side += (1.0 - y_side) * ((z - 0.5) * 2.0);
            }

            let ys1 = -scaled[ROW_RIGHT_REAR_SIDE_TOP][1];
            let xs1 = scaled[ROW_RIGHT_REAR_SIDE_TOP][0];
            let ys2 = -scaled[ROW_RIGHT_REAR_TOP][1];
            let xs2 = scaled[ROW_RIGHT_REAR_TOP][0];

            if slope >= 1.0 || steep {
                [x * xs2, y * ys2, scaled[ROW_RIGHT_REAR_TOP][2]]
            } else if slope >= y_side {
                let y1 = xabs * -ys2;
                if 1.0 - y_side != 0.0 {
                    let x1 = x * xs2 + (x * (1.0 - slope)) * ((xs1 - xs2) / (1.0 - y_side));
                    let f = (slope - y_side) / (1.0 - y_side);
                    let z1 = f * scaled[ROW_RIGHT_REAR_TOP][2]
                        + (1.0 - f) * scaled[ROW_RIGHT_REAR_SIDE_TOP][2];
                    [x1, y1, z1]
                } else {
                    [x * xs1, y1, scaled[ROW_RIGHT_REAR_SIDE_TOP][2]]
                }
            } else {
                [x * xs1, (y / y_side) * ys1, scaled[ROW_RIGHT_REAR_SIDE_TOP][2]]
            }
        }
    }

    /// Partition the cube faces into patches whose vertices are forward
    /// mapped to form the MDA bases
    fn build_cube_patches(&self) -> Vec<CubePatch> {
        let mut patches = Vec::new();

        let push_triangle = |list: &mut Vec<CubePatch>, verts: [Vec3; 3], normal: Vec3| {
            let images: Vec<Vec3> = verts
                .iter()
                .map(|v| {
                    let [mx, my, mz] = self.mapped_point(v.x, v.y, v.z);
                    Vec3::new(mx, my, mz)
                })
                .collect();
            let Some(mda_inv) = invert_columns(images[0], images[1], images[2]) else {
                log::warn!("degenerate pyra-mesa patch skipped");
                return;
            };
            let mut iab_basis = [[0.0f32; 3]; 3];
            for (c, v) in verts.iter().enumerate() {
                iab_basis[0][c] = v.x;
                iab_basis[1][c] = v.y;
                iab_basis[2][c] = v.z;
            }
            list.push(CubePatch {
                mda_inv,
                iab_basis,
                normal,
                v_dot_n: verts[0].dot(&normal),
            });
        };

        let push_quad = |list: &mut Vec<CubePatch>, q: [Vec3; 4], normal: Vec3| {
            push_triangle(list, [q[0], q[1], q[2]], normal);
            push_triangle(list, [q[0], q[2], q[3]], normal);
        };

        let v = Vec3::new;

        // Front and rear walls: one quad per height band.
        for &(z0, z1) in &[(0.0, 0.5), (0.5, 1.0)] {
            push_quad(
                &mut patches,
                [v(-1.0, 1.0, z0), v(1.0, 1.0, z0), v(1.0, 1.0, z1), v(-1.0, 1.0, z1)],
                v(0.0, 1.0, 0.0),
            );
            push_quad(
                &mut patches,
                [v(-1.0, -1.0, z0), v(1.0, -1.0, z0), v(1.0, -1.0, z1), v(-1.0, -1.0, z1)],
                v(0.0, -1.0, 0.0),
            );
        }

        // Side walls. The lower band splits at the side-speaker lines
        // (y = +-0.75); in the upper band those lines run to the corners.
        for &sx in &[1.0f32, -1.0] {
            let n = v(sx, 0.0, 0.0);
            let ys = Y_FRONT_SIDE_SPEAKER;

            // Lower band strips
            push_quad(
                &mut patches,
                [v(sx, 1.0, 0.0), v(sx, ys, 0.0), v(sx, ys, 0.5), v(sx, 1.0, 0.5)],
                n,
            );
            push_quad(
                &mut patches,
                [v(sx, ys, 0.0), v(sx, -ys, 0.0), v(sx, -ys, 0.5), v(sx, ys, 0.5)],
                n,
            );
            push_quad(
                &mut patches,
                [v(sx, -ys, 0.0), v(sx, -1.0, 0.0), v(sx, -1.0, 0.5), v(sx, -ys, 0.5)],
                n,
            );

            // Upper band: corner triangles plus the narrowing middle
            push_triangle(
                &mut patches,
                [v(sx, 1.0, 0.5), v(sx, ys, 0.5), v(sx, 1.0, 1.0)],
                n,
            );
            push_quad(
                &mut patches,
                [v(sx, ys, 0.5), v(sx, -ys, 0.5), v(sx, -1.0, 1.0), v(sx, 1.0, 1.0)],
                n,
            );
            push_triangle(
                &mut patches,
                [v(sx, -1.0, 0.5), v(sx, -ys, 0.5), v(sx, -1.0, 1.0)],
                n,
            );
        }

        // Ceiling: fan around the zenith.
        let ceiling_corners = [
            v(-1.0, 1.0, 1.0),
            v(1.0, 1.0, 1.0),
            v(1.0, -1.0, 1.0),
            v(-1.0, -1.0, 1.0),
        ];
        let center = v(0.0, 0.0, 1.0);
        let up = v(0.0, 0.0, 1.0);
        for i in 0..4 {
            push_triangle(
                &mut patches,
                [center, ceiling_corners[i], ceiling_corners[(i + 1) % 4]],
                up,
            );
        }

        patches
    }
}

/// Intersection parameter of a ray with the plane of the top corners
fn intersect_ceiling(p: &[f32; 3], corners: &[[f32; 3]; 8]) -> Option<f32> {
    let lft = corners[CORNER_LEFT_FRONT_TOP];
    let rft = corners[CORNER_RIGHT_FRONT_TOP];
    let lrt = corners[CORNER_LEFT_REAR_TOP];

    let m = Matrix3::from_columns(&[
        Vector3::new(p[0], p[1], p[2]),
        Vector3::new(lft[0] - rft[0], lft[1] - rft[1], lft[2] - rft[2]),
        Vector3::new(lrt[0] - lft[0], lrt[1] - lft[1], lrt[2] - lft[2]),
    ]);
    let b = Vector3::new(p[0] - lft[0], p[1] - lft[1], p[2] - lft[2]);
    let inv = m.try_inverse()?;
    let c = inv * b;
    Some(c[0])
}

impl Default for SpatialTransform {
    fn default() -> Self {
        Self::new()
    }
}
