//! 3-D vectors and the renderer's spherical coordinate convention

use serde::{Deserialize, Serialize};

/// Cartesian vector in the room-centered VBAP domain.
///
/// x increases to the right, y to the front, z up. On-dome positions are
/// unit vectors with z >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Unit vector from spherical coordinates on the dome (radius 1)
    ///
    /// Azimuth is measured clockwise from front in radians, elevation up
    /// from the horizontal plane.
    pub fn from_azimuth_elevation(azimuth: f32, elevation: f32) -> Self {
        Self {
            x: elevation.cos() * azimuth.sin(),
            y: elevation.cos() * azimuth.cos(),
            z: elevation.sin(),
        }
    }

    /// Unit vector from spherical coordinates given in degrees
    pub fn from_degrees(azimuth_deg: f32, elevation_deg: f32) -> Self {
        Self::from_azimuth_elevation(azimuth_deg.to_radians(), elevation_deg.to_radians())
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn scaled(&self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Normalize to unit length; zero-length input returns the front direction.
    pub fn normalized(&self) -> Self {
        let n = self.norm();
        if n < 1e-10 {
            return Self::new(0.0, 1.0, 0.0);
        }
        self.scaled(1.0 / n)
    }

    pub fn to_spherical(&self) -> Spherical {
        let radius = self.norm();
        if radius < 1e-10 {
            return Spherical::new(0.0, 0.0, 0.0);
        }
        Spherical {
            azimuth: self.x.atan2(self.y),
            elevation: (self.z / radius).asin(),
            radius,
        }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Spherical position: azimuth/elevation in radians, radius 1.0 = on dome
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Spherical {
    pub azimuth: f32,
    pub elevation: f32,
    pub radius: f32,
}

impl Spherical {
    pub const fn new(azimuth: f32, elevation: f32, radius: f32) -> Self {
        Self {
            azimuth,
            elevation,
            radius,
        }
    }

    pub fn to_cartesian(&self) -> Vec3 {
        Vec3::from_azimuth_elevation(self.azimuth, self.elevation).scaled(self.radius)
    }
}

/// Program-space position inside the unit cube.
///
/// Origin is the front-left-floor corner; x grows to the right, y toward
/// the rear, z toward the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CubePosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl CubePosition {
    /// Construct a position, returning `None` if any component leaves [0, 1]
    pub fn new(x: f32, y: f32, z: f32) -> Option<Self> {
        let in_range = |v: f32| (0.0..=1.0).contains(&v);
        if in_range(x) && in_range(y) && in_range(z) {
            Some(Self { x, y, z })
        } else {
            None
        }
    }

    /// Construct with components clamped into [0, 1]
    pub fn clamped(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
            z: z.clamp(0.0, 1.0),
        }
    }
}
