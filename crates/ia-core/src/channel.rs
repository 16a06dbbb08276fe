//! Bed-channel identities: IDs, SMPTE URI labels, canonical dome positions

use crate::Vec3;
use serde::{Deserialize, Serialize};

/// Bed channel identifiers carried by the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChannelId {
    Left = 0x01,
    LeftCenter = 0x02,
    Center = 0x03,
    RightCenter = 0x04,
    Right = 0x05,
    LeftSurround = 0x06,
    RightSurround = 0x07,
    LeftSideSurround = 0x08,
    RightSideSurround = 0x09,
    LeftRearSurround = 0x0A,
    RightRearSurround = 0x0B,
    LeftTopFront = 0x0C,
    RightTopFront = 0x0D,
    LeftTopMiddle = 0x0E,
    RightTopMiddle = 0x0F,
    LeftTopRear = 0x10,
    RightTopRear = 0x11,
    TopSurround = 0x12,
    Lfe = 0x13,
}

/// SMPTE label URI of the LFE channel; LFE routing is special-cased
/// (missing LFE output is a warning, not an error).
pub const LFE_URI: &str = "urn:smpte:ul:060E2B34.0401010D.03020104.00000000";

impl ChannelId {
    /// Stable numeric code, used to synthesize gain-history entity IDs
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// SMPTE label URI used to match this channel against target-layout
    /// speakers
    pub fn uri(self) -> &'static str {
        match self {
            Self::Left => "urn:smpte:ul:060E2B34.0401010D.03020101.00000000",
            Self::Right => "urn:smpte:ul:060E2B34.0401010D.03020102.00000000",
            Self::Center => "urn:smpte:ul:060E2B34.0401010D.03020103.00000000",
            Self::Lfe => LFE_URI,
            Self::LeftSurround => "urn:smpte:ul:060E2B34.0401010D.03020105.00000000",
            Self::RightSurround => "urn:smpte:ul:060E2B34.0401010D.03020106.00000000",
            Self::LeftCenter => "urn:smpte:ul:060E2B34.0401010D.03020107.00000000",
            Self::RightCenter => "urn:smpte:ul:060E2B34.0401010D.03020108.00000000",
            Self::LeftSideSurround => "urn:smpte:ul:060E2B34.0401010D.03020109.00000000",
            Self::RightSideSurround => "urn:smpte:ul:060E2B34.0401010D.0302010A.00000000",
            Self::LeftRearSurround => "urn:smpte:ul:060E2B34.0401010D.0302010B.00000000",
            Self::RightRearSurround => "urn:smpte:ul:060E2B34.0401010D.0302010C.00000000",
            Self::LeftTopFront => "urn:smpte:ul:060E2B34.0401010D.0302010D.00000000",
            Self::RightTopFront => "urn:smpte:ul:060E2B34.0401010D.0302010E.00000000",
            Self::LeftTopMiddle => "urn:smpte:ul:060E2B34.0401010D.0302010F.00000000",
            Self::RightTopMiddle => "urn:smpte:ul:060E2B34.0401010D.03020110.00000000",
            Self::LeftTopRear => "urn:smpte:ul:060E2B34.0401010D.03020111.00000000",
            Self::RightTopRear => "urn:smpte:ul:060E2B34.0401010D.03020112.00000000",
            Self::TopSurround => "urn:smpte:ul:060E2B34.0401010D.03020113.00000000",
        }
    }

    /// Canonical dome direction (azimuth, elevation) in degrees.
    ///
    /// Used when a bed channel is absent from the target layout and must be
    /// rendered as a point-source object. Height channels sit at the
    /// normalized-room ceiling positions so the snap table round-trips
    /// exactly. The LFE direction is nominal; LFE never reaches the panner.
    pub fn canonical_direction(self) -> (f32, f32) {
        match self {
            Self::Left => (-30.0, 0.0),
            Self::LeftCenter => (-15.0, 0.0),
            Self::Center => (0.0, 0.0),
            Self::RightCenter => (15.0, 0.0),
            Self::Right => (30.0, 0.0),
            Self::LeftSurround => (-110.0, 0.0),
            Self::RightSurround => (110.0, 0.0),
            Self::LeftSideSurround => (-90.0, 0.0),
            Self::RightSideSurround => (90.0, 0.0),
            Self::LeftRearSurround => (-150.0, 0.0),
            Self::RightRearSurround => (150.0, 0.0),
            Self::LeftTopFront => (-24.79, 35.99),
            Self::RightTopFront => (24.79, 35.99),
            Self::LeftTopMiddle => (-90.0, 60.0),
            Self::RightTopMiddle => (90.0, 60.0),
            Self::LeftTopRear => (-155.21, 35.99),
            Self::RightTopRear => (155.21, 35.99),
            Self::TopSurround => (0.0, 90.0),
            Self::Lfe => (0.0, 0.0),
        }
    }

    /// Canonical dome position as a unit vector
    pub fn canonical_position(self) -> Vec3 {
        let (az, el) = self.canonical_direction();
        Vec3::from_degrees(az, el)
    }

    #[inline]
    pub fn is_lfe(self) -> bool {
        self == Self::Lfe
    }
}

/// Target playback context used to gate conditional elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UseCase {
    /// No declared use case; conditional elements never match it
    #[default]
    None,
    Target2_0,
    Target5_1,
    Target7_1,
    Target7_1_4,
    Target9_1_6,
    /// Matches every target
    Always,
}
