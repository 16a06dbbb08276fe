//! Renderer configuration: speakers, VBAP patches, routing maps, presets
//!
//! The configuration is the parsed form of a renderer-configuration file;
//! file parsing itself lives outside this crate. Construction validates
//! the speaker/patch relationships and precomputes the patch basis
//! matrices and the URI/channel routing maps.

use crate::error::{ConfigError, ConfigResult};
use ia_core::{ChannelId, EPSILON, UseCase, Vec3};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One target physical channel of a speaker's downmix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownmixEntry {
    /// Config channel index of the receiving physical speaker
    pub channel: i32,
    pub coefficient: f32,
}

/// A loudspeaker of the target layout.
///
/// Physical speakers own an output channel; virtual speakers complete the
/// VBAP hull and fold into physical channels through their downmix list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    pub name: String,
    /// SMPTE label URI, when the speaker can receive bed channels directly
    pub uri: Option<String>,
    /// Config channel index; `None` marks a virtual speaker
    pub channel: Option<i32>,
    /// Unit-sphere position in the room-centered VBAP domain
    pub position: Vec3,
    /// Downmix to physical channels; identity for physical speakers
    pub downmix: Vec<DownmixEntry>,
}

impl Speaker {
    /// Physical speaker at (azimuth, elevation) degrees with identity
    /// downmix
    pub fn physical(name: &str, uri: Option<&str>, channel: i32, az_deg: f32, el_deg: f32) -> Self {
        Self {
            name: name.to_string(),
            uri: uri.map(str::to_string),
            channel: Some(channel),
            position: Vec3::from_degrees(az_deg, el_deg),
            downmix: vec![DownmixEntry {
                channel,
                coefficient: 1.0,
            }],
        }
    }

    /// Virtual speaker folded into the given physical channels
    pub fn virtual_speaker(
        name: &str,
        uri: Option<&str>,
        az_deg: f32,
        el_deg: f32,
        downmix: &[(i32, f32)],
    ) -> Self {
        Self {
            name: name.to_string(),
            uri: uri.map(str::to_string),
            channel: None,
            position: Vec3::from_degrees(az_deg, el_deg),
            downmix: downmix
                .iter()
                .map(|&(channel, coefficient)| DownmixEntry {
                    channel,
                    coefficient,
                })
                .collect(),
        }
    }

    #[inline]
    pub fn is_virtual(&self) -> bool {
        self.channel.is_none()
    }
}

/// VBAP triangle over three total-speaker indices, with the precomputed
/// inverse basis mapping a unit source vector to patch coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub s1: usize,
    pub s2: usize,
    pub s3: usize,
    /// Row-major inverse of the column matrix [p1 p2 p3]
    pub inv_basis: [[f32; 3]; 3],
}

/// Row-major 3x3 matrix times vector
#[inline]
pub(crate) fn mat3_mul_vec3(m: &[[f32; 3]; 3], v: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
        m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
        m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
    )
}

/// Invert the column matrix [a b c]; `None` when near-singular
pub(crate) fn invert_columns(a: Vec3, b: Vec3, c: Vec3) -> Option<[[f32; 3]; 3]> {
    let m = Matrix3::from_columns(&[
        Vector3::new(a.x, a.y, a.z),
        Vector3::new(b.x, b.y, b.z),
        Vector3::new(c.x, c.y, c.z),
    ]);
    let inv = m.try_inverse()?;
    let mut out = [[0.0f32; 3]; 3];
    for (r, row) in out.iter_mut().enumerate() {
        for (cidx, v) in row.iter_mut().enumerate() {
            *v = inv[(r, cidx)];
        }
    }
    Some(out)
}

/// Per-output-channel zone-9 attenuation rows (normalized over zones at
/// construction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone9Table {
    pub rows: Vec<[f32; 9]>,
}

/// Validated renderer configuration shared by renderer instances
#[derive(Debug, Clone)]
pub struct RendererConfig {
    speakers: Vec<Speaker>,
    patches: Vec<Patch>,
    output_channel_count: usize,
    lfe_index: Option<usize>,
    pub target_use_case: UseCase,
    pub smoothing_enabled: bool,
    pub decorrelation_enabled: bool,
    zone9: Option<Zone9Table>,

    uri_to_output_index: HashMap<String, usize>,
    uri_to_speaker_index: HashMap<String, usize>,
    channel_to_output_index: HashMap<i32, usize>,
}

impl RendererConfig {
    /// Validate speakers and triangulation, precompute patch bases and
    /// routing maps, and normalize downmix lists.
    pub fn new(
        speakers: Vec<Speaker>,
        patch_indices: &[[usize; 3]],
        target_use_case: UseCase,
    ) -> ConfigResult<Self> {
        let mut uri_to_output_index = HashMap::new();
        let mut uri_to_speaker_index = HashMap::new();
        let mut channel_to_output_index = HashMap::new();
        let mut lfe_index = None;

        let mut output_channel_count = 0;
        for (index, speaker) in speakers.iter().enumerate() {
            if let Some(channel) = speaker.channel {
                if channel_to_output_index
                    .insert(channel, output_channel_count)
                    .is_some()
                {
                    return Err(ConfigError::DuplicateChannel(channel));
                }
                output_channel_count += 1;
            }
            if let Some(uri) = &speaker.uri {
                if uri_to_speaker_index.insert(uri.clone(), index).is_some() {
                    return Err(ConfigError::DuplicateUri(uri.clone()));
                }
                if uri == ia_core::LFE_URI {
                    lfe_index = Some(index);
                }
            }
        }
        if output_channel_count == 0 {
            return Err(ConfigError::NoPhysicalSpeakers);
        }

        // Physical URI'd speakers route bed channels straight to their
        // output; virtual URI'd ones route through their downmix.
        for speaker in &speakers {
            if let (Some(uri), Some(channel)) = (&speaker.uri, speaker.channel) {
                uri_to_output_index.insert(uri.clone(), channel_to_output_index[&channel]);
            }
        }

        // Normalize downmix coefficient sums to unity.
        let mut speakers = speakers;
        for speaker in &mut speakers {
            for entry in &speaker.downmix {
                if !channel_to_output_index.contains_key(&entry.channel) {
                    return Err(ConfigError::UnknownDownmixChannel(entry.channel));
                }
            }
            let sum: f32 = speaker.downmix.iter().map(|e| e.coefficient).sum();
            if sum > EPSILON {
                for entry in &mut speaker.downmix {
                    entry.coefficient /= sum;
                }
            }
        }

        let mut patches = Vec::with_capacity(patch_indices.len());
        for (patch_no, &[s1, s2, s3]) in patch_indices.iter().enumerate() {
            for &s in &[s1, s2, s3] {
                if s >= speakers.len() {
                    return Err(ConfigError::PatchIndexOutOfRange(s));
                }
            }
            let inv_basis = invert_columns(
                speakers[s1].position,
                speakers[s2].position,
                speakers[s3].position,
            )
            .ok_or(ConfigError::SingularPatchBasis(patch_no))?;
            patches.push(Patch {
                s1,
                s2,
                s3,
                inv_basis,
            });
        }

        Ok(Self {
            speakers,
            patches,
            output_channel_count,
            lfe_index,
            target_use_case,
            smoothing_enabled: true,
            decorrelation_enabled: true,
            zone9: None,
            uri_to_output_index,
            uri_to_speaker_index,
            channel_to_output_index,
        })
    }

    /// Attach a zone-9 table; rows are renormalized so all-ones zone gains
    /// become an identity.
    pub fn with_zone9(mut self, table: Zone9Table) -> ConfigResult<Self> {
        if table.rows.len() != self.output_channel_count {
            return Err(ConfigError::ZoneTableShape {
                expected: self.output_channel_count,
                got: table.rows.len(),
            });
        }
        let mut table = table;
        for row in &mut table.rows {
            let sum: f32 = row.iter().sum();
            if sum > EPSILON {
                for v in row.iter_mut() {
                    *v /= sum;
                }
            }
        }
        self.zone9 = Some(table);
        Ok(self)
    }

    #[inline]
    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    #[inline]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Total speaker count, virtual speakers included
    #[inline]
    pub fn total_speaker_count(&self) -> usize {
        self.speakers.len()
    }

    /// Number of physical output channels
    #[inline]
    pub fn output_channel_count(&self) -> usize {
        self.output_channel_count
    }

    /// Total-speaker index of the LFE speaker, if the layout has one
    #[inline]
    pub fn lfe_index(&self) -> Option<usize> {
        self.lfe_index
    }

    pub fn zone9(&self) -> Option<&Zone9Table> {
        self.zone9.as_ref()
    }

    /// Output index for a physical speaker URI
    pub fn output_index_for_uri(&self, uri: &str) -> Option<usize> {
        self.uri_to_output_index.get(uri).copied()
    }

    /// Total-speaker index for any URI'd speaker (virtual included)
    pub fn speaker_index_for_uri(&self, uri: &str) -> Option<usize> {
        self.uri_to_speaker_index.get(uri).copied()
    }

    /// Output index for a config channel index
    pub fn output_index_for_channel(&self, channel: i32) -> Option<usize> {
        self.channel_to_output_index.get(&channel).copied()
    }

    /// Whether the speaker participates in the VBAP hull
    pub fn is_vbap_speaker(&self, speaker_index: usize) -> bool {
        self.patches
            .iter()
            .any(|p| p.s1 == speaker_index || p.s2 == speaker_index || p.s3 == speaker_index)
    }
}

// ============ Layout presets ============

/// Height-ring elevation used when a floor-only layout is completed with
/// virtual speakers
const VIRTUAL_HEIGHT_EL: f32 = 45.0;

/// Theatrical room-model ceiling speakers (front pair)
const CEIL_FRONT: (f32, f32) = (24.79, 35.99);
/// Theatrical room-model ceiling speakers (rear pair)
const CEIL_REAR: (f32, f32) = (155.21, 35.99);
/// Theatrical room-model top-middle speakers
const CEIL_MID: (f32, f32) = (90.0, 60.0);

impl RendererConfig {
    /// 5.1: L R C LFE Ls Rs, hull closed by a virtual height ring and a
    /// virtual zenith
    pub fn surround_5_1() -> Self {
        use ChannelId as Id;
        let speakers = vec![
            Speaker::physical("L", Some(Id::Left.uri()), 0, -30.0, 0.0),
            Speaker::physical("R", Some(Id::Right.uri()), 1, 30.0, 0.0),
            Speaker::physical("C", Some(Id::Center.uri()), 2, 0.0, 0.0),
            Speaker::physical("LFE", Some(Id::Lfe.uri()), 3, 0.0, 0.0),
            Speaker::physical("LS", Some(Id::LeftSurround.uri()), 4, -110.0, 0.0),
            Speaker::physical("RS", Some(Id::RightSurround.uri()), 5, 110.0, 0.0),
            Speaker::virtual_speaker("CH", None, 0.0, VIRTUAL_HEIGHT_EL, &[(2, 1.0)]),
            Speaker::virtual_speaker("LH", None, -45.0, VIRTUAL_HEIGHT_EL, &[(0, 1.0)]),
            Speaker::virtual_speaker("RH", None, 45.0, VIRTUAL_HEIGHT_EL, &[(1, 1.0)]),
            Speaker::virtual_speaker("LSH", None, -110.0, VIRTUAL_HEIGHT_EL, &[(4, 1.0)]),
            Speaker::virtual_speaker("RSH", None, 110.0, VIRTUAL_HEIGHT_EL, &[(5, 1.0)]),
            Speaker::virtual_speaker(
                "TSC",
                Some(Id::TopSurround.uri()),
                0.0,
                90.0,
                &[(0, 0.2), (1, 0.2), (2, 0.2), (4, 0.2), (5, 0.2)],
            ),
        ];
        // Indices: L0 R1 C2 LFE3 LS4 RS5 CH6 LH7 RH8 LSH9 RSH10 TSC11
        let patches = [
            // Band between floor ring and height ring
            [2, 6, 8],
            [2, 1, 8],
            [1, 8, 10],
            [1, 5, 10],
            [5, 10, 9],
            [5, 4, 9],
            [4, 9, 7],
            [4, 0, 7],
            [0, 7, 6],
            [0, 2, 6],
            // Zenith fan
            [11, 6, 8],
            [11, 8, 10],
            [11, 10, 9],
            [11, 9, 7],
            [11, 7, 6],
        ];
        Self::new(speakers, &patches, UseCase::Target5_1).expect("5.1 preset is valid")
    }

    /// 7.1: L R C LFE Lss Rss Lsr Rsr with a virtual height ring and zenith
    pub fn surround_7_1() -> Self {
        use ChannelId as Id;
        let spread: Vec<(i32, f32)> = [0, 1, 2, 4, 5, 6, 7].iter().map(|&c| (c, 1.0)).collect();
        let speakers = vec![
            Speaker::physical("L", Some(Id::Left.uri()), 0, -30.0, 0.0),
            Speaker::physical("R", Some(Id::Right.uri()), 1, 30.0, 0.0),
            Speaker::physical("C", Some(Id::Center.uri()), 2, 0.0, 0.0),
            Speaker::physical("LFE", Some(Id::Lfe.uri()), 3, 0.0, 0.0),
            Speaker::physical("LSS", Some(Id::LeftSideSurround.uri()), 4, -90.0, 0.0),
            Speaker::physical("RSS", Some(Id::RightSideSurround.uri()), 5, 90.0, 0.0),
            Speaker::physical("LSR", Some(Id::LeftRearSurround.uri()), 6, -150.0, 0.0),
            Speaker::physical("RSR", Some(Id::RightRearSurround.uri()), 7, 150.0, 0.0),
            Speaker::virtual_speaker("CH", None, 0.0, VIRTUAL_HEIGHT_EL, &[(2, 1.0)]),
            Speaker::virtual_speaker("LH", None, -45.0, VIRTUAL_HEIGHT_EL, &[(0, 1.0)]),
            Speaker::virtual_speaker("RH", None, 45.0, VIRTUAL_HEIGHT_EL, &[(1, 1.0)]),
            Speaker::virtual_speaker("LSH", None, -90.0, VIRTUAL_HEIGHT_EL, &[(4, 1.0)]),
            Speaker::virtual_speaker("RSH", None, 90.0, VIRTUAL_HEIGHT_EL, &[(5, 1.0)]),
            Speaker::virtual_speaker("LRH", None, -150.0, VIRTUAL_HEIGHT_EL, &[(6, 1.0)]),
            Speaker::virtual_speaker("RRH", None, 150.0, VIRTUAL_HEIGHT_EL, &[(7, 1.0)]),
            Speaker::virtual_speaker("TSC", Some(Id::TopSurround.uri()), 0.0, 90.0, &spread),
        ];
        // Indices: L0 R1 C2 LFE3 LSS4 RSS5 LSR6 RSR7
        //          CH8 LH9 RH10 LSH11 RSH12 LRH13 RRH14 TSC15
        let patches = [
            // Band
            [2, 8, 10],
            [2, 1, 10],
            [1, 10, 12],
            [1, 5, 12],
            [5, 12, 14],
            [5, 7, 14],
            [7, 14, 13],
            [7, 6, 13],
            [6, 13, 11],
            [6, 4, 11],
            [4, 11, 9],
            [4, 0, 9],
            [0, 9, 8],
            [0, 2, 8],
            // Zenith fan
            [15, 8, 10],
            [15, 10, 12],
            [15, 12, 14],
            [15, 14, 13],
            [15, 13, 11],
            [15, 11, 9],
            [15, 9, 8],
        ];
        Self::new(speakers, &patches, UseCase::Target7_1).expect("7.1 preset is valid")
    }

    /// 7.1.4 with physical heights at the theatrical ceiling positions
    pub fn atmos_7_1_4() -> Self {
        use ChannelId as Id;
        let speakers = vec![
            Speaker::physical("L", Some(Id::Left.uri()), 0, -30.0, 0.0),
            Speaker::physical("R", Some(Id::Right.uri()), 1, 30.0, 0.0),
            Speaker::physical("C", Some(Id::Center.uri()), 2, 0.0, 0.0),
            Speaker::physical("LFE", Some(Id::Lfe.uri()), 3, 0.0, 0.0),
            Speaker::physical("LSS", Some(Id::LeftSideSurround.uri()), 4, -90.0, 0.0),
            Speaker::physical("RSS", Some(Id::RightSideSurround.uri()), 5, 90.0, 0.0),
            Speaker::physical("LSR", Some(Id::LeftRearSurround.uri()), 6, -150.0, 0.0),
            Speaker::physical("RSR", Some(Id::RightRearSurround.uri()), 7, 150.0, 0.0),
            Speaker::physical("LTF", Some(Id::LeftTopFront.uri()), 8, -CEIL_FRONT.0, CEIL_FRONT.1),
            Speaker::physical("RTF", Some(Id::RightTopFront.uri()), 9, CEIL_FRONT.0, CEIL_FRONT.1),
            Speaker::physical("LTR", Some(Id::LeftTopRear.uri()), 10, -CEIL_REAR.0, CEIL_REAR.1),
            Speaker::physical("RTR", Some(Id::RightTopRear.uri()), 11, CEIL_REAR.0, CEIL_REAR.1),
            Speaker::virtual_speaker(
                "TSC",
                Some(Id::TopSurround.uri()),
                0.0,
                90.0,
                &[(8, 0.25), (9, 0.25), (10, 0.25), (11, 0.25)],
            ),
        ];
        // Indices: L0 R1 C2 LFE3 LSS4 RSS5 LSR6 RSR7 LTF8 RTF9 LTR10 RTR11 TSC12
        let patches = [
            // Band between the floor ring and the four ceiling speakers
            [8, 2, 9],
            [9, 2, 1],
            [9, 1, 5],
            [9, 5, 11],
            [11, 5, 7],
            [11, 7, 10],
            [10, 7, 6],
            [10, 6, 4],
            [10, 4, 8],
            [8, 4, 0],
            [8, 0, 2],
            // Zenith fan
            [12, 8, 9],
            [12, 9, 11],
            [12, 11, 10],
            [12, 10, 8],
        ];
        Self::new(speakers, &patches, UseCase::Target7_1_4).expect("7.1.4 preset is valid")
    }

    /// 9.1.6 with wides and six physical heights
    pub fn atmos_9_1_6() -> Self {
        use ChannelId as Id;
        let speakers = vec![
            Speaker::physical("L", Some(Id::Left.uri()), 0, -30.0, 0.0),
            Speaker::physical("R", Some(Id::Right.uri()), 1, 30.0, 0.0),
            Speaker::physical("C", Some(Id::Center.uri()), 2, 0.0, 0.0),
            Speaker::physical("LFE", Some(Id::Lfe.uri()), 3, 0.0, 0.0),
            Speaker::physical("LW", Some(Id::LeftCenter.uri()), 4, -60.0, 0.0),
            Speaker::physical("RW", Some(Id::RightCenter.uri()), 5, 60.0, 0.0),
            Speaker::physical("LSS", Some(Id::LeftSideSurround.uri()), 6, -90.0, 0.0),
            Speaker::physical("RSS", Some(Id::RightSideSurround.uri()), 7, 90.0, 0.0),
            Speaker::physical("LSR", Some(Id::LeftRearSurround.uri()), 8, -150.0, 0.0),
            Speaker::physical("RSR", Some(Id::RightRearSurround.uri()), 9, 150.0, 0.0),
            Speaker::physical("LTF", Some(Id::LeftTopFront.uri()), 10, -CEIL_FRONT.0, CEIL_FRONT.1),
            Speaker::physical("RTF", Some(Id::RightTopFront.uri()), 11, CEIL_FRONT.0, CEIL_FRONT.1),
            Speaker::physical("LTM", Some(Id::LeftTopMiddle.uri()), 12, -CEIL_MID.0, CEIL_MID.1),
            Speaker::physical("RTM", Some(Id::RightTopMiddle.uri()), 13, CEIL_MID.0, CEIL_MID.1),
            Speaker::physical("LTR", Some(Id::LeftTopRear.uri()), 14, -CEIL_REAR.0, CEIL_REAR.1),
            Speaker::physical("RTR", Some(Id::RightTopRear.uri()), 15, CEIL_REAR.0, CEIL_REAR.1),
            Speaker::virtual_speaker(
                "TSC",
                Some(Id::TopSurround.uri()),
                0.0,
                90.0,
                &[
                    (10, 1.0 / 6.0),
                    (11, 1.0 / 6.0),
                    (12, 1.0 / 6.0),
                    (13, 1.0 / 6.0),
                    (14, 1.0 / 6.0),
                    (15, 1.0 / 6.0),
                ],
            ),
        ];
        // Indices: L0 R1 C2 LFE3 LW4 RW5 LSS6 RSS7 LSR8 RSR9
        //          LTF10 RTF11 LTM12 RTM13 LTR14 RTR15 TSC16
        let patches = [
            // Band
            [10, 2, 11],
            [11, 2, 1],
            [11, 1, 5],
            [11, 5, 13],
            [13, 5, 7],
            [13, 7, 15],
            [15, 7, 9],
            [15, 9, 14],
            [14, 9, 8],
            [14, 8, 6],
            [14, 6, 12],
            [12, 6, 4],
            [12, 4, 10],
            [10, 4, 0],
            [10, 0, 2],
            // Zenith fan
            [16, 10, 11],
            [16, 11, 13],
            [16, 13, 15],
            [16, 15, 14],
            [16, 14, 12],
            [16, 12, 10],
        ];
        Self::new(speakers, &patches, UseCase::Target9_1_6).expect("9.1.6 preset is valid")
    }
}
