//! Error types for the rendering pipeline

use ia_dsp::GainsError;
use thiserror::Error;

/// Coordinate-transform error kinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// Input position outside the unit cube
    #[error("position outside the unit cube")]
    OutOfRange,

    /// Cartesian to cube conversion found no intersecting patch
    #[error("position intersects no conversion patch")]
    NoPatchIntersection,
}

pub type TransformResult<T> = Result<T, TransformError>;

/// VBAP panner error kinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VbapError {
    #[error("bad arguments: {0}")]
    BadArguments(&'static str),

    /// A rendering parameter left its legal range
    #[error("parameter out of bounds: {0}")]
    ParameterOutOfBounds(&'static str),

    /// Object carries no extended sources
    #[error("object has no extended sources")]
    NoExtendedSource,

    /// Source direction not covered by the speaker hull
    #[error("position not inside the speaker convex hull")]
    NotInConvexHull,

    /// LFE content with no LFE speaker in the configuration
    #[error("configuration has no LFE speaker")]
    NoLfeSpeaker,
}

pub type VbapResult<T> = Result<T, VbapError>;

/// Configuration validation error kinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("configuration has no physical speakers")]
    NoPhysicalSpeakers,

    #[error("patch references speaker index {0} out of range")]
    PatchIndexOutOfRange(usize),

    #[error("patch {0} has a singular speaker basis")]
    SingularPatchBasis(usize),

    #[error("downmix entry references unknown channel {0}")]
    UnknownDownmixChannel(i32),

    #[error("duplicate speaker URI: {0}")]
    DuplicateUri(String),

    #[error("duplicate config channel index: {0}")]
    DuplicateChannel(i32),

    #[error("zone table row count {got} does not match output channel count {expected}")]
    ZoneTableShape { expected: usize, got: usize },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Renderer error taxonomy (external surface)
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("bad arguments: {0}")]
    BadArguments(&'static str),

    #[error("renderer is not initialised")]
    NotInitialised,

    #[error("unsupported sample rate")]
    UnsupportedSampleRate,

    #[error("unsupported frame rate for this sample rate")]
    UnsupportedFrameRate,

    #[error("malformed object definition: {0}")]
    ObjectDefinition(&'static str),

    #[error("malformed bed definition: {0}")]
    BedDefinition(&'static str),

    #[error("malformed bed channel: {0}")]
    BedChannel(&'static str),

    #[error("malformed bed remap: {0}")]
    BedRemap(&'static str),

    #[error("downmix references unmapped channel {0}")]
    DownmixChannel(i32),

    #[error("VBAP rendering failed: {0}")]
    VbapRendering(#[from] VbapError),

    #[error("coordinate conversion failed: {0}")]
    CoordinateConversion(#[from] TransformError),

    #[error("channel gains processing failed: {0}")]
    ApplyChannelGains(#[from] GainsError),

    #[error("audio asset length {got} does not match frame length {expected}")]
    SampleCountMismatch { expected: usize, got: usize },

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Non-fatal conditions collected during a frame render.
///
/// Variant order is the surfacing precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RenderWarning {
    /// A bed carries an LFE channel but the layout has no LFE output
    BedLfeNotInLayout,
    /// A bed remap targets LFE but the layout has no LFE output
    RemapLfeNotInLayout,
}
