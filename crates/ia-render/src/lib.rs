//! ia-render: Core rendering pipeline of the Corven immersive-audio
//! renderer
//!
//! Consumes an object/bed-based program (SMPTE ST 2098-2 style) and
//! produces per-loudspeaker PCM for a target layout.
//!
//! ## Pipeline
//! - `transform` - Unit-cube program space to the room-centered panner
//!   domain (shoebox forward, pyra-mesa inverse, spread to aperture)
//! - `interior` - Inside-the-dome positions split into on-dome
//!   extended-source triples
//! - `virtual_sources` - Pre-rendered hemisphere grid with interval-tree
//!   interval sums for extent integration
//! - `vbap` - Point and extent rendering against the triangulated hull,
//!   with per-frame extended-source memoization and speaker-to-channel
//!   downmix
//! - `zone` - Zone-9 channel-gain control
//! - `elements` - The parsed frame model (objects, beds, remaps, assets)
//! - `renderer` - The per-frame pass: activation, snap, smoothing,
//!   decorrelation routing and tail-off
//!
//! The renderer is a library: no I/O, no bitstream parsing, no threads.
//! One instance renders one stream; configurations are immutable and
//! shareable between instances.

pub mod config;
pub mod elements;
pub mod error;
pub mod interior;
pub mod renderer;
pub mod transform;
pub mod vbap;
pub mod virtual_sources;
pub mod zone;

pub use config::{DownmixEntry, Patch, RendererConfig, Speaker, Zone9Table};
pub use elements::{
    AudioDataDlc, AudioDataId, AudioDataPcm, BedChannel, BedDefinition, BedRemap, DecorPrefix,
    DlcDecoder, Element, Frame, MetaId, ObjectDefinition, ObjectSubBlock, ObjectZone19,
    RemapCoeff, RemapSubBlock, Spread,
};
pub use error::{
    ConfigError, ConfigResult, RenderError, RenderResult, RenderWarning, TransformError,
    TransformResult, VbapError, VbapResult,
};
pub use interior::InteriorPanner;
pub use renderer::{DECORR_TAIL_FRAMES, Renderer, RendererOptions};
pub use transform::SpatialTransform;
pub use vbap::{ExtendedSource, VbapObject, VbapRenderer};
pub use zone::ObjectZone9;
