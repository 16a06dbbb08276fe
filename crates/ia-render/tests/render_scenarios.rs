//! End-to-end rendering scenarios
//!
//! Each test drives a full frame through the renderer and checks the
//! per-channel output against hand-derived expectations.

use ia_core::{ChannelId, CubePosition, FrameRate, SampleRate, UseCase};
use ia_render::{
    AudioDataPcm, BedChannel, BedDefinition, BedRemap, DecorPrefix, Element, Frame,
    ObjectDefinition, ObjectSubBlock, RemapCoeff, RemapSubBlock, Renderer, RendererConfig,
    RendererOptions, RenderWarning, Speaker,
};
use std::sync::Arc;

const FRAME_24_48: usize = 2000;

fn outputs(channels: usize, samples: usize) -> Vec<Vec<f32>> {
    vec![vec![0.0; samples]; channels]
}

fn impulse_asset(id: u32, samples: usize) -> Element {
    let mut data = vec![0i32; samples];
    data[0] = i32::MAX;
    Element::AudioPcm(AudioDataPcm { id, samples: data })
}

fn dc_asset(id: u32, samples: usize, amplitude: f32) -> Element {
    let value = (amplitude as f64 * 2147483647.0) as i32;
    Element::AudioPcm(AudioDataPcm {
        id,
        samples: vec![value; samples],
    })
}

fn silent_asset(id: u32, samples: usize) -> Element {
    Element::AudioPcm(AudioDataPcm {
        id,
        samples: vec![0; samples],
    })
}

fn static_object(meta_id: u32, audio_id: u32, position: CubePosition, gain: f32) -> ObjectDefinition {
    ObjectDefinition {
        meta_id,
        audio_data_id: audio_id,
        conditional: false,
        use_case: UseCase::None,
        sub_blocks: (0..8)
            .map(|_| ObjectSubBlock {
                gain,
                position,
                ..Default::default()
            })
            .collect(),
        children: Vec::new(),
    }
}

fn renderer_for(config: RendererConfig) -> Renderer {
    Renderer::new(Arc::new(config), RendererOptions::default()).unwrap()
}

// ============ S1: on-dome front center ============

#[test]
fn test_on_dome_front_center_hits_center_only() {
    let mut config = RendererConfig::surround_5_1();
    config.smoothing_enabled = false;
    let mut renderer = renderer_for(config);

    let mut frame = Frame::new(FrameRate::Fps24, SampleRate::Hz48000);
    frame.elements.push(impulse_asset(1, FRAME_24_48));
    frame.elements.push(Element::Object(static_object(
        10,
        1,
        CubePosition::new(0.5, 0.0, 0.5).unwrap(),
        1.0,
    )));

    let mut out = outputs(6, FRAME_24_48);
    let rendered = renderer.render_frame(&frame, &mut out).unwrap();
    assert_eq!(rendered, FRAME_24_48);

    // Output order: L R C LFE LS RS. The mid-height front-center position
    // lands on the C / center-height arc, and the center-height virtual
    // folds into C, so the impulse arrives at full level on C alone.
    assert!((out[2][0] - 1.0).abs() < 1e-4, "C = {}", out[2][0]);
    for (i, channel) in out.iter().enumerate() {
        if i != 2 {
            assert!(channel[0].abs() < 1e-4, "channel {i} leaked {}", channel[0]);
        }
        assert!(channel[1..].iter().all(|&v| v.abs() < 1e-6));
    }
}

// ============ S2: interior triple balance ============

#[test]
fn test_interior_object_energy_preserved() {
    let mut config = RendererConfig::surround_5_1();
    config.smoothing_enabled = false;
    let mut renderer = renderer_for(config);

    let mut frame = Frame::new(FrameRate::Fps24, SampleRate::Hz48000);
    frame.elements.push(impulse_asset(1, FRAME_24_48));
    frame.elements.push(Element::Object(static_object(
        11,
        1,
        CubePosition::new(0.5, 0.5, 0.5).unwrap(),
        1.0,
    )));

    let mut out = outputs(6, FRAME_24_48);
    renderer.render_frame(&frame, &mut out).unwrap();

    // Triple-balance rendering is energy normalized: the squared channel
    // gains (read off the impulse) sum to the squared object gain.
    let energy: f32 = out.iter().map(|ch| ch[0] * ch[0]).sum();
    assert!((energy - 1.0).abs() < 1e-4, "energy {energy}");

    // Gains stay non-negative and bounded.
    for channel in &out {
        assert!(channel[0] >= -1e-6 && channel[0] <= 1.0 + 1e-4);
    }
}

// ============ S3: snap ============

/// 5.1 plus a physical center-height speaker whose cube position is
/// (0.5, 0, 0.5)
fn config_with_center_height() -> RendererConfig {
    use ChannelId as Id;
    // Elevation of the mid-height front-center wall point.
    let el = (0.44324f32 / (1.0f32 + 0.44324 * 0.44324).sqrt()).asin().to_degrees();
    let speakers = vec![
        Speaker::physical("L", Some(Id::Left.uri()), 0, -30.0, 0.0),
        Speaker::physical("R", Some(Id::Right.uri()), 1, 30.0, 0.0),
        Speaker::physical("C", Some(Id::Center.uri()), 2, 0.0, 0.0),
        Speaker::physical("LFE", Some(Id::Lfe.uri()), 3, 0.0, 0.0),
        Speaker::physical("LS", Some(Id::LeftSurround.uri()), 4, -110.0, 0.0),
        Speaker::physical("RS", Some(Id::RightSurround.uri()), 5, 110.0, 0.0),
        Speaker::physical("CH", None, 6, 0.0, el),
        Speaker::virtual_speaker("LH", None, -45.0, 60.0, &[(0, 1.0)]),
        Speaker::virtual_speaker("RH", None, 45.0, 60.0, &[(1, 1.0)]),
        Speaker::virtual_speaker("LSH", None, -110.0, 60.0, &[(4, 1.0)]),
        Speaker::virtual_speaker("RSH", None, 110.0, 60.0, &[(5, 1.0)]),
        Speaker::virtual_speaker("TSC", None, 0.0, 90.0, &[(2, 1.0)]),
    ];
    // Indices: L0 R1 C2 LFE3 LS4 RS5 CH6 LH7 RH8 LSH9 RSH10 TSC11
    let patches = [
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
        [11, 6, 8],
        [11, 8, 10],
        [11, 10, 9],
        [11, 9, 7],
        [11, 7, 6],
    ];
    RendererConfig::new(speakers, &patches, UseCase::Target5_1).unwrap()
}

#[test]
fn test_snap_fires_one_hot() {
    let mut config = config_with_center_height();
    config.smoothing_enabled = false;
    let mut renderer = renderer_for(config);

    let mut frame = Frame::new(FrameRate::Fps24, SampleRate::Hz48000);
    frame.elements.push(impulse_asset(1, FRAME_24_48));

    let mut object = static_object(12, 1, CubePosition::new(0.499, 0.0, 0.5).unwrap(), 1.0);
    for sub_block in &mut object.sub_blocks {
        // Quantized tolerance: 41/4095 ~ 0.01.
        sub_block.snap_tolerance = Some(41);
    }
    frame.elements.push(Element::Object(object));

    let mut out = outputs(7, FRAME_24_48);
    renderer.render_frame(&frame, &mut out).unwrap();

    // The center-height speaker (output 6) takes the whole impulse; the
    // VBAP path would have split it between C and CH.
    assert!((out[6][0] - 1.0).abs() < 1e-4, "CH = {}", out[6][0]);
    for (i, channel) in out.iter().enumerate().take(6) {
        assert!(channel[0].abs() < 1e-6, "channel {i} leaked {}", channel[0]);
    }
}

#[test]
fn test_snap_disabled_by_spread() {
    let mut config = config_with_center_height();
    config.smoothing_enabled = false;
    let mut renderer = renderer_for(config);

    let mut frame = Frame::new(FrameRate::Fps24, SampleRate::Hz48000);
    frame.elements.push(impulse_asset(1, FRAME_24_48));

    let mut object = static_object(13, 1, CubePosition::new(0.499, 0.0, 0.5).unwrap(), 1.0);
    for sub_block in &mut object.sub_blocks {
        sub_block.snap_tolerance = Some(41);
        sub_block.spread = ia_render::Spread::HighRes1d(0.3);
    }
    frame.elements.push(Element::Object(object));

    let mut out = outputs(7, FRAME_24_48);
    renderer.render_frame(&frame, &mut out).unwrap();

    // Spread disables snap: energy spreads over several speakers.
    let active = out.iter().filter(|ch| ch[0].abs() > 1e-4).count();
    assert!(active > 1, "snap was not disabled by spread");
}

// ============ S4: smoothing ramp cap ============

#[test]
fn test_smoothing_ramp_slope_capped() {
    let config = RendererConfig::surround_5_1();
    let mut renderer = renderer_for(config);

    // Frame 0 establishes zero gain history for the object on C.
    let mut frame = Frame::new(FrameRate::Fps24, SampleRate::Hz48000);
    frame.elements.push(dc_asset(1, FRAME_24_48, 1.0));
    frame.elements.push(Element::Object(static_object(
        20,
        1,
        CubePosition::new(0.5, 0.0, 0.5).unwrap(),
        0.0,
    )));
    let mut out = outputs(6, FRAME_24_48);
    renderer.render_frame(&frame, &mut out).unwrap();
    assert!(out[2].iter().all(|&v| v.abs() < 1e-6));

    // Frame 1 jumps the gain to 1.0; smoothing must ramp, not step.
    let mut frame = Frame::new(FrameRate::Fps24, SampleRate::Hz48000);
    frame.elements.push(dc_asset(1, FRAME_24_48, 1.0));
    frame.elements.push(Element::Object(static_object(
        20,
        1,
        CubePosition::new(0.5, 0.0, 0.5).unwrap(),
        1.0,
    )));
    let mut out = outputs(6, FRAME_24_48);
    renderer.render_frame(&frame, &mut out).unwrap();

    let c = &out[2];
    let max_slope = 1.0 / 480.0;

    // Monotonic non-decreasing, per-sample step capped.
    for w in c.windows(2) {
        assert!(w[1] >= w[0] - 1e-6, "ramp not monotonic");
        assert!(w[1] - w[0] <= max_slope + 1e-5, "slope cap exceeded");
    }

    // The capped ramp finishes within ~500 samples (well short of the
    // 2000-sample frame) and holds the target afterwards.
    assert!(c[0] > 0.0 && c[0] < 2.0 * max_slope);
    assert!(c[250] > 0.5, "ramp too slow: {}", c[250]);
    assert!((c[500] - 1.0).abs() < 1e-4, "not at target: {}", c[500]);
    assert!(c[500..].iter().all(|&v| (v - 1.0).abs() < 1e-4));
}

// ============ S5: bed remap to a target without LFE ============

/// 5.0 layout: no LFE output anywhere
fn config_5_0() -> RendererConfig {
    use ChannelId as Id;
    let speakers = vec![
        Speaker::physical("L", Some(Id::Left.uri()), 0, -30.0, 0.0),
        Speaker::physical("R", Some(Id::Right.uri()), 1, 30.0, 0.0),
        Speaker::physical("C", Some(Id::Center.uri()), 2, 0.0, 0.0),
        Speaker::physical("LS", Some(Id::LeftSurround.uri()), 3, -110.0, 0.0),
        Speaker::physical("RS", Some(Id::RightSurround.uri()), 4, 110.0, 0.0),
        Speaker::virtual_speaker("CH", None, 0.0, 45.0, &[(2, 1.0)]),
        Speaker::virtual_speaker("LH", None, -45.0, 45.0, &[(0, 1.0)]),
        Speaker::virtual_speaker("RH", None, 45.0, 45.0, &[(1, 1.0)]),
        Speaker::virtual_speaker("LSH", None, -110.0, 45.0, &[(3, 1.0)]),
        Speaker::virtual_speaker("RSH", None, 110.0, 45.0, &[(4, 1.0)]),
        Speaker::virtual_speaker(
            "TSC",
            None,
            0.0,
            90.0,
            &[(0, 0.2), (1, 0.2), (2, 0.2), (3, 0.2), (4, 0.2)],
        ),
    ];
    // Indices: L0 R1 C2 LS3 RS4 CH5 LH6 RH7 LSH8 RSH9 TSC10
    let patches = [
        [2, 5, 7],
        [2, 1, 7],
        [1, 7, 9],
        [1, 4, 9],
        [4, 9, 8],
        [4, 3, 8],
        [3, 8, 6],
        [3, 0, 6],
        [0, 6, 5],
        [0, 2, 5],
        [10, 5, 7],
        [10, 7, 9],
        [10, 9, 8],
        [10, 8, 6],
        [10, 6, 5],
    ];
    RendererConfig::new(speakers, &patches, UseCase::Target5_1).unwrap()
}

#[test]
fn test_bed_remap_drops_lfe_with_warning() {
    let mut config = config_5_0();
    config.smoothing_enabled = false;
    let mut renderer = renderer_for(config);

    let source_ids = [
        ChannelId::Left,
        ChannelId::Center,
        ChannelId::Right,
        ChannelId::LeftSurround,
        ChannelId::RightSurround,
        ChannelId::Lfe,
    ];
    let levels = [0.5f32, 0.25, 0.125, 0.4, 0.3, 0.6];

    let mut frame = Frame::new(FrameRate::Fps24, SampleRate::Hz48000);
    for (i, level) in levels.iter().enumerate() {
        frame.elements.push(dc_asset(i as u32 + 1, FRAME_24_48, *level));
    }

    // Identity remap: every destination channel takes its own source.
    let coeffs: Vec<RemapCoeff> = source_ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let mut gains = vec![0.0; 6];
            gains[i] = 1.0;
            RemapCoeff {
                destination: *id,
                gains,
            }
        })
        .collect();
    let mut sub_blocks = vec![RemapSubBlock {
        remap_info_exists: true,
        coeffs,
    }];
    // Later sub-blocks reuse the first block's matrix.
    sub_blocks.extend((1..8).map(|_| RemapSubBlock::default()));

    let bed = BedDefinition {
        meta_id: 30,
        conditional: false,
        use_case: UseCase::None,
        channels: source_ids
            .iter()
            .enumerate()
            .map(|(i, id)| BedChannel {
                id: *id,
                gain: 1.0,
                audio_data_id: i as u32 + 1,
            })
            .collect(),
        children: vec![Element::Remap(BedRemap {
            use_case: UseCase::Target5_1,
            source_channel_count: 6,
            destination_channel_count: 6,
            sub_blocks,
        })],
    };
    frame.elements.push(Element::Bed(bed));

    let mut out = outputs(5, FRAME_24_48);
    renderer.render_frame(&frame, &mut out).unwrap();

    // Non-LFE channels pass straight through the identity matrix.
    // Output order: L R C LS RS vs source order L C R LS RS.
    let expected = [0.5f32, 0.125, 0.25, 0.4, 0.3];
    for (i, e) in expected.iter().enumerate() {
        assert!(
            (out[i][100] - e).abs() < 1e-4,
            "channel {i}: {} vs {e}",
            out[i][100]
        );
        assert!((out[i][FRAME_24_48 - 1] - e).abs() < 1e-4);
    }

    // LFE samples are discarded, with a warning.
    assert_eq!(renderer.warnings(), vec![RenderWarning::RemapLfeNotInLayout]);
    let total: f32 = out.iter().map(|ch| ch[100]).sum();
    assert!((total - expected.iter().sum::<f32>()).abs() < 1e-4);
}

// ============ S6: decorrelation tail ============

#[test]
fn test_decorrelation_tail_and_reset() {
    let mut config = RendererConfig::surround_5_1();
    config.smoothing_enabled = false;
    let mut renderer = renderer_for(config);

    let decor_frame = || {
        let mut frame = Frame::new(FrameRate::Fps24, SampleRate::Hz48000);
        frame.elements.push(impulse_asset(1, FRAME_24_48));
        let mut object = static_object(40, 1, CubePosition::new(0.5, 0.0, 0.0).unwrap(), 1.0);
        for sub_block in &mut object.sub_blocks {
            sub_block.decor = DecorPrefix::MaxDecor;
        }
        frame.elements.push(Element::Object(object));
        frame
    };

    let plain_frame = || {
        let mut frame = Frame::new(FrameRate::Fps24, SampleRate::Hz48000);
        frame.elements.push(silent_asset(1, FRAME_24_48));
        frame
            .elements
            .push(Element::Object(static_object(
                41,
                1,
                CubePosition::new(0.5, 0.0, 0.0).unwrap(),
                1.0,
            )));
        frame
    };

    let peak = |out: &[Vec<f32>]| -> f32 {
        out.iter()
            .flat_map(|ch| ch.iter())
            .fold(0.0f32, |m, v| m.max(v.abs()))
    };

    // F0: decor object present; the decorrelated impulse reaches the
    // output.
    let mut out = outputs(6, FRAME_24_48);
    renderer.render_frame(&decor_frame(), &mut out).unwrap();
    assert!(peak(&out) > 1e-4, "decor frame produced silence");

    // F1, F2: no decor content, but the decorrelator keeps running and
    // its tail leaks into the output.
    let mut out = outputs(6, FRAME_24_48);
    renderer.render_frame(&plain_frame(), &mut out).unwrap();
    assert!(peak(&out) > 1e-7, "tail frame 1 is silent");

    let mut out = outputs(6, FRAME_24_48);
    renderer.render_frame(&plain_frame(), &mut out).unwrap();
    assert!(peak(&out) > 1e-8, "tail frame 2 is silent");

    // F3: tail expired; the bank was reset and the output is clean.
    let mut out = outputs(6, FRAME_24_48);
    renderer.render_frame(&plain_frame(), &mut out).unwrap();
    assert_eq!(peak(&out), 0.0, "residue after decorrelator reset");

    // A fresh decor frame re-arms the chain.
    let mut out = outputs(6, FRAME_24_48);
    renderer.render_frame(&decor_frame(), &mut out).unwrap();
    assert!(peak(&out) > 1e-4);
}
