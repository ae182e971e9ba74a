use super::*;
use crate::foundation::core::ColorSpace;

fn alpha_row(alphas: &[u8]) -> Image {
    let mut data = Vec::new();
    for &a in alphas {
        data.extend_from_slice(&[0, 0, 0, a]);
    }
    Image::from_rgba8(alphas.len() as u32, 1, data, ColorSpace::Linear).unwrap()
}

fn edge_uniforms() -> PassUniforms<'static> {
    PassUniforms {
        spread: 1.0,
        channel: 3,
        first_pass: true,
        source: None,
    }
}

#[test]
fn allocate_and_release_are_counted() {
    let mut be = CpuBackend::default();
    let a = be.allocate_buffer(&BufferDesc::scratch(4, 4)).unwrap();
    let b = be.allocate_buffer(&BufferDesc::result(4, 4, ColorSpace::Linear)).unwrap();
    assert_ne!(a, b);
    assert_eq!(be.stats().live_buffers, 2);
    assert_eq!(be.stats().live_bytes, 4 * 4 * 8 + 4 * 4 * 4);

    be.release_buffer(a);
    be.release_buffer(b);
    be.release_buffer(b);
    let st = be.stats();
    assert_eq!(st.allocated, 2);
    assert_eq!(st.released, 2);
    assert_eq!(st.live_buffers, 0);
    assert_eq!(st.live_bytes, 0);
    assert_eq!(st.stray_releases, 1);
}

#[test]
fn live_byte_limit_fails_allocation() {
    let mut be = CpuBackend::new(CpuBackendOpts {
        max_live_bytes: Some(BufferDesc::scratch(4, 4).byte_len()),
    });
    let a = be.allocate_buffer(&BufferDesc::scratch(4, 4)).unwrap();
    let err = be.allocate_buffer(&BufferDesc::scratch(4, 4)).unwrap_err();
    assert!(matches!(err, SdfError::BackendAllocationFailed(_)));
    be.release_buffer(a);
    be.allocate_buffer(&BufferDesc::scratch(4, 4)).unwrap();
}

#[test]
fn zero_sized_allocation_fails() {
    let mut be = CpuBackend::default();
    assert!(matches!(
        be.allocate_buffer(&BufferDesc::scratch(0, 4)),
        Err(SdfError::BackendAllocationFailed(_))
    ));
}

#[test]
fn edge_pass_seeds_both_sides_of_the_boundary() {
    let src = alpha_row(&[0, 0, 255, 255, 255]);
    let mut be = CpuBackend::default();
    let program = RenderProgram::jump_flood(0.5);
    let out = be.allocate_buffer(&BufferDesc::scratch(5, 1)).unwrap();
    be.run_pass(
        &program,
        PassKind::Flood,
        &edge_uniforms(),
        PassInput::Image(&src),
        out,
    )
    .unwrap();

    let img = be.read_back(out).unwrap();
    let has_seed: Vec<u8> = (0..5).map(|x| img.channel(x, 0, 2)).collect();
    let inside: Vec<u8> = (0..5).map(|x| img.channel(x, 0, 3)).collect();
    assert_eq!(has_seed, vec![0, 255, 255, 0, 0]);
    assert_eq!(inside, vec![0, 0, 255, 255, 255]);
}

#[test]
fn uniform_image_has_no_edges() {
    let src = alpha_row(&[255; 6]);
    let mut be = CpuBackend::default();
    let out = be.allocate_buffer(&BufferDesc::scratch(6, 1)).unwrap();
    be.run_pass(
        &RenderProgram::jump_flood(0.5),
        PassKind::Flood,
        &edge_uniforms(),
        PassInput::Image(&src),
        out,
    )
    .unwrap();
    let img = be.read_back(out).unwrap();
    assert!((0..6).all(|x| img.channel(x, 0, 2) == 0));
}

#[test]
fn seeds_round_trip_at_full_coordinate_range() {
    for coord in [0i64, 1, 4095, 4096, 65535] {
        let t = encode_seed(Some((coord, 65535 - coord)), true);
        let t = t.map(|v| quantize(v, 65535.0));
        assert_eq!(decode_seed(t), Some((coord, 65535 - coord)));
    }
    assert_eq!(decode_seed(encode_seed(None, false)), None);
}

#[test]
fn propagation_keeps_own_seed_on_ties() {
    let texels = vec![
        encode_seed(Some((0, 0)), false),
        encode_seed(Some((1, 0)), false),
        encode_seed(Some((2, 0)), false),
    ];
    let buf = CpuBuffer {
        desc: BufferDesc::scratch(3, 1),
        texels,
    };
    let view = TexelView::Buffer(&buf);
    assert_eq!(decode_seed(propagate_texel(&view, 1, 0, 1)), Some((1, 0)));

    let texels = vec![
        encode_seed(Some((0, 0)), false),
        encode_seed(None, false),
        encode_seed(Some((2, 0)), false),
    ];
    let buf = CpuBuffer {
        desc: BufferDesc::scratch(3, 1),
        texels,
    };
    let view = TexelView::Buffer(&buf);
    // Both neighbors are at distance 1; the left one is visited first.
    assert_eq!(decode_seed(propagate_texel(&view, 1, 0, 1)), Some((0, 0)));
}

#[test]
fn pass_rejects_missing_variant_and_aliasing() {
    let src = alpha_row(&[0, 255]);
    let mut be = CpuBackend::default();
    let a = be.allocate_buffer(&BufferDesc::scratch(2, 1)).unwrap();

    let mut program = RenderProgram::jump_flood(0.5);
    program.passes = vec![PassKind::Final];
    let err = be
        .run_pass(&program, PassKind::Flood, &edge_uniforms(), PassInput::Image(&src), a)
        .unwrap_err();
    assert!(matches!(err, SdfError::BackendPassFailed(_)));

    let program = RenderProgram::jump_flood(0.5);
    let err = be
        .run_pass(&program, PassKind::Flood, &edge_uniforms(), PassInput::Buffer(a), a)
        .unwrap_err();
    assert!(matches!(err, SdfError::BackendPassFailed(_)));

    // Target survives a failed pass.
    assert_eq!(be.stats().live_buffers, 1);
    be.read_back(a).unwrap();
}

#[test]
fn final_pass_requires_source() {
    let mut be = CpuBackend::default();
    let a = be.allocate_buffer(&BufferDesc::scratch(2, 1)).unwrap();
    let b = be.allocate_buffer(&BufferDesc::result(2, 1, ColorSpace::Linear)).unwrap();
    let uniforms = PassUniforms {
        spread: 1.0,
        channel: 3,
        first_pass: false,
        source: None,
    };
    let err = be
        .run_pass(
            &RenderProgram::jump_flood(0.5),
            PassKind::Final,
            &uniforms,
            PassInput::Buffer(a),
            b,
        )
        .unwrap_err();
    assert!(err.to_string().contains("source texture"));
}

#[test]
fn merge_overwrites_only_target_channel() {
    let mut be = CpuBackend::default();
    let desc = BufferDesc::result(2, 2, ColorSpace::Linear);
    let a = be.allocate_buffer(&desc).unwrap();
    let b = be.allocate_buffer(&desc).unwrap();

    let quarter = Image::filled(2, 2, [64, 64, 64, 64], ColorSpace::Linear).unwrap();
    be.buffers.get_mut(&a).unwrap().texels = vec![[1.0; 4]; 4];
    be.buffers.get_mut(&b).unwrap().texels = vec![[64.0 / 255.0; 4]; 4];

    be.merge_channel(b, a, 1).unwrap();
    let img = be.read_back(a).unwrap();
    assert!(img.data.chunks_exact(4).all(|px| px == [255, 64, 255, 255]));
    assert_eq!(be.read_back(b).unwrap(), quarter);

    assert!(be.merge_channel(a, a, 1).is_err());
    assert!(be.merge_channel(b, a, 4).is_err());
}

#[test]
fn blit_same_size_is_exact_copy() {
    let mut be = CpuBackend::default();
    let src = be.allocate_buffer(&BufferDesc::result(3, 2, ColorSpace::Linear)).unwrap();
    let dst = be.allocate_buffer(&BufferDesc::resized(3, 2, ColorSpace::Linear)).unwrap();
    let texels: Vec<[f32; 4]> = (0..6).map(|i| [i as f32 * 40.0 / 255.0; 4]).collect();
    be.buffers.get_mut(&src).unwrap().texels = texels;

    be.blit(src, dst).unwrap();
    assert_eq!(be.read_back(src).unwrap(), be.read_back(dst).unwrap());
}

#[test]
fn bilinear_upscale_interpolates_between_texels() {
    let mut be = CpuBackend::default();
    let src = be.allocate_buffer(&BufferDesc::result(2, 1, ColorSpace::Linear)).unwrap();
    let dst = be.allocate_buffer(&BufferDesc::resized(4, 1, ColorSpace::Linear)).unwrap();
    be.buffers.get_mut(&src).unwrap().texels = vec![[0.0; 4], [1.0; 4]];

    be.blit(src, dst).unwrap();
    let img = be.read_back(dst).unwrap();
    let row: Vec<u8> = (0..4).map(|x| img.channel(x, 0, 0)).collect();
    assert_eq!(row, vec![0, 64, 191, 255]);
}

#[test]
fn read_back_carries_color_space_tag() {
    let mut be = CpuBackend::default();
    let h = be.allocate_buffer(&BufferDesc::result(1, 1, ColorSpace::Srgb)).unwrap();
    let img = be.read_back(h).unwrap();
    assert_eq!(img.color_space, ColorSpace::Srgb);
    assert_eq!(img.data, vec![0, 0, 0, 0]);
}

#[test]
fn oversized_spread_clamps_to_the_image() {
    let src = alpha_row(&[0, 255, 255, 0, 0]);
    let mut be = CpuBackend::default();
    let program = RenderProgram::jump_flood(0.5);
    let seeds = be.allocate_buffer(&BufferDesc::scratch(5, 1)).unwrap();
    let wide = be.allocate_buffer(&BufferDesc::scratch(5, 1)).unwrap();
    let exact = be.allocate_buffer(&BufferDesc::scratch(5, 1)).unwrap();
    be.run_pass(&program, PassKind::Flood, &edge_uniforms(), PassInput::Image(&src), seeds)
        .unwrap();

    let propagate = |spread| PassUniforms {
        spread,
        channel: 3,
        first_pass: false,
        source: None,
    };
    be.run_pass(&program, PassKind::Flood, &propagate(1e20), PassInput::Buffer(seeds), wide)
        .unwrap();
    be.run_pass(&program, PassKind::Flood, &propagate(5.0), PassInput::Buffer(seeds), exact)
        .unwrap();
    assert_eq!(be.buffers[&wide].texels, be.buffers[&exact].texels);

    for spread in [f32::NAN, f32::INFINITY] {
        let err = be
            .run_pass(&program, PassKind::Flood, &propagate(spread), PassInput::Buffer(seeds), wide)
            .unwrap_err();
        assert!(matches!(err, SdfError::BackendPassFailed(_)));
    }
    assert_eq!(be.stats().live_buffers, 3);
}

#[test]
fn malformed_images_fail_the_pass() {
    let bad = Image {
        width: 4,
        height: 4,
        data: vec![0; 8],
        color_space: ColorSpace::Linear,
    };
    let mut be = CpuBackend::default();
    let program = RenderProgram::jump_flood(0.5);
    let a = be.allocate_buffer(&BufferDesc::scratch(4, 4)).unwrap();
    let b = be.allocate_buffer(&BufferDesc::result(4, 4, ColorSpace::Linear)).unwrap();

    let err = be
        .run_pass(&program, PassKind::Flood, &edge_uniforms(), PassInput::Image(&bad), a)
        .unwrap_err();
    assert!(matches!(err, SdfError::BackendPassFailed(_)));
    assert!(err.to_string().contains("pass input"));

    let uniforms = PassUniforms {
        spread: 1.0,
        channel: 3,
        first_pass: false,
        source: Some(&bad),
    };
    let err = be
        .run_pass(&program, PassKind::Final, &uniforms, PassInput::Buffer(a), b)
        .unwrap_err();
    assert!(matches!(err, SdfError::BackendPassFailed(_)));
    assert!(err.to_string().contains("source texture"));

    assert_eq!(be.stats().live_buffers, 2);
}
