use super::*;
use crate::foundation::core::ColorSpace;
use crate::render::cpu::CpuBackend;

/// 6x1 image: R is inside on the left half, A on the right half, G and B everywhere.
fn split_image() -> Image {
    let mut data = Vec::new();
    for x in 0..6 {
        let left = if x < 3 { 255 } else { 0 };
        data.extend_from_slice(&[left, 255, 255, 255 - left]);
    }
    Image::from_rgba8(6, 1, data, ColorSpace::Linear).unwrap()
}

#[test]
fn each_channel_comes_from_its_own_solve() {
    let src = split_image();
    let program = RenderProgram::jump_flood(0.5);
    let mut be = CpuBackend::default();

    let merged = composite_channels(&mut be, &program, &src, &[3, 2, 1, 0]).unwrap();
    let merged = be.read_back(merged).unwrap();

    for c in 0..4 {
        let single = solve_channel(&mut be, &program, &src, c).unwrap();
        let single = be.read_back(single).unwrap();
        for x in 0..6 {
            assert_eq!(merged.channel(x, 0, c), single.channel(x, 0, c), "c={c} x={x}");
        }
    }
}

#[test]
fn intermediates_are_released() {
    let src = split_image();
    let mut be = CpuBackend::default();
    let out =
        composite_channels(&mut be, &RenderProgram::jump_flood(0.5), &src, &[3, 0]).unwrap();

    let st = be.stats();
    // Two scratch buffers and one result per channel.
    assert_eq!(st.allocated, 6);
    assert_eq!(st.live_buffers, 1);
    be.release_buffer(out);
    assert_eq!(be.stats().live_buffers, 0);
}

#[test]
fn unselected_channels_stay_zero() {
    let src = split_image();
    let mut be = CpuBackend::default();
    let out = composite_channels(&mut be, &RenderProgram::jump_flood(0.5), &src, &[3]).unwrap();
    let img = be.read_back(out).unwrap();
    assert!(img.data.chunks_exact(4).all(|px| px[..3] == [0, 0, 0]));
    assert!(img.data.chunks_exact(4).any(|px| px[3] > 0));
}

#[test]
fn failure_in_later_channel_releases_earlier_results() {
    let src = split_image();
    let mut be = CpuBackend::default();
    let err = composite_channels(&mut be, &RenderProgram::jump_flood(0.5), &src, &[3, 7]);
    assert!(err.is_err());
    let st = be.stats();
    assert_eq!(st.allocated, st.released);
    assert_eq!(st.stray_releases, 0);
}

#[test]
fn empty_channel_list_is_invalid_mode() {
    let mut be = CpuBackend::default();
    let err = composite_channels(&mut be, &RenderProgram::jump_flood(0.5), &split_image(), &[]);
    assert!(matches!(err, Err(SdfError::InvalidMode)));
}
