use crate::foundation::core::Image;
use crate::foundation::error::SdfResult;
use crate::render::backend::{
    BufferDesc, BufferHandle, PassInput, PassKind, PassUniforms, RenderProgram, SdfBackend,
};
use crate::render::scope::BufferScope;

/// Spread of the edge-detection pass that seeds the flood.
pub const EDGE_SPREAD: u32 = 1;

/// Propagation spreads for a `width`x`height` image.
///
/// Strictly decreasing powers of two, from the largest one not exceeding the larger side down to
/// 1. Offsets sum to at least `max(width, height) - 1`, so any edge can reach any pixel.
pub fn propagation_spreads(width: u32, height: u32) -> Vec<u32> {
    let max_side = width.max(height).max(1);
    let top = max_side.ilog2();
    (0..=top).rev().map(|e| 1u32 << e).collect()
}

/// Run the jump-flood distance transform for one channel of `source`.
///
/// Returns an RGBA8 buffer holding the encoded distance in `channel` and zero elsewhere. The
/// caller owns the returned buffer. Scratch buffers are released before returning, whatever the
/// outcome.
#[tracing::instrument(skip(backend, program, source), fields(w = source.width, h = source.height))]
pub fn solve_channel<B: SdfBackend + ?Sized>(
    backend: &mut B,
    program: &RenderProgram,
    source: &Image,
    channel: usize,
) -> SdfResult<BufferHandle> {
    let spreads = propagation_spreads(source.width, source.height);
    tracing::debug!(passes = spreads.len() + 2, "jump flood schedule");

    BufferScope::run(backend, |backend, scope| {
        let step = BufferDesc::scratch(source.width, source.height);
        let mut write = scope.acquire(backend, &step)?;
        let mut read = scope.acquire(backend, &step)?;

        backend.run_pass(
            program,
            PassKind::Flood,
            &PassUniforms {
                spread: EDGE_SPREAD as f32,
                channel,
                first_pass: true,
                source: None,
            },
            PassInput::Image(source),
            write,
        )?;
        std::mem::swap(&mut read, &mut write);

        for spread in spreads {
            backend.run_pass(
                program,
                PassKind::Flood,
                &PassUniforms {
                    spread: spread as f32,
                    channel,
                    first_pass: false,
                    source: None,
                },
                PassInput::Buffer(read),
                write,
            )?;
            std::mem::swap(&mut read, &mut write);
        }

        let result = scope.acquire(
            backend,
            &BufferDesc::result(source.width, source.height, source.color_space),
        )?;
        backend.run_pass(
            program,
            PassKind::Final,
            &PassUniforms {
                spread: EDGE_SPREAD as f32,
                channel,
                first_pass: false,
                source: Some(source),
            },
            PassInput::Buffer(read),
            result,
        )?;
        Ok(scope.detach(result))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/solve/flood.rs"]
mod tests;
