use crate::foundation::core::Image;
use crate::foundation::error::{SdfError, SdfResult};
use crate::render::backend::{BufferHandle, RenderProgram, SdfBackend};
use crate::render::scope::BufferScope;
use crate::solve::flood::solve_channel;

/// Solve each of `channels` in order and merge them into one buffer.
///
/// The first solved buffer becomes the base; each later one contributes only its own channel and
/// is released right after the merge. The caller owns the returned buffer.
pub fn composite_channels<B: SdfBackend + ?Sized>(
    backend: &mut B,
    program: &RenderProgram,
    source: &Image,
    channels: &[usize],
) -> SdfResult<BufferHandle> {
    BufferScope::run(backend, |backend, scope| {
        let mut base = None;
        for &channel in channels {
            let solved = scope.adopt(solve_channel(backend, program, source, channel)?);
            match base {
                None => base = Some(solved),
                Some(base) => {
                    backend.merge_channel(solved, base, channel)?;
                    scope.release(backend, solved);
                }
            }
        }
        let base = base.ok_or(SdfError::InvalidMode)?;
        Ok(scope.detach(base))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/solve/composite.rs"]
mod tests;
