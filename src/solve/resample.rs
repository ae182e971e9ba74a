use crate::foundation::error::SdfResult;
use crate::render::backend::{BufferDesc, BufferHandle, SdfBackend};
use crate::render::scope::BufferScope;

/// Resize `input` (held by `scope`) to `target`, returning the buffer that holds the result.
///
/// Equal sizes return `input` untouched. Otherwise `input` is blitted into a new bilinear buffer
/// and released; the new buffer is held by `scope`.
pub(crate) fn resample<B: SdfBackend + ?Sized>(
    backend: &mut B,
    scope: &mut BufferScope,
    input: BufferHandle,
    input_desc: &BufferDesc,
    target: (u32, u32),
) -> SdfResult<BufferHandle> {
    if (input_desc.width, input_desc.height) == target {
        return Ok(input);
    }
    tracing::debug!(
        from_w = input_desc.width,
        from_h = input_desc.height,
        to_w = target.0,
        to_h = target.1,
        "resample"
    );
    let out = scope.acquire(
        backend,
        &BufferDesc::resized(target.0, target.1, input_desc.color_space),
    )?;
    backend.blit(input, out)?;
    scope.release(backend, input);
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/solve/resample.rs"]
mod tests;
