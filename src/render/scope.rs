use crate::foundation::error::SdfResult;
use crate::render::backend::{BufferDesc, BufferHandle, SdfBackend};

/// Tracks buffers acquired during one operation and releases whatever is still held when it ends.
///
/// Handles leave the scope either through [`BufferScope::release`] or [`BufferScope::detach`];
/// every other handle is released exactly once when [`BufferScope::run`] returns, on success and
/// on error alike.
#[derive(Debug, Default)]
pub(crate) struct BufferScope {
    held: Vec<BufferHandle>,
}

impl BufferScope {
    pub(crate) fn run<B, T, F>(backend: &mut B, f: F) -> SdfResult<T>
    where
        B: SdfBackend + ?Sized,
        F: FnOnce(&mut B, &mut BufferScope) -> SdfResult<T>,
    {
        let mut scope = BufferScope::default();
        let out = f(backend, &mut scope);
        scope.release_all(backend);
        out
    }

    pub(crate) fn acquire<B: SdfBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        desc: &BufferDesc,
    ) -> SdfResult<BufferHandle> {
        let handle = backend.allocate_buffer(desc)?;
        tracing::trace!(?handle, w = desc.width, h = desc.height, format = ?desc.format, "acquire");
        self.held.push(handle);
        Ok(handle)
    }

    /// Take ownership of an already-allocated handle (e.g. one detached from an inner scope).
    pub(crate) fn adopt(&mut self, handle: BufferHandle) -> BufferHandle {
        self.held.push(handle);
        handle
    }

    /// Release a held handle now. Handles not held by this scope are ignored.
    pub(crate) fn release<B: SdfBackend + ?Sized>(&mut self, backend: &mut B, handle: BufferHandle) {
        if let Some(pos) = self.held.iter().position(|h| *h == handle) {
            self.held.swap_remove(pos);
            tracing::trace!(?handle, "release");
            backend.release_buffer(handle);
        }
    }

    /// Hand a held handle to the caller; the scope will no longer release it.
    pub(crate) fn detach(&mut self, handle: BufferHandle) -> BufferHandle {
        if let Some(pos) = self.held.iter().position(|h| *h == handle) {
            self.held.swap_remove(pos);
        }
        handle
    }

    #[cfg(test)]
    pub(crate) fn held(&self) -> usize {
        self.held.len()
    }

    fn release_all<B: SdfBackend + ?Sized>(&mut self, backend: &mut B) {
        for handle in self.held.drain(..).rev() {
            tracing::trace!(?handle, "release");
            backend.release_buffer(handle);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scope.rs"]
mod tests;
