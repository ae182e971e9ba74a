/// Convenience result type used across sdfgen.
pub type SdfResult<T> = Result<T, SdfError>;

/// Top-level error taxonomy used by generation APIs.
#[derive(thiserror::Error, Debug)]
pub enum SdfError {
    /// The channel mode selects no channel.
    #[error("invalid mode: at least one channel must be selected")]
    InvalidMode,

    /// Invalid caller-provided input (image shape, program, target size).
    #[error("validation error: {0}")]
    Validation(String),

    /// The backend could not provide a scratch or result buffer.
    #[error("backend allocation failed: {0}")]
    BackendAllocationFailed(String),

    /// The backend reported an error while executing a pass.
    #[error("backend pass failed: {0}")]
    BackendPassFailed(String),

    /// A source asset could not be decoded into an image.
    #[error("decode error: {0}")]
    Decode(String),

    /// Errors when serializing or deserializing settings.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SdfError {
    /// Build a [`SdfError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SdfError::BackendAllocationFailed`] value.
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::BackendAllocationFailed(msg.into())
    }

    /// Build a [`SdfError::BackendPassFailed`] value.
    pub fn pass(msg: impl Into<String>) -> Self {
        Self::BackendPassFailed(msg.into())
    }

    /// Build a [`SdfError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`SdfError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
