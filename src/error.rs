use thiserror::Error;

/// Result type alias for operations that may fail with [`VectorizeError`].
pub type VectorizeResult<T> = std::result::Result<T, VectorizeError>;

/// Error types surfaced by the vectorization pipeline.
///
/// Input errors (`Decode`, `UnsupportedFormat`, `EmptyImage`, `ResourceLimit`)
/// are raised before any tracing starts. `TraceFailure` is only raised when
/// every requested threshold failed to trace.
#[derive(Debug, Error)]
pub enum VectorizeError {
    /// The bytes could not be decoded as an image.
    #[error("Image decoding failed: {0}")]
    Decode(#[from] image::ImageError),
    /// The bytes are not in one of the accepted formats (PNG, JPEG).
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    /// The decoded image has a zero dimension.
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    /// The input exceeds one of the configured resource limits.
    #[error("Input exceeds the {what} limit: {found} > {limit}")]
    ResourceLimit {
        what: &'static str,
        limit: u64,
        found: u64,
    },
    /// Every threshold in the sweep failed to trace.
    #[error("Tracing failed for all {thresholds} thresholds")]
    TraceFailure { thresholds: usize },
    /// The options do not describe a runnable pipeline.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// A color string is not `#rgb` or `#rrggbb`.
    #[error("Invalid color `{0}`; expected #rgb or #rrggbb")]
    InvalidColor(String),
    /// No component with the requested id exists in the document.
    #[error("Component {id} not found")]
    ComponentNotFound { id: u32 },
    /// A document string does not have the structure the serializer emits.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
    /// File system I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Component list serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single threshold pass. Recorded by the compositor, never
/// propagated on its own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TraceError {
    /// A path kept more vertices than allowed even after escalating the
    /// simplification tolerance.
    #[error("path keeps {vertices} vertices after simplification (limit {limit})")]
    VertexBudget { vertices: usize, limit: usize },
    /// A boundary walk did not close within its step bound.
    #[error("boundary walk did not close after {steps} steps")]
    RunawayBoundary { steps: usize },
}
