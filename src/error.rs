use thiserror::Error;

/// Top-level error type for the riblite geometry kernel.
#[derive(Debug, Error)]
pub enum RibliteError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length segment")]
    ZeroLengthSegment,
}

/// Errors related to the path container and stitching engine.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("stale segment handle: the segment was deleted from its path")]
    StaleSegment,

    #[error("path is empty")]
    EmptyPath,

    #[error("path could not be stitched closed: {0}")]
    Unstitchable(String),
}

/// Errors related to kernel operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("expected intersection not found: {0}")]
    IntersectionNotFound(String),
}

/// Convenience type alias for results using [`RibliteError`].
pub type Result<T> = std::result::Result<T, RibliteError>;
