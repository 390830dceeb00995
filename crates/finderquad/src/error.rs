use finderquad_geometry::GeometryError;

/// Terminal failures of the detection pipeline.
///
/// Rejected blobs and candidates are not errors; they are reported through
/// [`crate::VariantReport`] and `Scored::Rejected`.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid grayscale image ({width}x{height}, {len} bytes)")]
    InvalidImage {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("only {found} finder patterns survived fusion, need at least 3")]
    InsufficientCandidates { found: usize },

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(#[from] GeometryError),

    #[cfg(feature = "image")]
    #[error("invalid grayscale image buffer length (expected {expected} bytes, got {got})")]
    InvalidGrayBuffer { expected: usize, got: usize },
}
