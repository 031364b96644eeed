/// Errors returned by the table rectification pipeline.
///
/// Every stage fails fast with its own kind; no stage substitutes a guessed
/// geometry for a failed one.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RectifyError {
    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },
    #[error("no pixel matched the felt color range")]
    NoRegionFound,
    #[error("table outline simplified to {vertices} vertices, expected 4")]
    NotAQuadrilateral { vertices: usize },
    #[error("table corners are collinear or form a self-intersecting quadrilateral")]
    DegenerateQuadrilateral,
    #[error("edges adjacent to corner {corner} are parallel")]
    ParallelEdges { corner: usize },
    #[error("destination size {length}x{width} is empty or too large")]
    InvalidTableSize { length: usize, width: usize },
    #[error("homography estimation failed")]
    HomographyFailed,
}

impl RectifyError {
    pub(crate) fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }
}
