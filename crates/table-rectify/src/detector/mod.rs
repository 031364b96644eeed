//! Table detection pipeline.
//!
//! This module wires together felt segmentation, largest-region extraction,
//! polygon simplification, corner ordering, edge refinement and the final
//! projective warp.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::RectifyError;
pub use params::TableRectifyParams;
pub use pipeline::TableRectifier;
pub use result::{RectifiedTable, Segment, TableDetection, TableOverlay};
