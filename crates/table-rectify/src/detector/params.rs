use crate::corners::CornerOrderParams;
use crate::edges::EdgeRefineParams;
use crate::rectify::TableSize;
use serde::{Deserialize, Serialize};
use table_rectify_core::HsvRange;

/// Configuration for the table rectifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableRectifyParams {
    /// Felt color, inclusive 8-bit HSV bounds.
    pub color: HsvRange,
    /// Polygon tolerance as a fraction of the outline perimeter.
    ///
    /// Larger values give coarser polygons. Typical value: `0.02`.
    pub approx_epsilon_frac: f64,
    /// Output rectangle; the table's long side maps to `length`.
    pub table: TableSize,
    /// Corner labelling tolerances.
    pub ordering: CornerOrderParams,
    /// Edge-line refinement of the corners.
    pub edges: EdgeRefineParams,
}

impl Default for TableRectifyParams {
    fn default() -> Self {
        Self {
            color: HsvRange::green_felt(),
            approx_epsilon_frac: 0.02,
            table: TableSize::default(),
            ordering: CornerOrderParams::default(),
            edges: EdgeRefineParams::default(),
        }
    }
}

impl TableRectifyParams {
    /// Defaults with a different felt color.
    pub fn with_color(color: HsvRange) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}
