use serde::{Deserialize, Serialize};

/// Why a set of corners does not describe a usable marker quadrilateral.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometryError {
    #[error("corner-role assignment needs exactly 3 points, got {found}")]
    WrongCandidateCount { found: usize },
    #[error("combinatorial search is capped at {max} candidates, got {found}")]
    TooManyCandidates { found: usize, max: usize },
    #[error("corner ({x:.1}, {y:.1}) outside [{min}, {max}]")]
    CornerOutOfRange { x: f32, y: f32, min: f32, max: f32 },
    #[error("opposite {axis} sides differ by {deviation:.3} (tolerance {tolerance})")]
    SideInconsistent {
        axis: SideAxis,
        deviation: f32,
        tolerance: f32,
    },
    #[error("aspect ratio {aspect:.3} outside [{min}, {max}]")]
    AspectOutOfRange { aspect: f32, min: f32, max: f32 },
    #[error("corners collapse to a degenerate quadrilateral")]
    Collapsed,
    #[error("{cells_x}x{cells_y} grid does not fit a {side_px} px rectified square")]
    GridTooFine {
        cells_x: usize,
        cells_y: usize,
        side_px: usize,
    },
}

/// Which pair of opposite sides a [`GeometryError::SideInconsistent`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideAxis {
    /// Top vs bottom.
    Horizontal,
    /// Left vs right.
    Vertical,
}

impl std::fmt::Display for SideAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SideAxis::Horizontal => "horizontal",
            SideAxis::Vertical => "vertical",
        })
    }
}
