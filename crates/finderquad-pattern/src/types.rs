use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::binarize::BinarizationMethod;
use crate::score::{ConcentricAnalysis, LineProbe, Scored, SymmetryAnalysis};

/// Axis-aligned pixel bounding box; `width`/`height` count pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn area(&self) -> f32 {
        self.width as f32 * self.height as f32
    }
}

/// Square-ish blob that survived shape filtering, not yet scored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    /// Area centroid of the outline, in pixel-index coordinates.
    pub center: Point2<f32>,
    /// `max(bbox.width, bbox.height)`.
    pub size: f32,
    pub method: BinarizationMethod,
    pub bbox: BoundingBox,
    pub area: f32,
    pub fill_ratio: f32,
    pub corner_count: usize,
}

/// Scored finder-pattern candidate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub center: Point2<f32>,
    pub size: f32,
    pub method: BinarizationMethod,
    pub bbox: BoundingBox,
    pub concentric: Scored<ConcentricAnalysis>,
    /// One probe per direction that had enough in-bounds pixels.
    pub lines: Vec<LineProbe>,
    pub symmetry: Scored<SymmetryAnalysis>,
    /// Weighted blend of the three tests, in `[0, 1]`.
    pub composite_score: f32,
}

impl Candidate {
    /// Scores of the line probes that produced a non-zero result.
    pub fn valid_line_scores(&self) -> Vec<f32> {
        self.lines
            .iter()
            .map(|l| l.outcome.score())
            .filter(|&s| s > 0.0)
            .collect()
    }

    pub fn valid_directions(&self) -> usize {
        self.valid_line_scores().len()
    }

    /// Mean over the non-zero line scores, 0 when none is valid.
    pub fn line_score(&self) -> f32 {
        let scores = self.valid_line_scores();
        if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f32>() / scores.len() as f32
        }
    }

    pub fn distance_to(&self, other: &Candidate) -> f32 {
        (self.center - other.center).norm()
    }
}
