//! Interchange records for downstream visualizers and serializers.
//!
//! Coordinates are rounded to whole pixels.

use finderquad_geometry::Quadrilateral;
use finderquad_pattern::score::{ConcentricAnalysis, SymmetryAnalysis};
use finderquad_pattern::{BinarizationMethod, Candidate, Scored};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl From<Point2<f32>> for PixelPoint {
    fn from(p: Point2<f32>) -> Self {
        Self {
            x: p.x.round() as i32,
            y: p.y.round() as i32,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub concentric: Scored<ConcentricAnalysis>,
    pub line_pattern_score: f32,
    pub symmetry: Scored<SymmetryAnalysis>,
    pub valid_directions: usize,
}

/// One finder pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub center: PixelPoint,
    pub size: i32,
    pub method: BinarizationMethod,
    pub score: f32,
    pub analysis: AnalysisRecord,
}

impl From<&Candidate> for PatternRecord {
    fn from(c: &Candidate) -> Self {
        Self {
            center: c.center.into(),
            size: c.size.round() as i32,
            method: c.method,
            score: c.composite_score,
            analysis: AnalysisRecord {
                concentric: c.concentric.clone(),
                line_pattern_score: c.line_score(),
                symmetry: c.symmetry.clone(),
                valid_directions: c.valid_directions(),
            },
        }
    }
}

/// The four marker corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectangleRecord {
    pub top_left: PixelPoint,
    pub top_right: PixelPoint,
    pub bottom_left: PixelPoint,
    pub bottom_right: PixelPoint,
}

impl From<&Quadrilateral> for RectangleRecord {
    fn from(q: &Quadrilateral) -> Self {
        Self {
            top_left: q.top_left().into(),
            top_right: q.top_right().into(),
            bottom_left: q.bottom_left().into(),
            bottom_right: q.bottom_right().into(),
        }
    }
}
