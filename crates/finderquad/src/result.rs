use finderquad_geometry::{Grid, Quadrilateral};
use finderquad_pattern::{BinarizationMethod, ExtractionReport, PatternSet};
use serde::{Deserialize, Serialize};

use crate::io::{PatternRecord, RectangleRecord};

/// What happened to one binarization variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantReport {
    pub method: BinarizationMethod,
    pub extraction: ExtractionReport,
    /// Candidates that passed the scorer's acceptance floor.
    pub accepted: usize,
}

/// Output of the pattern stage alone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatternScan {
    pub patterns: PatternSet,
    pub reports: Vec<VariantReport>,
}

/// How the quadrilateral was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadSource {
    /// Four detected patterns already formed a rectangle.
    Rectangle,
    /// Three patterns completed with the parallelogram rule.
    Triple,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectionResult {
    pub patterns: PatternSet,
    pub quad: Quadrilateral,
    pub source: QuadSource,
    /// Pattern-set indices of the corners used, in `[TL, TR, BR, BL]` order;
    /// `None` marks the reconstructed corner.
    pub corner_patterns: [Option<usize>; 4],
    pub grid: Option<Grid>,
    pub reports: Vec<VariantReport>,
}

impl DetectionResult {
    pub fn pattern_records(&self) -> Vec<PatternRecord> {
        self.patterns.iter().map(PatternRecord::from).collect()
    }

    pub fn rectangle_record(&self) -> RectangleRecord {
        RectangleRecord::from(&self.quad)
    }
}
