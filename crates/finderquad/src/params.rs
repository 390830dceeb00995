use finderquad_geometry::{GridParams, QuadParams, SearchParams};
use finderquad_pattern::{BinarizeParams, ExtractParams, FusionParams, ScoreParams};
use serde::{Deserialize, Serialize};

/// Full parameter tree of the detection pipeline.
///
/// Every node has defaults, so a partial JSON document only needs the
/// fields it overrides.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderParams {
    pub binarize: BinarizeParams,
    pub extract: ExtractParams,
    pub score: ScoreParams,
    pub fusion: FusionParams,
    pub search: SearchParams,
    pub quad: QuadParams,
    pub grid: GridParams,
    /// Rectify the quadrilateral and sample the bit grid after a successful
    /// reconstruction.
    pub sample_grid: bool,
}

impl Default for FinderParams {
    fn default() -> Self {
        Self {
            binarize: BinarizeParams::default(),
            extract: ExtractParams::default(),
            score: ScoreParams::default(),
            fusion: FusionParams::default(),
            search: SearchParams::default(),
            quad: QuadParams::default(),
            grid: GridParams::default(),
            sample_grid: true,
        }
    }
}

impl FinderParams {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
