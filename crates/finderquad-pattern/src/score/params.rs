use serde::{Deserialize, Serialize};

/// Relative weight of each pattern test in the composite score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub concentric: f32,
    pub line: f32,
    pub symmetry: f32,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            concentric: 0.40,
            line: 0.40,
            symmetry: 0.20,
        }
    }
}

/// Weights of the concentric sub-scores.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingWeights {
    pub center: f32,
    pub first_ring: f32,
    pub second_ring: f32,
}

impl Default for RingWeights {
    fn default() -> Self {
        Self {
            center: 0.25,
            first_ring: 0.50,
            second_ring: 0.25,
        }
    }
}

/// Pattern scoring settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreParams {
    /// Tolerance `t` of the 1:1:3:1:1 ratio comparison.
    pub ratio_tolerance: f32,
    /// Candidates whose usable radius is below this are rejected outright.
    pub min_radius: i32,
    /// Minimum dark fraction of the center disk.
    pub center_min_dark: f32,
    pub min_center_samples: usize,
    /// Angular step of ring sampling in degrees.
    pub ring_step_deg: usize,
    pub min_ring_samples: usize,
    /// Concentric scores below this floor count as zero.
    pub concentric_floor: f32,
    pub ring_weights: RingWeights,
    /// Half-length cap of each scanline.
    pub line_max_half_length: i32,
    /// Scanlines shorter than this are skipped.
    pub min_line_pixels: usize,
    pub symmetry_max_region: i32,
    pub symmetry_min_region: i32,
    pub weights: CompositeWeights,
    /// Candidates must score strictly above this to be accepted.
    pub accept_floor: f32,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            ratio_tolerance: 0.22,
            min_radius: 5,
            center_min_dark: 0.7,
            min_center_samples: 4,
            ring_step_deg: 5,
            min_ring_samples: 30,
            concentric_floor: 0.6,
            ring_weights: RingWeights::default(),
            line_max_half_length: 30,
            min_line_pixels: 11,
            symmetry_max_region: 40,
            symmetry_min_region: 10,
            weights: CompositeWeights::default(),
            accept_floor: 0.5,
        }
    }
}
