//! Finder-pattern scoring.
//!
//! Three independent tests run on the binary variant a blob was traced
//! from: concentric rings, 1:1:3:1:1 scanlines in four directions, and
//! mirror symmetry. Their weighted blend is the candidate's composite score.

mod concentric;
mod line;
mod outcome;
mod params;
mod symmetry;

pub use concentric::{analyze_concentric, ConcentricAnalysis, RingComponents, RingSample};
pub use line::{
    analyze_line, analyze_runs, run_lengths, sample_line, Direction, LineAnalysis, LineProbe, Run,
    IDEAL_RATIOS,
};
pub use outcome::{RejectReason, Score, Scored};
pub use params::{CompositeWeights, RingWeights, ScoreParams};
pub use symmetry::{analyze_symmetry, region_symmetry, SymmetryAnalysis};

use finderquad_core::BinaryMask;

use crate::types::{Candidate, RawCandidate};

#[cfg(feature = "tracing")]
use tracing::instrument;

impl Score for Candidate {
    fn score(&self) -> f32 {
        self.composite_score
    }
}

/// Scores raw blobs against the finder-pattern model.
#[derive(Clone, Debug, Default)]
pub struct PatternScorer {
    params: ScoreParams,
}

impl PatternScorer {
    pub fn new(params: ScoreParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &ScoreParams {
        &self.params
    }

    /// Score one blob on the mask it was extracted from.
    ///
    /// Candidates whose composite does not exceed the acceptance floor come
    /// back as `Rejected` with the fully scored candidate attached.
    pub fn score(&self, mask: &BinaryMask, raw: &RawCandidate) -> Scored<Candidate> {
        let p = &self.params;
        let cx = raw.center.x.round() as i32;
        let cy = raw.center.y.round() as i32;
        let (w, h) = (mask.width as i32, mask.height as i32);
        if cx < 0 || cy < 0 || cx >= w || cy >= h {
            return Scored::rejected(RejectReason::CenterOutOfBounds);
        }

        let safe = cx.min(cy).min(w - cx - 1).min(h - cy - 1);
        let radius = (raw.size as i32 / 2).min(safe);
        if radius < p.min_radius {
            return Scored::rejected(RejectReason::RadiusTooSmall);
        }

        let concentric = analyze_concentric(mask, cx, cy, 2 * radius, p);
        let symmetry = analyze_symmetry(mask, cx, cy, radius, p);
        let half = radius.min(p.line_max_half_length);
        let lines: Vec<LineProbe> = Direction::ALL
            .iter()
            .filter_map(|&direction| {
                let pixels = sample_line(mask, cx, cy, half, direction);
                (pixels.len() >= p.min_line_pixels).then(|| LineProbe {
                    direction,
                    outcome: analyze_line(&pixels, p),
                })
            })
            .collect();

        let mut candidate = Candidate {
            center: raw.center,
            size: raw.size,
            method: raw.method,
            bbox: raw.bbox,
            concentric,
            lines,
            symmetry,
            composite_score: 0.0,
        };
        candidate.composite_score = p.weights.concentric * candidate.concentric.score()
            + p.weights.line * candidate.line_score()
            + p.weights.symmetry * candidate.symmetry.score();

        if candidate.composite_score > p.accept_floor {
            Scored::Accepted(candidate)
        } else {
            let reason = RejectReason::BelowAcceptance {
                score: candidate.composite_score,
                floor: p.accept_floor,
            };
            Scored::rejected_with(reason, candidate)
        }
    }

    /// Score every blob of one variant, keeping the accepted candidates.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, mask, raws), fields(blobs = raws.len()))
    )]
    pub fn score_all(&self, mask: &BinaryMask, raws: &[RawCandidate]) -> Vec<Candidate> {
        raws.iter()
            .filter_map(|raw| match self.score(mask, raw) {
                Scored::Accepted(c) => Some(c),
                Scored::Rejected { reason, .. } => {
                    log::debug!(
                        "{} blob at ({:.1}, {:.1}) rejected: {reason}",
                        raw.method,
                        raw.center.x,
                        raw.center.y
                    );
                    None
                }
            })
            .collect()
    }
}
