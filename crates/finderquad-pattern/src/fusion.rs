//! Cross-variant deduplication and best-subset selection.

use serde::{Deserialize, Serialize};

use crate::binarize::BinarizationMethod;
use crate::score::Score;
use crate::types::Candidate;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Weights of the secondary quality signal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub directions: f32,
    pub consistency: f32,
    pub size: f32,
    pub concentric: f32,
    pub method: f32,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            directions: 0.3,
            consistency: 0.2,
            size: 0.2,
            concentric: 0.2,
            method: 0.1,
        }
    }
}

/// Size plausibility: full credit inside `preferred`, partial inside
/// `acceptable`, `fallback` elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizePlausibility {
    pub preferred: [f32; 2],
    pub acceptable: [f32; 2],
    pub acceptable_score: f32,
    pub fallback: f32,
}

impl Default for SizePlausibility {
    fn default() -> Self {
        Self {
            preferred: [15.0, 80.0],
            acceptable: [10.0, 120.0],
            acceptable_score: 0.7,
            fallback: 0.3,
        }
    }
}

impl SizePlausibility {
    pub fn score(&self, size: f32) -> f32 {
        let inside = |r: [f32; 2]| size >= r[0] && size <= r[1];
        if inside(self.preferred) {
            1.0
        } else if inside(self.acceptable) {
            self.acceptable_score
        } else {
            self.fallback
        }
    }
}

/// Fixed trust placed in each binarization strategy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodReliability {
    /// `Otsu` and `OtsuOriginal`.
    pub otsu: f32,
    /// Both adaptive strategies.
    pub adaptive: f32,
    pub other: f32,
}

impl Default for MethodReliability {
    fn default() -> Self {
        Self {
            otsu: 1.0,
            adaptive: 0.9,
            other: 0.7,
        }
    }
}

impl MethodReliability {
    pub fn score(&self, method: BinarizationMethod) -> f32 {
        match method {
            BinarizationMethod::Otsu | BinarizationMethod::OtsuOriginal => self.otsu,
            m if m.is_adaptive() => self.adaptive,
            _ => self.other,
        }
    }
}

/// Fusion and selection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionParams {
    /// Centers closer than this are the same pattern.
    pub duplicate_distance: f32,
    /// Pairwise separation enforced while selecting.
    pub min_separation: f32,
    /// Separation of the fallback pass when too few survive.
    pub relaxed_separation: f32,
    /// Below this many selections the relaxed pass runs.
    pub min_selected: usize,
    pub max_selected: usize,
    /// Share of the composite score in the ranking; the quality signal
    /// gets the rest.
    pub composite_weight: f32,
    pub quality: QualityWeights,
    pub size: SizePlausibility,
    pub reliability: MethodReliability,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            duplicate_distance: 20.0,
            min_separation: 50.0,
            relaxed_separation: 30.0,
            min_selected: 3,
            max_selected: 4,
            composite_weight: 0.6,
            quality: QualityWeights::default(),
            size: SizePlausibility::default(),
            reliability: MethodReliability::default(),
        }
    }
}

/// A selected candidate with its ranking signals.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    pub quality: f32,
    pub combined_score: f32,
}

/// Deduplicated, ranked selection of finder-pattern candidates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatternSet {
    /// Best first; at most `max_selected` entries.
    pub candidates: Vec<RankedCandidate>,
    /// Smallest pairwise separation guaranteed between selected centers.
    pub separation: f32,
    /// Candidates left after deduplication.
    pub unique: usize,
}

impl PatternSet {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().map(|r| &r.candidate)
    }
}

/// Collapse candidates whose centers fall within `distance` of an already
/// kept one; a later duplicate replaces the kept one only if it scores
/// strictly higher.
pub fn merge_duplicates(candidates: Vec<Candidate>, distance: f32) -> Vec<Candidate> {
    let mut unique: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for c in candidates {
        match unique.iter_mut().find(|u| u.distance_to(&c) < distance) {
            Some(kept) => {
                if c.score() > kept.score() {
                    *kept = c;
                }
            }
            None => unique.push(c),
        }
    }
    unique
}

fn population_std(values: &[f32]) -> f32 {
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n).sqrt()
}

/// Secondary quality signal in `[0, 1]`.
pub fn quality_signal(c: &Candidate, params: &FusionParams) -> f32 {
    let w = &params.quality;
    let valid = c.valid_line_scores();

    let directions = (valid.len() as f32 / 4.0).min(1.0);
    let consistency = if valid.is_empty() {
        0.0
    } else {
        (1.0 - population_std(&valid)).max(0.0)
    };

    w.directions * directions
        + w.consistency * consistency
        + w.size * params.size.score(c.size)
        + w.concentric * c.concentric.score()
        + w.method * params.reliability.score(c.method)
}

fn greedy_pick(
    ranked: &[RankedCandidate],
    chosen: &mut Vec<usize>,
    separation: f32,
    max_selected: usize,
) {
    for (i, r) in ranked.iter().enumerate() {
        if chosen.len() >= max_selected {
            break;
        }
        if chosen.contains(&i) {
            continue;
        }
        let clear = chosen
            .iter()
            .all(|&j| ranked[j].candidate.distance_to(&r.candidate) >= separation);
        if clear {
            chosen.push(i);
        }
    }
}

/// Deduplicate, re-rank and pick up to `max_selected` well separated
/// candidates.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(candidates, params), fields(candidates = candidates.len()))
)]
pub fn fuse_candidates(candidates: Vec<Candidate>, params: &FusionParams) -> PatternSet {
    let unique = merge_duplicates(candidates, params.duplicate_distance);
    let n_unique = unique.len();

    let mut ranked: Vec<RankedCandidate> = unique
        .into_iter()
        .map(|candidate| {
            let quality = quality_signal(&candidate, params);
            let combined_score = params.composite_weight * candidate.composite_score
                + (1.0 - params.composite_weight) * quality;
            RankedCandidate {
                candidate,
                quality,
                combined_score,
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));

    let mut chosen = Vec::new();
    let mut separation = params.min_separation;
    greedy_pick(&ranked, &mut chosen, separation, params.max_selected);
    if chosen.len() < params.min_selected {
        separation = params.relaxed_separation;
        greedy_pick(&ranked, &mut chosen, separation, params.max_selected);
    }
    // Keep ranking order regardless of which pass picked an entry.
    chosen.sort_unstable();

    log::debug!(
        "fusion: {} unique, {} selected (separation {:.0}px)",
        n_unique,
        chosen.len(),
        separation
    );

    let mut slots: Vec<Option<RankedCandidate>> = ranked.into_iter().map(Some).collect();
    let candidates = chosen
        .into_iter()
        .filter_map(|i| slots.get_mut(i).and_then(Option::take))
        .collect();

    PatternSet {
        candidates,
        separation,
        unique: n_unique,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{Direction, LineAnalysis, LineProbe, RejectReason, Scored};
    use crate::types::BoundingBox;
    use nalgebra::Point2;

    fn candidate(x: f32, y: f32, score: f32) -> Candidate {
        Candidate {
            center: Point2::new(x, y),
            size: 30.0,
            method: BinarizationMethod::Otsu,
            bbox: BoundingBox {
                x: x as i32 - 15,
                y: y as i32 - 15,
                width: 30,
                height: 30,
            },
            concentric: Scored::rejected(RejectReason::PatternTooSmall),
            lines: Vec::new(),
            symmetry: Scored::rejected(RejectReason::RegionTooSmall),
            composite_score: score,
        }
    }

    #[test]
    fn near_duplicates_keep_higher_score() {
        let merged = merge_duplicates(
            vec![candidate(100.0, 100.0, 0.6), candidate(105.0, 102.0, 0.8)],
            20.0,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].composite_score, 0.8);
        assert_eq!(merged[0].center, Point2::new(105.0, 102.0));

        let merged = merge_duplicates(
            vec![candidate(100.0, 100.0, 0.8), candidate(105.0, 102.0, 0.8)],
            20.0,
        );
        assert_eq!(merged[0].center, Point2::new(100.0, 100.0));
    }

    #[test]
    fn close_pair_is_not_co_selected_under_strict_separation() {
        let set = fuse_candidates(
            vec![
                candidate(100.0, 100.0, 0.9),
                candidate(140.0, 100.0, 0.8),
                candidate(400.0, 100.0, 0.7),
                candidate(100.0, 400.0, 0.7),
            ],
            &FusionParams::default(),
        );
        let centers: Vec<_> = set.iter().map(|c| c.center).collect();
        assert_eq!(set.len(), 3);
        assert!(!centers.contains(&Point2::new(140.0, 100.0)));
        assert_eq!(set.separation, 50.0);
    }

    #[test]
    fn relaxed_pass_admits_close_pair_when_too_few() {
        let set = fuse_candidates(
            vec![candidate(100.0, 100.0, 0.9), candidate(140.0, 100.0, 0.8)],
            &FusionParams::default(),
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.separation, 30.0);
        assert_eq!(set.candidates[0].candidate.center, Point2::new(100.0, 100.0));
    }

    #[test]
    fn selection_stops_at_four() {
        let cands = (0..6)
            .map(|i| candidate(100.0 * i as f32, 0.0, 0.9 - 0.05 * i as f32))
            .collect();
        let set = fuse_candidates(cands, &FusionParams::default());
        assert_eq!(set.len(), 4);
        assert_eq!(set.unique, 6);
        for pair in set.candidates.windows(2) {
            assert!(pair[0].combined_score >= pair[1].combined_score);
        }
    }

    #[test]
    fn quality_rewards_consistent_lines() {
        let params = FusionParams::default();
        let plain = candidate(0.0, 0.0, 0.7);
        let mut lined = plain.clone();
        lined.lines = Direction::ALL
            .iter()
            .map(|&direction| LineProbe {
                direction,
                outcome: Scored::Accepted(LineAnalysis {
                    runs: Vec::new(),
                    ratios: [0.0; 5],
                    deviations: [0.0; 5],
                    ratio_matches: 5,
                    center_dominant: true,
                    side_consistent: true,
                    side_variation: 0.0,
                    score: 1.0,
                }),
            })
            .collect();
        // 0.2 size + 0.1 method only, versus the full line terms on top.
        assert!((quality_signal(&plain, &params) - 0.3).abs() < 1e-6);
        assert!((quality_signal(&lined, &params) - 0.8).abs() < 1e-6);
    }
}
