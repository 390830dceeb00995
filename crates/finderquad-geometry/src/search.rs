//! Combinatorial subset search over surviving pattern centers.
//!
//! Both searches enumerate every `C(n, 3)` or `C(n, 4)` subset. That is only
//! acceptable for small `n`; [`SearchParams::max_candidates`] caps it and the
//! searches refuse larger inputs with [`GeometryError::TooManyCandidates`].

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::quad::{QuadParams, Quadrilateral};
use crate::roles::corner_roles;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A pattern center together with its detection score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub center: Point2<f32>,
    pub score: f32,
}

impl Anchor {
    pub fn new(center: Point2<f32>, score: f32) -> Self {
        Self { center, score }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Upper bound on `n` for the combinatorial searches.
    pub max_candidates: usize,
    /// Two edges count as parallel when their directions differ by at most this.
    pub angle_tolerance_deg: f32,
    pub min_parallelism: f32,
    pub min_similarity: f32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_candidates: 8,
            angle_tolerance_deg: 15.0,
            min_parallelism: 0.5,
            min_similarity: 0.6,
        }
    }
}

/// Best three-pattern subset, completed to a quadrilateral.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripleMatch {
    /// Input indices in `[TL, TR, BL]` order.
    pub indices: [usize; 3],
    pub quad: Quadrilateral,
    pub score: f32,
}

/// Best four-pattern subset forming a rectangle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectangleMatch {
    /// Input indices in clockwise `[TL, TR, BR, BL]` order.
    pub indices: [usize; 4],
    pub corners: [Point2<f32>; 4],
    pub parallelism: f32,
    pub similarity: f32,
    pub rectangle_score: f32,
    pub score: f32,
}

/// Permutation putting four points in clockwise order (image coordinates,
/// y down), starting at the point with the smallest `x + y`.
pub fn clockwise_order(pts: &[Point2<f32>; 4]) -> [usize; 4] {
    let cx = pts.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = pts.iter().map(|p| p.y).sum::<f32>() / 4.0;

    let mut idx = [0usize, 1, 2, 3];
    idx.sort_by(|&a, &b| {
        let ta = (pts[a].y - cy).atan2(pts[a].x - cx);
        let tb = (pts[b].y - cy).atan2(pts[b].x - cx);
        ta.total_cmp(&tb)
    });

    let start = (0..4)
        .min_by(|&a, &b| {
            let sa = pts[idx[a]].x + pts[idx[a]].y;
            let sb = pts[idx[b]].x + pts[idx[b]].y;
            sa.total_cmp(&sb)
        })
        .unwrap_or(0);
    idx.rotate_left(start);
    idx
}

pub fn order_clockwise(pts: &[Point2<f32>; 4]) -> [Point2<f32>; 4] {
    clockwise_order(pts).map(|i| pts[i])
}

fn check_count(n: usize, params: &SearchParams) -> Result<(), GeometryError> {
    if n > params.max_candidates {
        return Err(GeometryError::TooManyCandidates {
            found: n,
            max: params.max_candidates,
        });
    }
    Ok(())
}

fn triple_score(quad: &Quadrilateral, in_range: bool, mean_score: f32) -> f32 {
    let aspect = (1.0 - (quad.aspect_ratio - 1.0).abs()).max(0.0);
    0.25 * quad.side_consistency
        + 0.25 * quad.height_consistency
        + 0.25 * aspect
        + 0.15 * if in_range { 1.0 } else { 0.0 }
        + 0.10 * mean_score
}

/// Score every `C(n, 3)` subset by geometric consistency and keep the best.
///
/// Needs at least three anchors. The winning quadrilateral is returned as
/// measured, valid or not.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(n = anchors.len())))]
pub fn best_triple(
    anchors: &[Anchor],
    quad_params: &QuadParams,
    image_size: Option<(usize, usize)>,
    params: &SearchParams,
) -> Result<TripleMatch, GeometryError> {
    let n = anchors.len();
    if n < 3 {
        return Err(GeometryError::WrongCandidateCount { found: n });
    }
    check_count(n, params)?;

    let score_subset = |subset: [usize; 3]| {
        let roles = corner_roles(&subset.map(|i| anchors[i].center));
        let quad = Quadrilateral::reconstruct(&roles, quad_params, image_size);
        let in_range = quad.corners_in_range(quad_params, image_size);
        let mean = subset.iter().map(|&i| anchors[i].score).sum::<f32>() / 3.0;
        let score = triple_score(&quad, in_range, mean);
        log::trace!("triple {subset:?} score {score:.3} valid {}", quad.valid);
        TripleMatch {
            indices: roles.indices.map(|k| subset[k]),
            quad,
            score,
        }
    };

    let mut best = score_subset([0, 1, 2]);
    for a in 0..n {
        for b in (a + 1)..n {
            for c in (b + 1)..n {
                if (a, b, c) == (0, 1, 2) {
                    continue;
                }
                let m = score_subset([a, b, c]);
                if m.score > best.score {
                    best = m;
                }
            }
        }
    }
    Ok(best)
}

fn edge_angle(p: Point2<f32>, q: Point2<f32>) -> f32 {
    (q.y - p.y).atan2(q.x - p.x).to_degrees().rem_euclid(180.0)
}

fn parallel(a: f32, b: f32, tolerance: f32) -> bool {
    let d = (a - b).abs();
    d.min((d - 180.0).abs()) <= tolerance
}

fn length_ratio(a: f32, b: f32) -> f32 {
    let m = a.max(b);
    if m <= f32::EPSILON {
        0.0
    } else {
        a.min(b) / m
    }
}

/// Rectangle test on clockwise `[p1, p2, p3, p4]`:
/// `(parallelism, similarity)`.
fn rectangle_measures(c: &[Point2<f32>; 4], tolerance: f32) -> (f32, f32) {
    let [p1, p2, p3, p4] = *c;
    let top = (p2 - p1).norm();
    let right = (p3 - p2).norm();
    let bottom = (p4 - p3).norm();
    let left = (p1 - p4).norm();

    let ph = parallel(edge_angle(p1, p2), edge_angle(p4, p3), tolerance);
    let pv = parallel(edge_angle(p2, p3), edge_angle(p1, p4), tolerance);
    let parallelism = (ph as u8 + pv as u8) as f32 / 2.0;
    let similarity = 0.5 * (length_ratio(top, bottom) + length_ratio(right, left));
    (parallelism, similarity)
}

fn consensus_bonus(min_score: f32) -> f32 {
    if min_score >= 0.8 {
        1.2
    } else if min_score >= 0.7 {
        1.1
    } else {
        1.0
    }
}

/// Look for four anchors that already form a rectangle.
///
/// Returns `Ok(None)` with fewer than four anchors or when no quadruple
/// passes the parallelism/similarity test.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(n = anchors.len())))]
pub fn best_rectangle(
    anchors: &[Anchor],
    params: &SearchParams,
) -> Result<Option<RectangleMatch>, GeometryError> {
    let n = anchors.len();
    if n < 4 {
        return Ok(None);
    }
    check_count(n, params)?;

    let mut best: Option<RectangleMatch> = None;
    for a in 0..n {
        for b in (a + 1)..n {
            for c in (b + 1)..n {
                for d in (c + 1)..n {
                    let subset = [a, b, c, d];
                    let pts = subset.map(|i| anchors[i].center);
                    let order = clockwise_order(&pts);
                    let corners = order.map(|k| pts[k]);

                    let (parallelism, similarity) =
                        rectangle_measures(&corners, params.angle_tolerance_deg);
                    if parallelism < params.min_parallelism || similarity < params.min_similarity {
                        continue;
                    }

                    let rectangle_score = 0.6 * parallelism + 0.4 * similarity;
                    let scores = subset.map(|i| anchors[i].score);
                    let mean = scores.iter().sum::<f32>() / 4.0;
                    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
                    let score = (0.5 * rectangle_score + 0.5 * mean) * consensus_bonus(min);

                    log::trace!("quadruple {subset:?} rect {rectangle_score:.3} score {score:.3}");
                    if score > best.as_ref().map_or(0.0, |m| m.score) {
                        best = Some(RectangleMatch {
                            indices: order.map(|k| subset[k]),
                            corners,
                            parallelism,
                            similarity,
                            rectangle_score,
                            score,
                        });
                    }
                }
            }
        }
    }

    Ok(best)
}
