//! Concentric ring test: dark center, light first ring, dark second ring.

use finderquad_core::BinaryMask;
use serde::{Deserialize, Serialize};

use super::outcome::{RejectReason, Score, Scored};
use super::params::ScoreParams;

/// Dark-pixel statistics along one sampled ring.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingSample {
    pub radius: i32,
    pub dark_ratio: f32,
    pub dark_count: usize,
    pub total: usize,
}

/// Graduated per-component scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RingComponents {
    pub center: f32,
    pub first_ring: f32,
    pub second_ring: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConcentricAnalysis {
    /// Weighted component blend.
    pub score: f32,
    pub center_radius: i32,
    pub center_dark_ratio: f32,
    /// First (expected light) and second (expected dark) ring, radii increasing.
    pub rings: Vec<RingSample>,
    pub components: RingComponents,
}

impl Score for ConcentricAnalysis {
    fn score(&self) -> f32 {
        self.score
    }
}

/// Sampling radii derived from the pattern size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Radii {
    center: i32,
    first: i32,
    second: i32,
}

fn radii_for(size: i32, safe: i32) -> Radii {
    let u = size / 14;
    let mut r = Radii {
        center: u.max(2),
        first: (3 * u).max(4),
        second: (6 * u).max(6),
    };
    if r.second > safe {
        let scale = safe as f64 / r.second as f64;
        r.first = (r.first as f64 * scale) as i32;
        r.second = (r.second as f64 * scale) as i32;
        r.center = ((r.center as f64 * scale) as i32).max(2);
    }
    r
}

/// Light ring: full credit up to 30% dark, nothing past 60%.
fn first_ring_score(dark: f32) -> f32 {
    match dark {
        d if d <= 0.3 => 1.0,
        d if d <= 0.4 => 0.8,
        d if d <= 0.5 => 0.6,
        d if d <= 0.6 => 0.3,
        _ => 0.0,
    }
}

/// Dark ring: full credit from 80% dark, nothing under 50%.
fn second_ring_score(dark: f32) -> f32 {
    match dark {
        d if d >= 0.8 => 1.0,
        d if d >= 0.7 => 0.9,
        d if d >= 0.6 => 0.7,
        d if d >= 0.5 => 0.4,
        _ => 0.0,
    }
}

fn center_score(dark: f32) -> f32 {
    if dark >= 0.9 {
        1.0
    } else if dark >= 0.8 {
        0.95
    } else {
        dark
    }
}

fn sample_ring(mask: &BinaryMask, cx: i32, cy: i32, radius: i32, step_deg: usize) -> RingSample {
    let mut dark_count = 0;
    let mut total = 0;
    for deg in (0..360).step_by(step_deg.max(1)) {
        let (s, c) = (deg as f64).to_radians().sin_cos();
        let x = (cx as f64 + radius as f64 * c) as i32;
        let y = (cy as f64 + radius as f64 * s) as i32;
        if let Some(d) = mask.get(x, y) {
            total += 1;
            dark_count += d as usize;
        }
    }
    RingSample {
        radius,
        dark_ratio: if total > 0 {
            dark_count as f32 / total as f32
        } else {
            0.0
        },
        dark_count,
        total,
    }
}

/// Run the concentric ring test around pixel `(cx, cy)` for a pattern of
/// side `size`.
pub fn analyze_concentric(
    mask: &BinaryMask,
    cx: i32,
    cy: i32,
    size: i32,
    params: &ScoreParams,
) -> Scored<ConcentricAnalysis> {
    let (w, h) = (mask.width as i32, mask.height as i32);
    if cx < 0 || cy < 0 || cx >= w || cy >= h {
        return Scored::rejected(RejectReason::CenterOutOfBounds);
    }

    let safe = cx.min(cy).min(w - cx - 1).min(h - cy - 1);
    let radii = radii_for(size, safe);
    if radii.first < 3 || radii.second < 5 {
        return Scored::rejected(RejectReason::PatternTooSmall);
    }

    let rc = radii.center;
    let (mut center_dark, mut center_total) = (0usize, 0usize);
    for dy in -rc..=rc {
        for dx in -rc..=rc {
            if dx * dx + dy * dy > rc * rc {
                continue;
            }
            if let Some(d) = mask.get(cx + dx, cy + dy) {
                center_total += 1;
                center_dark += d as usize;
            }
        }
    }
    if center_total < params.min_center_samples {
        return Scored::rejected(RejectReason::InsufficientCenterSamples);
    }

    let center_dark_ratio = center_dark as f32 / center_total as f32;
    let mut analysis = ConcentricAnalysis {
        score: 0.0,
        center_radius: rc,
        center_dark_ratio,
        rings: Vec::with_capacity(2),
        components: RingComponents::default(),
    };
    if center_dark_ratio < params.center_min_dark {
        return Scored::rejected_with(
            RejectReason::CenterNotDark {
                ratio: center_dark_ratio,
            },
            analysis,
        );
    }

    for (i, r) in [radii.first, radii.second].into_iter().enumerate() {
        let ring = sample_ring(mask, cx, cy, r, params.ring_step_deg);
        if ring.total < params.min_ring_samples {
            return Scored::rejected_with(
                RejectReason::InsufficientRingSamples { ring: i + 1 },
                analysis,
            );
        }
        analysis.rings.push(ring);
    }

    let wts = &params.ring_weights;
    analysis.components = RingComponents {
        center: center_score(center_dark_ratio),
        first_ring: first_ring_score(analysis.rings[0].dark_ratio),
        second_ring: second_ring_score(analysis.rings[1].dark_ratio),
    };
    analysis.score = wts.center * analysis.components.center
        + wts.first_ring * analysis.components.first_ring
        + wts.second_ring * analysis.components.second_ring;

    if analysis.score < params.concentric_floor {
        return Scored::rejected_with(
            RejectReason::InsufficientQuality {
                quality: analysis.score,
            },
            analysis,
        );
    }
    Scored::Accepted(analysis)
}
