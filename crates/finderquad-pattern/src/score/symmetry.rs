//! Mirror symmetry test on a square window around the candidate.

use finderquad_core::BinaryMask;
use serde::{Deserialize, Serialize};

use super::outcome::{RejectReason, Score, Scored};
use super::params::ScoreParams;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymmetryAnalysis {
    /// Left half against the mirrored right half.
    pub horizontal_similarity: f32,
    /// Top half against the mirrored bottom half.
    pub vertical_similarity: f32,
    pub combined: f32,
    pub region_width: usize,
    pub region_height: usize,
    pub score: f32,
}

impl Score for SymmetryAnalysis {
    fn score(&self) -> f32 {
        self.score
    }
}

fn quantize(similarity: f32) -> f32 {
    match similarity {
        s if s >= 0.8 => 1.0,
        s if s >= 0.7 => 0.8,
        s if s >= 0.6 => 0.6,
        s if s >= 0.5 => 0.4,
        _ => 0.0,
    }
}

/// `1 - mean|a - b| / 255` over paired pixels, 0 for an empty pairing.
fn similarity(pairs: impl Iterator<Item = (u8, u8)>) -> f32 {
    let (mut sum, mut n) = (0.0f64, 0usize);
    for (a, b) in pairs {
        sum += (a as f64 - b as f64).abs();
        n += 1;
    }
    if n == 0 {
        return 0.0;
    }
    (1.0 - sum / n as f64 / 255.0) as f32
}

/// Symmetry of a row-major `width x height` region.
///
/// Column `x` is paired with `width - 1 - x` (rows likewise), so with an odd
/// side the middle column (row) is left out of the comparison.
pub fn region_symmetry(region: &[u8], width: usize, height: usize) -> SymmetryAnalysis {
    let at = |x: usize, y: usize| region[y * width + x];

    let horizontal = similarity(
        (0..height).flat_map(|y| (0..width / 2).map(move |x| (at(x, y), at(width - 1 - x, y)))),
    );
    let vertical = similarity(
        (0..height / 2).flat_map(|y| (0..width).map(move |x| (at(x, y), at(x, height - 1 - y)))),
    );

    let combined = 0.5 * (horizontal + vertical);
    SymmetryAnalysis {
        horizontal_similarity: horizontal,
        vertical_similarity: vertical,
        combined,
        region_width: width,
        region_height: height,
        score: quantize(combined),
    }
}

/// Extract the window around `(cx, cy)` from the mask and test it.
pub fn analyze_symmetry(
    mask: &BinaryMask,
    cx: i32,
    cy: i32,
    radius: i32,
    params: &ScoreParams,
) -> Scored<SymmetryAnalysis> {
    let half = (2 * radius).min(params.symmetry_max_region) / 2;
    let x1 = (cx - half).max(0);
    let y1 = (cy - half).max(0);
    let x2 = (cx + half).min(mask.width as i32);
    let y2 = (cy + half).min(mask.height as i32);
    if x2 - x1 < params.symmetry_min_region || y2 - y1 < params.symmetry_min_region {
        return Scored::rejected(RejectReason::RegionTooSmall);
    }

    let (w, h) = ((x2 - x1) as usize, (y2 - y1) as usize);
    let mut region = Vec::with_capacity(w * h);
    for y in y1..y2 {
        for x in x1..x2 {
            region.push(mask.intensity(x, y).unwrap_or(0));
        }
    }
    Scored::Accepted(region_symmetry(&region, w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Concentric squares, symmetric about both axes.
    fn concentric(w: usize, h: usize) -> Vec<u8> {
        let mut region = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                let d = x.min(w - 1 - x).min(y).min(h - 1 - y);
                region[y * w + x] = if d % 4 < 2 { 0 } else { 255 };
            }
        }
        region
    }

    #[test]
    fn mirror_symmetric_region_scores_full() {
        let s = region_symmetry(&concentric(20, 20), 20, 20);
        assert_eq!(s.horizontal_similarity, 1.0);
        assert_eq!(s.vertical_similarity, 1.0);
        assert_eq!(s.score, 1.0);
    }

    #[test]
    fn odd_sided_region_mirrors_about_its_middle() {
        for (w, h) in [(21, 21), (21, 20), (19, 23)] {
            let s = region_symmetry(&concentric(w, h), w, h);
            assert_eq!(s.horizontal_similarity, 1.0, "{w}x{h}");
            assert_eq!(s.vertical_similarity, 1.0, "{w}x{h}");
            assert_eq!(s.score, 1.0, "{w}x{h}");
        }
    }

    #[test]
    fn checkerboard_noise_scores_low() {
        let n = 20usize;
        let region: Vec<u8> = (0..n * n)
            .map(|i| if (i % n + i / n) % 2 == 0 { 0 } else { 255 })
            .collect();
        let s = region_symmetry(&region, n, n);
        assert!(s.score <= 0.4, "score {}", s.score);
    }

    #[test]
    fn small_radius_leaves_too_small_window() {
        let mask = BinaryMask::new(30, 30);
        let params = ScoreParams::default();
        let res = analyze_symmetry(&mask, 15, 15, 4, &params);
        assert_eq!(res.reason(), Some(&RejectReason::RegionTooSmall));
        let res = analyze_symmetry(&mask, 15, 15, 20, &params);
        assert_eq!(res.score(), 1.0);
    }
}
