//! 1:1:3:1:1 scanline ratio test.

use finderquad_core::BinaryMask;
use serde::{Deserialize, Serialize};

use super::outcome::{RejectReason, Score, Scored};
use super::params::ScoreParams;

/// Reference proportions the five runs are compared against.
pub const IDEAL_RATIOS: [f32; 5] = [1.0 / 8.0, 1.0 / 8.0, 3.0 / 8.0, 1.0 / 8.0, 1.0 / 8.0];

/// Scan direction through a candidate center.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Horizontal,
    Vertical,
    Diagonal,
    AntiDiagonal,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::Diagonal,
        Direction::AntiDiagonal,
    ];

    /// Pixel step `(dx, dy)` along the direction.
    pub fn step(self) -> (i32, i32) {
        match self {
            Self::Horizontal => (1, 0),
            Self::Vertical => (0, 1),
            Self::Diagonal => (1, 1),
            Self::AntiDiagonal => (1, -1),
        }
    }
}

/// Maximal stretch of equally classified pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub dark: bool,
    pub length: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineAnalysis {
    pub runs: Vec<Run>,
    /// First five run lengths over their sum.
    pub ratios: [f32; 5],
    /// `|ratio - ideal|` per position.
    pub deviations: [f32; 5],
    /// Positions within half the tolerance.
    pub ratio_matches: usize,
    pub center_dominant: bool,
    pub side_consistent: bool,
    /// Population standard deviation of the four side ratios.
    pub side_variation: f32,
    pub score: f32,
}

impl Score for LineAnalysis {
    fn score(&self) -> f32 {
        self.score
    }
}

/// Line test result for one direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineProbe {
    pub direction: Direction,
    pub outcome: Scored<LineAnalysis>,
}

/// Classify against the segment mean and run-length encode.
pub fn run_lengths(pixels: &[u8]) -> Vec<Run> {
    if pixels.is_empty() {
        return Vec::new();
    }
    let mean = pixels.iter().map(|&p| p as f32).sum::<f32>() / pixels.len() as f32;
    let mut runs: Vec<Run> = Vec::new();
    for &p in pixels {
        let dark = (p as f32) < mean;
        match runs.last_mut() {
            Some(run) if run.dark == dark => run.length += 1,
            _ => runs.push(Run { dark, length: 1 }),
        }
    }
    runs
}

fn credit(deviation: f32, t: f32) -> f32 {
    if deviation < 0.5 * t {
        1.0
    } else if deviation < t {
        0.7
    } else if deviation < 1.5 * t {
        0.3
    } else {
        0.0
    }
}

/// Score a run sequence against the 1:1:3:1:1 profile.
pub fn analyze_runs(runs: &[Run], tolerance: f32) -> Scored<LineAnalysis> {
    let mut analysis = LineAnalysis {
        runs: runs.to_vec(),
        ratios: [0.0; 5],
        deviations: [0.0; 5],
        ratio_matches: 0,
        center_dominant: false,
        side_consistent: false,
        side_variation: 0.0,
        score: 0.0,
    };

    if runs.len() < 5 {
        return Scored::rejected_with(RejectReason::TooFewRuns { runs: runs.len() }, analysis);
    }
    if !runs[0].dark {
        return Scored::rejected_with(RejectReason::StartsLight, analysis);
    }
    if let Some(position) = runs[..5]
        .iter()
        .enumerate()
        .position(|(i, r)| r.dark != (i % 2 == 0))
    {
        return Scored::rejected_with(RejectReason::PatternBreak { position }, analysis);
    }

    let total: usize = runs[..5].iter().map(|r| r.length).sum();
    let mut credit_sum = 0.0;
    for i in 0..5 {
        let ratio = runs[i].length as f32 / total as f32;
        let dev = (ratio - IDEAL_RATIOS[i]).abs();
        analysis.ratios[i] = ratio;
        analysis.deviations[i] = dev;
        if dev < 0.5 * tolerance {
            analysis.ratio_matches += 1;
        }
        credit_sum += credit(dev, tolerance);
    }

    let r = analysis.ratios;
    let sides = [r[0], r[1], r[3], r[4]];
    let side_max = sides.iter().copied().fold(f32::MIN, f32::max);
    let side_mean = sides.iter().sum::<f32>() / 4.0;
    analysis.side_variation =
        (sides.iter().map(|s| (s - side_mean).powi(2)).sum::<f32>() / 4.0).sqrt();
    analysis.center_dominant = r[2] > side_max * 1.1;
    analysis.side_consistent = analysis.side_variation < 0.08;

    let mut score = credit_sum / 5.0;
    if analysis.center_dominant {
        score += 0.2;
    }
    if analysis.side_consistent {
        score += 0.1;
    }
    analysis.score = score.min(1.0);
    Scored::Accepted(analysis)
}

/// Run the line test on raw scanline intensities.
pub fn analyze_line(pixels: &[u8], params: &ScoreParams) -> Scored<LineAnalysis> {
    if pixels.len() < params.min_line_pixels {
        return Scored::rejected(RejectReason::InsufficientLength);
    }
    analyze_runs(&run_lengths(pixels), params.ratio_tolerance)
}

/// Mask intensities along `direction` through `(cx, cy)`, at most
/// `half_length` steps each way, skipping out-of-bounds taps.
pub fn sample_line(
    mask: &BinaryMask,
    cx: i32,
    cy: i32,
    half_length: i32,
    direction: Direction,
) -> Vec<u8> {
    let (dx, dy) = direction.step();
    (-half_length..=half_length)
        .filter_map(|i| mask.intensity(cx + i * dx, cy + i * dy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pixels_from(lengths: &[usize]) -> Vec<u8> {
        lengths
            .iter()
            .enumerate()
            .flat_map(|(i, &n)| std::iter::repeat(if i % 2 == 0 { 0 } else { 255 }).take(n))
            .collect()
    }

    #[test]
    fn exact_finder_runs_score_full() {
        let px = pixels_from(&[5, 5, 15, 5, 5]);
        let a = analyze_line(&px, &ScoreParams::default())
            .into_accepted()
            .expect("accepted");
        let unit = 1.0 / 7.0;
        for (i, expected) in [unit, unit, 3.0 * unit, unit, unit].iter().enumerate() {
            assert_relative_eq!(a.ratios[i], *expected, epsilon = 1e-6);
        }
        assert_eq!(a.ratio_matches, 5);
        assert!(a.center_dominant);
        assert!(a.side_consistent);
        assert_eq!(a.score, 1.0);
    }

    #[test]
    fn trailing_runs_are_ignored() {
        let px = pixels_from(&[4, 4, 12, 4, 4, 9, 3]);
        let a = analyze_line(&px, &ScoreParams::default());
        assert_eq!(a.score(), 1.0);
    }

    #[test]
    fn run_count_and_polarity_rejections() {
        let params = ScoreParams::default();
        let short = pixels_from(&[4, 4, 4]);
        assert_eq!(
            analyze_line(&short, &params).reason(),
            Some(&RejectReason::TooFewRuns { runs: 3 })
        );

        let light_first: Vec<u8> = std::iter::repeat(255)
            .take(3)
            .chain(pixels_from(&[4, 4, 12, 4, 4]))
            .collect();
        assert_eq!(
            analyze_line(&light_first, &params).reason(),
            Some(&RejectReason::StartsLight)
        );

        assert_eq!(
            analyze_line(&[0; 8], &params).reason(),
            Some(&RejectReason::InsufficientLength)
        );
    }

    #[test]
    fn non_alternating_runs_break() {
        let runs = [
            Run { dark: true, length: 3 },
            Run { dark: false, length: 3 },
            Run { dark: false, length: 9 },
            Run { dark: true, length: 3 },
            Run { dark: false, length: 3 },
        ];
        assert_eq!(
            analyze_runs(&runs, 0.22).reason(),
            Some(&RejectReason::PatternBreak { position: 2 })
        );
    }

    #[test]
    fn distorted_ratios_get_partial_credit() {
        // Center run far too short: no dominance bonus.
        let px = pixels_from(&[6, 6, 3, 6, 6]);
        let a = analyze_line(&px, &ScoreParams::default())
            .into_accepted()
            .expect("accepted");
        assert!(!a.center_dominant);
        assert!(a.score < 1.0);
    }

    #[test]
    fn diagonal_sampling_follows_step() {
        let mut mask = BinaryMask::new(9, 9);
        mask.dark[4 * 9 + 4] = true;
        let px = sample_line(&mask, 4, 4, 2, Direction::AntiDiagonal);
        assert_eq!(px, vec![255, 255, 0, 255, 255]);
        let clipped = sample_line(&mask, 0, 0, 3, Direction::Horizontal);
        assert_eq!(clipped.len(), 4);
    }
}
