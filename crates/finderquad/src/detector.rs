//! End-to-end pipeline: variants -> candidates -> fusion -> quadrilateral -> grid.

use finderquad_core::GrayImageView;
use finderquad_geometry::{
    assign_corner_roles, best_rectangle, best_triple, sample_grid, Anchor, GeometryError,
    Quadrilateral,
};
use finderquad_pattern::{
    binarize, extract_candidates, fuse_candidates, BinarizationMethod, Candidate, PatternScorer,
    PatternSet,
};
use nalgebra::{Point2, Vector2};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::DetectError;
use crate::params::FinderParams;
use crate::result::{DetectionResult, PatternScan, QuadSource, VariantReport};

/// Candidate centers are pixel indices; corners handed to the grid sampler
/// are continuous coordinates where pixel `i` covers `[i, i + 1)`.
fn pixel_center(p: Point2<f32>) -> Point2<f32> {
    p + Vector2::new(0.5, 0.5)
}

/// Finder-pattern detector.
///
/// Holds only configuration; every call works on its own buffers, so one
/// detector can be shared across threads.
#[derive(Clone, Debug)]
pub struct FinderDetector {
    params: FinderParams,
    scorer: PatternScorer,
}

impl Default for FinderDetector {
    fn default() -> Self {
        Self::new(FinderParams::default())
    }
}

impl FinderDetector {
    pub fn new(params: FinderParams) -> Self {
        let scorer = PatternScorer::new(params.score.clone());
        Self { params, scorer }
    }

    #[inline]
    pub fn params(&self) -> &FinderParams {
        &self.params
    }

    /// Validate a raw row-major buffer and run [`Self::detect`] on it.
    pub fn detect_raw(
        &self,
        width: usize,
        height: usize,
        data: &[u8],
    ) -> Result<DetectionResult, DetectError> {
        let view = GrayImageView::new(width, height, data).map_err(|_| DetectError::InvalidImage {
            width,
            height,
            len: data.len(),
        })?;
        self.detect(&view)
    }

    /// Run the whole pipeline on one image.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, img), fields(width = img.width, height = img.height))
    )]
    pub fn detect(&self, img: &GrayImageView<'_>) -> Result<DetectionResult, DetectError> {
        let PatternScan { patterns, reports } = self.detect_patterns(img);
        let (quad, source, corner_patterns) =
            self.reconstruct(&patterns, Some((img.width, img.height)))?;

        let grid = if self.params.sample_grid {
            let corners = quad.corners.map(pixel_center);
            Some(sample_grid(img, &corners, &self.params.grid)?)
        } else {
            None
        };

        log::info!(
            "detected {} patterns, quad {:?} aspect {:.3}",
            patterns.len(),
            source,
            quad.aspect_ratio
        );

        Ok(DetectionResult {
            patterns,
            quad,
            source,
            corner_patterns,
            grid,
            reports,
        })
    }

    /// Binarize, extract and score every variant, then fuse the survivors.
    ///
    /// Variants are independent (map); fusion needs all of them (reduce).
    pub fn detect_patterns(&self, img: &GrayImageView<'_>) -> PatternScan {
        let methods = &self.params.binarize.methods;

        #[cfg(feature = "rayon")]
        let per_variant: Vec<(Vec<Candidate>, VariantReport)> = methods
            .par_iter()
            .map(|&m| self.scan_variant(img, m))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let per_variant: Vec<(Vec<Candidate>, VariantReport)> = methods
            .iter()
            .map(|&m| self.scan_variant(img, m))
            .collect();

        let mut candidates = Vec::new();
        let mut reports = Vec::with_capacity(per_variant.len());
        for (found, report) in per_variant {
            candidates.extend(found);
            reports.push(report);
        }

        log::debug!(
            "{} scored candidates across {} variants",
            candidates.len(),
            reports.len()
        );
        let patterns = fuse_candidates(candidates, &self.params.fusion);
        PatternScan { patterns, reports }
    }

    fn scan_variant(
        &self,
        img: &GrayImageView<'_>,
        method: BinarizationMethod,
    ) -> (Vec<Candidate>, VariantReport) {
        let mask = binarize(img, method, &self.params.binarize);
        let (raws, extraction) = extract_candidates(&mask, method, &self.params.extract);
        let scored = self.scorer.score_all(&mask, &raws);
        let report = VariantReport {
            method,
            extraction,
            accepted: scored.len(),
        };
        (scored, report)
    }

    /// Turn a fused pattern set into a validated quadrilateral.
    ///
    /// With four or more patterns a detected rectangle wins; otherwise the
    /// best three are completed with the parallelogram rule. Returns the
    /// pattern indices used per corner (`None` for a reconstructed one).
    #[allow(clippy::type_complexity)]
    pub fn reconstruct(
        &self,
        patterns: &PatternSet,
        image_size: Option<(usize, usize)>,
    ) -> Result<(Quadrilateral, QuadSource, [Option<usize>; 4]), DetectError> {
        let n = patterns.len();
        if n < 3 {
            return Err(DetectError::InsufficientCandidates { found: n });
        }

        let anchors: Vec<Anchor> = patterns
            .iter()
            .map(|c| Anchor::new(c.center, c.composite_score))
            .collect();
        let qp = &self.params.quad;

        if let Some(rect) = best_rectangle(&anchors, &self.params.search)? {
            let quad = Quadrilateral::from_corners(rect.corners, qp, image_size, false);
            if quad.valid {
                return Ok((quad, QuadSource::Rectangle, rect.indices.map(Some)));
            }
            log::debug!(
                "rectangle {:?} rejected: {:?}",
                rect.indices,
                quad.violations
            );
        }

        let (quad, idx) = if n == 3 {
            let centers: Vec<Point2<f32>> = anchors.iter().map(|a| a.center).collect();
            let roles = assign_corner_roles(&centers)
                .ok_or(GeometryError::WrongCandidateCount { found: n })?;
            (
                Quadrilateral::reconstruct(&roles, qp, image_size),
                roles.indices,
            )
        } else {
            let m = best_triple(&anchors, qp, image_size, &self.params.search)?;
            (m.quad, m.indices)
        };

        quad.validate()?;
        let [tl, tr, bl] = idx;
        Ok((
            quad,
            QuadSource::Triple,
            [Some(tl), Some(tr), None, Some(bl)],
        ))
    }
}
