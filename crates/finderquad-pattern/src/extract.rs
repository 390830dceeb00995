//! Blob outline extraction and square-shape filtering.

use finderquad_core::BinaryMask;
use imageproc::contours::{find_contours, BorderType};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::binarize::BinarizationMethod;
use crate::polygon;
use crate::types::{BoundingBox, RawCandidate};

/// Shape filter settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractParams {
    /// Outline area must be at least `min_pattern_size^2`.
    pub min_pattern_size: f32,
    /// Outline area must be at most `max_pattern_size^2`.
    pub max_pattern_size: f32,
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Minimum outline-area / bbox-area.
    pub min_fill_ratio: f32,
    pub min_corners: usize,
    pub max_corners: usize,
    /// Vertices sharper than this count as corners.
    pub corner_angle_deg: f64,
    /// Simplification tolerance as a fraction of the outline perimeter.
    pub approx_epsilon_frac: f64,
    /// Also consider the inner borders of holes.
    pub include_holes: bool,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            min_pattern_size: 8.0,
            max_pattern_size: 500.0,
            min_aspect: 0.4,
            max_aspect: 2.5,
            min_fill_ratio: 0.3,
            min_corners: 3,
            max_corners: 10,
            corner_angle_deg: 135.0,
            approx_epsilon_frac: 0.02,
            include_holes: true,
        }
    }
}

/// Why a traced blob was dropped.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlobRejection {
    #[error("degenerate outline ({points} points)")]
    Degenerate { points: usize },
    #[error("area {area:.0} outside [{min:.0}, {max:.0}]")]
    Area { area: f32, min: f32, max: f32 },
    #[error("aspect ratio {aspect:.3} outside [{min}, {max}]")]
    Aspect { aspect: f32, min: f32, max: f32 },
    #[error("fill ratio {fill:.3} below {min}")]
    Fill { fill: f32, min: f32 },
    #[error("corner count {corners} outside [{min}, {max}]")]
    Corners {
        corners: usize,
        min: usize,
        max: usize,
    },
}

/// Per-variant extraction diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub method: BinarizationMethod,
    pub outlines: usize,
    pub accepted: usize,
    pub rejections: Vec<BlobRejection>,
}

fn bounding_box(pts: &[Point2<f64>]) -> BoundingBox {
    let (mut x0, mut y0) = (f64::MAX, f64::MAX);
    let (mut x1, mut y1) = (f64::MIN, f64::MIN);
    for p in pts {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    BoundingBox {
        x: x0 as i32,
        y: y0 as i32,
        width: (x1 - x0) as u32 + 1,
        height: (y1 - y0) as u32 + 1,
    }
}

/// Run the shape filter on one outline.
pub fn filter_outline(
    outline: &[Point2<f64>],
    method: BinarizationMethod,
    params: &ExtractParams,
) -> Result<RawCandidate, BlobRejection> {
    if outline.len() < 3 {
        return Err(BlobRejection::Degenerate {
            points: outline.len(),
        });
    }

    let area = polygon::signed_area(outline).abs() as f32;
    let (min_area, max_area) = (
        params.min_pattern_size * params.min_pattern_size,
        params.max_pattern_size * params.max_pattern_size,
    );
    if area < min_area || area > max_area {
        return Err(BlobRejection::Area {
            area,
            min: min_area,
            max: max_area,
        });
    }

    let bbox = bounding_box(outline);
    let aspect = bbox.aspect();
    if aspect < params.min_aspect || aspect > params.max_aspect {
        return Err(BlobRejection::Aspect {
            aspect,
            min: params.min_aspect,
            max: params.max_aspect,
        });
    }

    let fill = area / bbox.area();
    if fill < params.min_fill_ratio {
        return Err(BlobRejection::Fill {
            fill,
            min: params.min_fill_ratio,
        });
    }

    let epsilon = params.approx_epsilon_frac * polygon::perimeter(outline);
    let approx = polygon::simplify_closed(outline, epsilon);
    let corners = polygon::count_corners(&approx, params.corner_angle_deg);
    if corners < params.min_corners || corners > params.max_corners {
        return Err(BlobRejection::Corners {
            corners,
            min: params.min_corners,
            max: params.max_corners,
        });
    }

    let center = polygon::centroid(outline).ok_or(BlobRejection::Degenerate {
        points: outline.len(),
    })?;

    Ok(RawCandidate {
        center: Point2::new(center.x as f32, center.y as f32),
        size: bbox.width.max(bbox.height) as f32,
        method,
        bbox,
        area,
        fill_ratio: fill,
        corner_count: corners,
    })
}

/// Trace dark-blob outlines in `mask` and keep the square-ish ones.
pub fn extract_candidates(
    mask: &BinaryMask,
    method: BinarizationMethod,
    params: &ExtractParams,
) -> (Vec<RawCandidate>, ExtractionReport) {
    // Border following treats non-zero pixels as foreground.
    let fg = image::GrayImage::from_fn(mask.width as u32, mask.height as u32, |x, y| {
        image::Luma([if mask.is_dark(x as usize, y as usize) { 255 } else { 0 }])
    });

    let contours = find_contours::<i32>(&fg);
    let mut report = ExtractionReport {
        method,
        outlines: 0,
        accepted: 0,
        rejections: Vec::new(),
    };
    let mut out = Vec::new();

    for contour in contours {
        if contour.border_type == BorderType::Hole && !params.include_holes {
            continue;
        }
        report.outlines += 1;
        let outline: Vec<Point2<f64>> = contour
            .points
            .iter()
            .map(|p| Point2::new(p.x as f64, p.y as f64))
            .collect();
        match filter_outline(&outline, method, params) {
            Ok(c) => {
                log::trace!(
                    "{method}: blob at ({:.1}, {:.1}) size {} corners {}",
                    c.center.x,
                    c.center.y,
                    c.size,
                    c.corner_count
                );
                out.push(c);
            }
            Err(reason) => report.rejections.push(reason),
        }
    }

    report.accepted = out.len();
    log::debug!(
        "{method}: {} outlines, {} square-ish blobs",
        report.outlines,
        report.accepted
    );
    (out, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_rect(w: usize, h: usize, x0: usize, y0: usize, rw: usize, rh: usize) -> BinaryMask {
        let mut mask = BinaryMask::new(w, h);
        for y in y0..y0 + rh {
            for x in x0..x0 + rw {
                mask.dark[y * w + x] = true;
            }
        }
        mask
    }

    #[test]
    fn square_blob_is_kept_with_exact_center() {
        let mask = mask_with_rect(80, 80, 20, 30, 25, 25);
        let (cands, report) =
            extract_candidates(&mask, BinarizationMethod::FixedMid, &ExtractParams::default());
        assert_eq!(report.accepted, 1);
        let c = &cands[0];
        assert_eq!(c.size, 25.0);
        assert_eq!(c.corner_count, 4);
        assert!((c.center.x - 32.0).abs() < 1e-4);
        assert!((c.center.y - 42.0).abs() < 1e-4);
    }

    #[test]
    fn tiny_and_elongated_blobs_are_rejected() {
        let tiny = mask_with_rect(40, 40, 10, 10, 4, 4);
        let (cands, report) =
            extract_candidates(&tiny, BinarizationMethod::Otsu, &ExtractParams::default());
        assert!(cands.is_empty());
        assert!(matches!(report.rejections[0], BlobRejection::Area { .. }));

        let bar = mask_with_rect(120, 40, 10, 10, 90, 12);
        let (cands, report) =
            extract_candidates(&bar, BinarizationMethod::Otsu, &ExtractParams::default());
        assert!(cands.is_empty());
        assert!(matches!(report.rejections[0], BlobRejection::Aspect { .. }));
    }

    #[test]
    fn sparse_outline_fails_fill_ratio() {
        // Thin diagonal "L" spanning a wide bbox.
        let outline: Vec<Point2<f64>> = vec![
            Point2::new(0.0, 0.0),
            Point2::new(40.0, 0.0),
            Point2::new(40.0, 2.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 40.0),
            Point2::new(0.0, 40.0),
        ];
        let err = filter_outline(&outline, BinarizationMethod::Otsu, &ExtractParams::default())
            .unwrap_err();
        assert!(matches!(err, BlobRejection::Fill { .. }), "{err}");
    }
}
