//! Perspective rectification and logical grid sampling.

use finderquad_core::{
    otsu_threshold, warp_perspective_gray, BinaryMask, GrayImageView, Homography, LIGHT_LEVEL,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::search::order_clockwise;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Center-to-outline scale from finder-pattern centers to the outer edge of a
/// 21-module code. Calibration-specific; other layouts need their own value.
pub const FINDER_EXPANSION_RATIO: f32 = 15.8 / 11.8;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    pub cells_x: usize,
    pub cells_y: usize,
    /// Side of the rectified square, in pixels.
    pub side_px: usize,
    /// Scale the corners away from their centroid before warping.
    pub expansion_ratio: Option<f32>,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            cells_x: 21,
            cells_y: 21,
            side_px: 420,
            expansion_ratio: Some(FINDER_EXPANSION_RATIO),
        }
    }
}

/// Sampled `width x height` bit grid, row-major, `true` = dark.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub bits: Vec<bool>,
    /// Mean binarized intensity per cell (0 = all dark, 255 = all light).
    pub means: Vec<f32>,
    /// Otsu threshold chosen on the rectified image.
    pub threshold: u8,
    /// Corners actually warped, after expansion and ordering.
    pub corners: [Point2<f32>; 4],
}

impl Grid {
    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        (x < self.width && y < self.height).then(|| self.bits[y * self.width + x])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        self.bits.chunks(self.width.max(1))
    }

    pub fn dark_count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    fn cell(&self, row: usize, col: usize) -> BorderCell {
        let k = row * self.width + col;
        BorderCell {
            row,
            col,
            dark: self.bits[k],
            mean_intensity: self.means[k],
        }
    }

    /// Tag the outermost cells by position.
    ///
    /// Top and bottom rows include their corner cells; left and right columns
    /// exclude them. Corner cells are additionally listed once each.
    pub fn border_cells(&self) -> BorderCells {
        let (w, h) = (self.width, self.height);
        let mut out = BorderCells::default();
        if w == 0 || h == 0 {
            return out;
        }

        out.top = (0..w).map(|c| self.cell(0, c)).collect();
        out.bottom = (0..w).map(|c| self.cell(h - 1, c)).collect();
        let inner = 1..h.saturating_sub(1);
        out.left = inner.clone().map(|r| self.cell(r, 0)).collect();
        out.right = inner.map(|r| self.cell(r, w - 1)).collect();

        for (r, c) in [(0, 0), (0, w - 1), (h - 1, 0), (h - 1, w - 1)] {
            if !out.corners.iter().any(|k| k.row == r && k.col == c) {
                out.corners.push(self.cell(r, c));
            }
        }

        let pattern = |cells: &[BorderCell]| cells.iter().map(|c| c.dark).collect::<Vec<_>>();
        let sides = [&out.top, &out.bottom, &out.left, &out.right];
        out.summary = BorderSummary {
            top: pattern(&out.top),
            bottom: pattern(&out.bottom),
            left: pattern(&out.left),
            right: pattern(&out.right),
            corners: pattern(&out.corners),
            total: sides.iter().map(|s| s.len()).sum(),
            dark: sides.iter().flat_map(|s| s.iter()).filter(|c| c.dark).count(),
        };
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BorderCell {
    pub row: usize,
    pub col: usize,
    pub dark: bool,
    pub mean_intensity: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BorderSummary {
    pub top: Vec<bool>,
    pub bottom: Vec<bool>,
    pub left: Vec<bool>,
    pub right: Vec<bool>,
    pub corners: Vec<bool>,
    /// Cells over the four side lists (corners counted in top/bottom).
    pub total: usize,
    pub dark: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BorderCells {
    pub top: Vec<BorderCell>,
    pub bottom: Vec<BorderCell>,
    pub left: Vec<BorderCell>,
    pub right: Vec<BorderCell>,
    pub corners: Vec<BorderCell>,
    pub summary: BorderSummary,
}

/// Scale four corners away from their centroid by `ratio`.
pub fn expand_corners(corners: &[Point2<f32>; 4], ratio: f32) -> [Point2<f32>; 4] {
    let c = corners
        .iter()
        .fold(Point2::origin(), |acc: Point2<f32>, p| acc + p.coords / 4.0);
    corners.map(|p| c + (p - c) * ratio)
}

/// Rectify the quadrilateral spanned by `corners` and sample its cell grid.
///
/// Corners are continuous image coordinates (pixel `i` covers `[i, i + 1)`).
/// The rectified square is Otsu-binarized; a cell is light when its mean
/// binarized intensity exceeds 127.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img, corners, params), fields(cells = params.cells_x * params.cells_y))
)]
pub fn sample_grid(
    img: &GrayImageView<'_>,
    corners: &[Point2<f32>; 4],
    params: &GridParams,
) -> Result<Grid, GeometryError> {
    let side = params.side_px;
    let cell_w = side / params.cells_x.max(1);
    let cell_h = side / params.cells_y.max(1);
    if params.cells_x == 0 || params.cells_y == 0 || cell_w == 0 || cell_h == 0 {
        return Err(GeometryError::GridTooFine {
            cells_x: params.cells_x,
            cells_y: params.cells_y,
            side_px: side,
        });
    }

    let working = match params.expansion_ratio {
        Some(r) => expand_corners(corners, r),
        None => *corners,
    };
    let working = order_clockwise(&working);

    let h = Homography::square_to_quad(side as f32, &working).ok_or(GeometryError::Collapsed)?;
    let rectified = warp_perspective_gray(img, h, side, side);
    let threshold = otsu_threshold(&rectified.data);
    let mask = BinaryMask::from_threshold(&rectified.view(), threshold);

    let (w, hgt) = (params.cells_x, params.cells_y);
    let mut bits = Vec::with_capacity(w * hgt);
    let mut means = Vec::with_capacity(w * hgt);
    let n = (cell_w * cell_h) as f32;
    for row in 0..hgt {
        for col in 0..w {
            let mut light = 0usize;
            for y in row * cell_h..(row + 1) * cell_h {
                for x in col * cell_w..(col + 1) * cell_w {
                    if !mask.is_dark(x, y) {
                        light += 1;
                    }
                }
            }
            let mean = light as f32 * LIGHT_LEVEL as f32 / n;
            means.push(mean);
            bits.push(mean <= 127.0);
        }
    }

    log::debug!(
        "sampled {w}x{hgt} grid, otsu {threshold}, {} dark cells",
        bits.iter().filter(|&&b| b).count()
    );

    Ok(Grid {
        width: w,
        height: hgt,
        bits,
        means,
        threshold,
        corners: working,
    })
}

/// [`sample_grid`] followed by [`Grid::border_cells`].
pub fn extract_border_cells(
    img: &GrayImageView<'_>,
    corners: &[Point2<f32>; 4],
    params: &GridParams,
) -> Result<BorderCells, GeometryError> {
    Ok(sample_grid(img, corners, params)?.border_cells())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use finderquad_core::GrayImage;

    fn checkerboard(side: usize, cells: usize) -> GrayImage {
        let mut img = GrayImage::filled(side, side, 255);
        let cell = side / cells;
        for y in 0..side {
            for x in 0..side {
                if (x / cell + y / cell) % 2 == 0 {
                    img.set(x, y, 0);
                }
            }
        }
        img
    }

    fn square(side: f32) -> [Point2<f32>; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ]
    }

    #[test]
    fn identity_checkerboard_round_trips() {
        let img = checkerboard(40, 2);
        let params = GridParams {
            cells_x: 2,
            cells_y: 2,
            side_px: 40,
            expansion_ratio: None,
        };
        let grid = sample_grid(&img.view(), &square(40.0), &params).expect("grid");
        assert_eq!(grid.bits, vec![true, false, false, true]);
        assert_eq!(grid.get(1, 1), Some(true));
        assert_eq!(grid.get(2, 0), None);
    }

    #[test]
    fn upsampled_checkerboard_keeps_cell_values() {
        let img = checkerboard(84, 7);
        let params = GridParams {
            cells_x: 7,
            cells_y: 7,
            expansion_ratio: None,
            ..GridParams::default()
        };
        let grid = sample_grid(&img.view(), &square(84.0), &params).expect("grid");
        for (y, row) in grid.rows().enumerate() {
            for (x, &bit) in row.iter().enumerate() {
                assert_eq!(bit, (x + y) % 2 == 0, "cell ({x}, {y})");
            }
        }
        assert_eq!(grid.dark_count(), 25);
    }

    #[test]
    fn expansion_scales_about_centroid() {
        let c = expand_corners(&square(10.0), 2.0);
        assert_abs_diff_eq!(c[0].x, -5.0);
        assert_abs_diff_eq!(c[2].y, 15.0);
    }

    #[test]
    fn border_cells_split_sides_and_corners() {
        let img = checkerboard(60, 3);
        let params = GridParams {
            cells_x: 3,
            cells_y: 3,
            side_px: 60,
            expansion_ratio: None,
        };
        let border = extract_border_cells(&img.view(), &square(60.0), &params).expect("grid");
        assert_eq!(border.top.len(), 3);
        assert_eq!(border.bottom.len(), 3);
        assert_eq!(border.left.len(), 1);
        assert_eq!(border.right.len(), 1);
        assert_eq!(border.corners.len(), 4);
        assert_eq!(border.summary.top, vec![true, false, true]);
        assert_eq!(border.summary.left, vec![false]);
        assert_eq!(border.summary.corners, vec![true; 4]);
        assert_eq!(border.summary.total, 8);
        assert_eq!(border.summary.dark, 4);
    }

    #[test]
    fn too_many_cells_for_the_square() {
        let img = checkerboard(40, 2);
        let params = GridParams {
            cells_x: 50,
            side_px: 40,
            ..GridParams::default()
        };
        assert!(matches!(
            sample_grid(&img.view(), &square(40.0), &params),
            Err(GeometryError::GridTooFine { .. })
        ));
    }
}
