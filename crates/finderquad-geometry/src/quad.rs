//! Fourth-corner reconstruction and quadrilateral validation.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, SideAxis};
use crate::roles::CornerRoles;

const EPS: f32 = 1e-6;

/// Acceptance limits for a marker quadrilateral.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadParams {
    /// Max relative difference between opposite sides (strict).
    pub side_tolerance: f32,
    /// Inclusive aspect-ratio (`width / height`) range.
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Inclusive coordinate range every corner must lie in.
    pub min_corner: f32,
    pub max_corner: f32,
    /// Additionally cap the range at the last pixel index when the image size
    /// is known.
    pub clamp_to_image: bool,
}

impl Default for QuadParams {
    fn default() -> Self {
        Self {
            side_tolerance: 0.3,
            min_aspect: 0.5,
            max_aspect: 2.0,
            min_corner: 0.0,
            max_corner: 2000.0,
            clamp_to_image: true,
        }
    }
}

impl QuadParams {
    fn range(&self, image_size: Option<(usize, usize)>) -> ([f32; 2], [f32; 2]) {
        let mut x = [self.min_corner, self.max_corner];
        let mut y = [self.min_corner, self.max_corner];
        if let (true, Some((w, h))) = (self.clamp_to_image, image_size) {
            x[1] = x[1].min(w.saturating_sub(1) as f32);
            y[1] = y[1].min(h.saturating_sub(1) as f32);
        }
        (x, y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuadSides {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

/// `bottom_right = top_right + bottom_left - top_left`.
#[inline]
pub fn solve_fourth_corner(
    top_left: Point2<f32>,
    top_right: Point2<f32>,
    bottom_left: Point2<f32>,
) -> Point2<f32> {
    top_right + (bottom_left - top_left)
}

/// A marker outline with its measurements and validation outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    /// `[TL, TR, BR, BL]`.
    pub corners: [Point2<f32>; 4],
    pub sides: QuadSides,
    /// `[TL-BR, TR-BL]`.
    pub diagonals: [f32; 2],
    /// Mean of top and bottom.
    pub width: f32,
    /// Mean of left and right.
    pub height: f32,
    pub aspect_ratio: f32,
    pub area: f32,
    /// `1 - |top - bottom| / max(top, bottom)`.
    pub side_consistency: f32,
    /// `1 - |left - right| / max(left, right)`.
    pub height_consistency: f32,
    /// True when the bottom-right corner was inferred rather than detected.
    pub reconstructed: bool,
    pub valid: bool,
    pub violations: Vec<GeometryError>,
}

fn consistency(a: f32, b: f32) -> f32 {
    let m = a.max(b);
    if m <= EPS {
        0.0
    } else {
        1.0 - (a - b).abs() / m
    }
}

fn shoelace(pts: &[Point2<f32>; 4]) -> f32 {
    let mut acc = 0.0f32;
    for i in 0..4 {
        let p = pts[i];
        let q = pts[(i + 1) % 4];
        acc += p.x * q.y - q.x * p.y;
    }
    acc.abs() * 0.5
}

impl Quadrilateral {
    /// Measure and validate four corners given in `[TL, TR, BR, BL]` order.
    pub fn from_corners(
        corners: [Point2<f32>; 4],
        params: &QuadParams,
        image_size: Option<(usize, usize)>,
        reconstructed: bool,
    ) -> Self {
        let [tl, tr, br, bl] = corners;
        let sides = QuadSides {
            top: (tr - tl).norm(),
            right: (br - tr).norm(),
            bottom: (br - bl).norm(),
            left: (bl - tl).norm(),
        };
        let width = 0.5 * (sides.top + sides.bottom);
        let height = 0.5 * (sides.left + sides.right);
        let aspect_ratio = if height > EPS { width / height } else { 0.0 };
        let area = shoelace(&corners);

        let mut quad = Self {
            corners,
            sides,
            diagonals: [(br - tl).norm(), (bl - tr).norm()],
            width,
            height,
            aspect_ratio,
            area,
            side_consistency: consistency(sides.top, sides.bottom),
            height_consistency: consistency(sides.left, sides.right),
            reconstructed,
            valid: false,
            violations: Vec::new(),
        };
        quad.violations = quad.check(params, image_size);
        quad.valid = quad.violations.is_empty();
        quad
    }

    /// Complete three role-assigned corners and validate the result.
    pub fn reconstruct(
        roles: &CornerRoles,
        params: &QuadParams,
        image_size: Option<(usize, usize)>,
    ) -> Self {
        Self::from_corners(roles.corners(), params, image_size, true)
    }

    pub fn top_left(&self) -> Point2<f32> {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point2<f32> {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point2<f32> {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point2<f32> {
        self.corners[3]
    }

    /// First violation, if any.
    pub fn validate(&self) -> Result<(), GeometryError> {
        match self.violations.first() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Whether every corner lies in the configured coordinate range.
    pub fn corners_in_range(&self, params: &QuadParams, image_size: Option<(usize, usize)>) -> bool {
        self.out_of_range(params, image_size).is_none()
    }

    fn out_of_range(
        &self,
        params: &QuadParams,
        image_size: Option<(usize, usize)>,
    ) -> Option<GeometryError> {
        let (rx, ry) = params.range(image_size);
        self.corners.iter().find_map(|p| {
            let inside = p.x >= rx[0] && p.x <= rx[1] && p.y >= ry[0] && p.y <= ry[1];
            (!inside).then(|| GeometryError::CornerOutOfRange {
                x: p.x,
                y: p.y,
                min: rx[0].min(ry[0]),
                max: rx[1].min(ry[1]),
            })
        })
    }

    fn check(&self, params: &QuadParams, image_size: Option<(usize, usize)>) -> Vec<GeometryError> {
        let mut out = Vec::new();

        let s = &self.sides;
        if self.area <= EPS || [s.top, s.right, s.bottom, s.left].iter().any(|&l| l <= EPS) {
            out.push(GeometryError::Collapsed);
        }

        if let Some(err) = self.out_of_range(params, image_size) {
            out.push(err);
        }

        if out.contains(&GeometryError::Collapsed) {
            return out;
        }

        for (axis, c) in [
            (SideAxis::Horizontal, self.side_consistency),
            (SideAxis::Vertical, self.height_consistency),
        ] {
            let deviation = 1.0 - c;
            if deviation >= params.side_tolerance {
                out.push(GeometryError::SideInconsistent {
                    axis,
                    deviation,
                    tolerance: params.side_tolerance,
                });
            }
        }

        if self.aspect_ratio < params.min_aspect || self.aspect_ratio > params.max_aspect {
            out.push(GeometryError::AspectOutOfRange {
                aspect: self.aspect_ratio,
                min: params.min_aspect,
                max: params.max_aspect,
            });
        }

        out
    }
}
