use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::quad::solve_fourth_corner;

/// Three finder-pattern centers labelled by the marker corner they sit on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerRoles {
    pub top_left: Point2<f32>,
    pub top_right: Point2<f32>,
    pub bottom_left: Point2<f32>,
    /// Input indices in `[top_left, top_right, bottom_left]` order.
    pub indices: [usize; 3],
}

impl CornerRoles {
    /// Parallelogram completion of the missing bottom-right corner.
    pub fn bottom_right(&self) -> Point2<f32> {
        solve_fourth_corner(self.top_left, self.top_right, self.bottom_left)
    }

    /// All four corners in `[TL, TR, BR, BL]` order.
    pub fn corners(&self) -> [Point2<f32>; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right(),
            self.bottom_left,
        ]
    }
}

/// Assign TL/TR/BL roles to exactly three points.
///
/// The rightmost point (largest x) is top-right; of the two leftmost the one
/// with the smaller y is top-left. Ties keep input order.
pub fn assign_corner_roles(points: &[Point2<f32>]) -> Option<CornerRoles> {
    let points: &[Point2<f32>; 3] = points.try_into().ok()?;
    Some(corner_roles(points))
}

/// [`assign_corner_roles`] for a fixed triple.
pub fn corner_roles(points: &[Point2<f32>; 3]) -> CornerRoles {
    let mut by_x = [0usize, 1, 2];
    by_x.sort_by(|&a, &b| points[a].x.total_cmp(&points[b].x));

    let top_right = by_x[2];
    let (top_left, bottom_left) = if points[by_x[1]].y < points[by_x[0]].y {
        (by_x[1], by_x[0])
    } else {
        (by_x[0], by_x[1])
    };

    CornerRoles {
        top_left: points[top_left],
        top_right: points[top_right],
        bottom_left: points[bottom_left],
        indices: [top_left, top_right, bottom_left],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_follow_x_then_y() {
        let pts = [
            Point2::new(50.0, 250.0),
            Point2::new(250.0, 50.0),
            Point2::new(50.0, 50.0),
        ];
        let roles = assign_corner_roles(&pts).expect("three points");
        assert_eq!(roles.top_left, Point2::new(50.0, 50.0));
        assert_eq!(roles.top_right, Point2::new(250.0, 50.0));
        assert_eq!(roles.bottom_left, Point2::new(50.0, 250.0));
        assert_eq!(roles.indices, [2, 1, 0]);
        assert_eq!(roles.bottom_right(), Point2::new(250.0, 250.0));
    }

    #[test]
    fn wrong_count_is_none() {
        let pts = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(assign_corner_roles(&pts).is_none());
        let four = [Point2::new(0.0, 0.0); 4];
        assert!(assign_corner_roles(&four).is_none());
    }
}
