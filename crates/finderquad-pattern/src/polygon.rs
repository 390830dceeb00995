//! Closed-polygon measurements on traced blob outlines.
//!
//! Outlines are sequences of integer pixel positions as produced by border
//! following; the last point connects back to the first.

use nalgebra::Point2;

/// Signed shoelace area. Positive for counter-clockwise in y-up axes.
pub fn signed_area(pts: &[Point2<f64>]) -> f64 {
    if pts.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for (i, p) in pts.iter().enumerate() {
        let q = pts[(i + 1) % pts.len()];
        acc += p.x * q.y - q.x * p.y;
    }
    0.5 * acc
}

/// Area centroid of the polygon, `None` when the enclosed area vanishes.
pub fn centroid(pts: &[Point2<f64>]) -> Option<Point2<f64>> {
    let a = signed_area(pts);
    if a.abs() < 1e-9 {
        return None;
    }
    let (mut cx, mut cy) = (0.0, 0.0);
    for (i, p) in pts.iter().enumerate() {
        let q = pts[(i + 1) % pts.len()];
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    Some(Point2::new(cx / (6.0 * a), cy / (6.0 * a)))
}

/// Perimeter of the closed polygon.
pub fn perimeter(pts: &[Point2<f64>]) -> f64 {
    if pts.len() < 2 {
        return 0.0;
    }
    pts.iter()
        .enumerate()
        .map(|(i, p)| (pts[(i + 1) % pts.len()] - p).norm())
        .sum()
}

fn distance_to_line(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    let d = b - a;
    let len = d.norm();
    if len == 0.0 {
        return (p - a).norm();
    }
    (d.x * (a.y - p.y) - d.y * (a.x - p.x)).abs() / len
}

fn rdp_mark(pts: &[Point2<f64>], start: usize, end: usize, epsilon: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }
    let mut max_dist = 0.0;
    let mut max_idx = start;
    for i in start + 1..end {
        let d = distance_to_line(pts[i], pts[start], pts[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }
    if max_dist > epsilon {
        kept[max_idx] = true;
        rdp_mark(pts, start, max_idx, epsilon, kept);
        rdp_mark(pts, max_idx, end, epsilon, kept);
    }
}

/// Ramer-Douglas-Peucker simplification of a closed outline.
///
/// The ring is split at its first point and the point farthest from it;
/// both chains are simplified independently and rejoined.
pub fn simplify_closed(pts: &[Point2<f64>], epsilon: f64) -> Vec<Point2<f64>> {
    if pts.len() < 3 {
        return pts.to_vec();
    }
    let far = (1..pts.len())
        .max_by(|&i, &j| {
            let di = (pts[i] - pts[0]).norm_squared();
            let dj = (pts[j] - pts[0]).norm_squared();
            di.total_cmp(&dj)
        })
        .unwrap_or(0);
    if far == 0 {
        return vec![pts[0]];
    }

    // Closing the ring: walk from `far` back around to index 0.
    let mut ring: Vec<Point2<f64>> = pts.to_vec();
    ring.push(pts[0]);
    let last = ring.len() - 1;

    let mut kept = vec![false; ring.len()];
    kept[0] = true;
    kept[far] = true;
    rdp_mark(&ring, 0, far, epsilon, &mut kept);
    rdp_mark(&ring, far, last, epsilon, &mut kept);

    ring.iter()
        .take(last)
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// Count polygon vertices whose interior angle is below `max_angle_deg`.
///
/// Polygons with fewer than three vertices have no corners.
pub fn count_corners(poly: &[Point2<f64>], max_angle_deg: f64) -> usize {
    let n = poly.len();
    if n < 3 {
        return 0;
    }
    (0..n)
        .filter(|&i| {
            let prev = poly[(i + n - 1) % n];
            let cur = poly[i];
            let next = poly[(i + 1) % n];
            let v1 = prev - cur;
            let v2 = next - cur;
            let cos = v1.dot(&v2) / (v1.norm() * v2.norm() + 1e-6);
            cos.clamp(-1.0, 1.0).acos().to_degrees() < max_angle_deg
        })
        .count()
}
