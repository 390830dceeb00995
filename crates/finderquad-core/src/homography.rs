//! Planar homographies and perspective warping.

use crate::{sample_bilinear_u8, GrayImage, GrayImageView};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// 3x3 projective map acting on homogeneous image points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    /// Map the axis-aligned square `[0, side]^2` onto `quad` (TL, TR, BR, BL).
    pub fn square_to_quad(side: f32, quad: &[Point2<f32>; 4]) -> Option<Self> {
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ];
        homography_from_4pt(&square, quad)
    }
}

/// Translate the four points to their centroid and scale them so the mean
/// distance from it is sqrt(2). Returns the normalized points and the
/// conditioning transform.
fn condition4(pts: &[Point2<f32>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let (sx, sy) = pts
        .iter()
        .fold((0.0_f64, 0.0_f64), |(ax, ay), p| (ax + p.x as f64, ay + p.y as f64));
    let (cx, cy) = (sx / 4.0, sy / 4.0);

    let mean_dist = pts
        .iter()
        .map(|p| (p.x as f64 - cx).hypot(p.y as f64 - cy))
        .sum::<f64>()
        / 4.0;
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let out = pts.map(|p| {
        let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
        Point2::new(v[0], v[1])
    });
    (out, t)
}

/// Compute H such that `dst ~ H * src` from exactly four correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// for degenerate (collinear or repeated) configurations.
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    // Unknowns [h11 h12 h13 h21 h22 h23 h31 h32] with h33 = 1.
    let (src_n, t_src) = condition4(src);
    let (dst_n, t_dst) = condition4(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for (k, (s, d)) in src_n.iter().zip(dst_n.iter()).enumerate() {
        let (x, y, u, v) = (s.x, s.y, d.x, d.y);

        let r = 2 * k;
        a[(r, 0)] = x;
        a[(r, 1)] = y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -u * x;
        a[(r, 7)] = -u * y;
        b[r] = u;

        a[(r + 1, 3)] = x;
        a[(r + 1, 4)] = y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -v * x;
        a[(r + 1, 7)] = -v * y;
        b[r + 1] = v;
    }

    let x = a.lu().solve(&b)?;
    let hn = Matrix3::new(x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7], 1.0);

    // H = T_dst^-1 * Hn * T_src, rescaled so h33 = 1
    let h = t_dst.try_inverse()? * hn * t_src;
    let scale = h[(2, 2)];
    if scale.abs() < 1e-12 || !h.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(Homography::new(h / scale))
}

/// Warp into a rectified `out_w x out_h` image. Each output pixel centre is
/// mapped into the source through `h_img_from_rect` and sampled bilinearly.
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_img_from_rect: Homography,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    let mut data = Vec::with_capacity(out_w * out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            let pi = h_img_from_rect.apply(Point2::new(x as f32 + 0.5, y as f32 + 0.5));
            data.push(sample_bilinear_u8(src, pi.x - 0.5, pi.y - 0.5));
        }
    }

    GrayImage {
        width: out_w,
        height: out_h,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_close(a: Point2<f32>, b: Point2<f32>, tol: f32) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = tol);
        assert_abs_diff_eq!(a.y, b.y, epsilon = tol);
    }

    #[test]
    fn inverse_round_trips_points() {
        let h = Homography::new(Matrix3::new(
            1.1, 0.08, 7.0, //
            -0.04, 0.95, 2.0, //
            0.0008, 0.0003, 1.0,
        ));
        let inv = h.inverse().expect("invertible");

        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(40.0_f32, -15.0),
            Point2::new(300.0_f32, 210.0),
        ] {
            assert_close(inv.apply(h.apply(p)), p, 1e-3);
        }
    }

    #[test]
    fn four_points_recover_ground_truth() {
        let ground_truth = Homography::new(Matrix3::new(
            0.9, 0.04, 60.0, //
            -0.03, 1.05, 45.0, //
            0.0007, -0.0002, 1.0,
        ));
        let square = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(420.0, 0.0),
            Point2::new(420.0, 420.0),
            Point2::new(0.0, 420.0),
        ];
        let quad = square.map(|p| ground_truth.apply(p));

        let recovered = Homography::square_to_quad(420.0, &quad).expect("recoverable");
        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(105.0, 210.0),
            Point2::new(400.0, 12.0),
        ] {
            assert_close(recovered.apply(p), ground_truth.apply(p), 1e-2);
        }
    }

    #[test]
    fn collinear_points_are_rejected() {
        let src = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, 0.0),
        ];
        let dst = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(homography_from_4pt(&src, &dst).is_none());
    }

    #[test]
    fn identity_warp_reproduces_source() {
        let src = GrayImage {
            width: 4,
            height: 2,
            data: vec![0, 10, 20, 30, 40, 50, 60, 70],
        };
        let out = warp_perspective_gray(&src.view(), Homography::identity(), 4, 2);
        assert_eq!(out, src);
    }
}
