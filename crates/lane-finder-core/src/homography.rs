use crate::{sample_bilinear_rgb, RgbImage, RgbImageView};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// Planar projective map `p' ~ H · p`.
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

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_fn(|r, c| rows[r][c]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        let mut out = [[0.0; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.h[(r, c)];
            }
        }
        out
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
}

/// Hartley conditioning: centroid to origin, mean distance to sqrt(2).
fn conditioning_transform(pts: &[Point2<f32>; 4]) -> Matrix3<f64> {
    let (mut cx, mut cy) = (0.0_f64, 0.0_f64);
    for p in pts {
        cx += p.x as f64;
        cy += p.y as f64;
    }
    cx /= 4.0;
    cy /= 4.0;

    let mean_dist = pts
        .iter()
        .map(|p| ((p.x as f64 - cx).powi(2) + (p.y as f64 - cy).powi(2)).sqrt())
        .sum::<f64>()
        / 4.0;
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn condition(pts: &[Point2<f32>; 4], t: &Matrix3<f64>) -> [Point2<f64>; 4] {
    pts.map(|p| {
        let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
        Point2::new(v[0], v[1])
    })
}

/// True when some three of the four points are (nearly) collinear.
fn has_collinear_triple(pts: &[Point2<f64>; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[i, j, k]| {
        let (a, b, c) = (pts[i], pts[j], pts[k]);
        let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        cross.abs() < 1e-9
    })
}

/// Exact homography with `dst[k] ~ H · src[k]` from four correspondences.
///
/// Returns `None` when the points are degenerate (three collinear, repeated).
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    // Unknowns h11..h32 with h33 = 1; two rows per correspondence (x,y)->(u,v):
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let t_src = conditioning_transform(src);
    let t_dst = conditioning_transform(dst);
    let src_n = condition(src, &t_src);
    let dst_n = condition(dst, &t_dst);
    if has_collinear_triple(&src_n) || has_collinear_triple(&dst_n) {
        return None;
    }

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = r0 + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    let hn = Matrix3::new(x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7], 1.0);

    let h = t_dst.try_inverse()? * hn * t_src;
    let scale = h[(2, 2)];
    if scale.abs() < 1e-12 || !h.iter().all(|v| v.is_finite()) {
        return None;
    }
    Some(Homography::new(h / scale))
}

/// Backward warp: every output pixel `(x, y)` samples `src` at `h_src_from_out · (x, y)`.
///
/// Samples falling outside `src` are black.
pub fn warp_perspective_rgb(
    src: &RgbImageView<'_>,
    h_src_from_out: &Homography,
    out_w: usize,
    out_h: usize,
) -> RgbImage {
    let mut out = RgbImage::new(out_w, out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            let ps = h_src_from_out.apply(Point2::new(x as f32, y as f32));
            if !ps.x.is_finite() || !ps.y.is_finite() {
                continue;
            }
            out.put(x, y, sample_bilinear_rgb(src, ps.x, ps.y));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f32>, b: Point2<f32>, tol: f32) {
        assert!(
            (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol,
            "expected ({:.4},{:.4}) ~ ({:.4},{:.4}) within {}",
            a.x,
            a.y,
            b.x,
            b.y,
            tol
        );
    }

    #[test]
    fn four_points_recover_road_trapezoid_map() {
        // Typical bird's-eye source trapezoid onto a 1280x720 rectangle.
        let src = [
            Point2::new(580.0_f32, 460.0),
            Point2::new(700.0, 460.0),
            Point2::new(1100.0, 720.0),
            Point2::new(180.0, 720.0),
        ];
        let dst = [
            Point2::new(300.0_f32, 0.0),
            Point2::new(980.0, 0.0),
            Point2::new(980.0, 720.0),
            Point2::new(300.0, 720.0),
        ];
        let h = homography_from_4pt(&src, &dst).expect("well-posed");
        for k in 0..4 {
            assert_close(h.apply(src[k]), dst[k], 1e-2);
        }
        let inv = h.inverse().expect("invertible");
        assert_close(inv.apply(dst[2]), src[2], 1e-2);
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
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(homography_from_4pt(&src, &dst).is_none());
    }

    #[test]
    fn identity_warp_copies_pixels() {
        let mut img = RgbImage::new(4, 3);
        img.put(2, 1, [9, 8, 7]);
        let out = warp_perspective_rgb(&img.view(), &Homography::identity(), 4, 3);
        assert_eq!(out, img);
    }

    #[test]
    fn array_round_trip() {
        let rows = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 1.0]];
        assert_eq!(Homography::from_array(rows).to_array(), rows);
    }
}
