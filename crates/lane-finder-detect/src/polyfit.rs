//! Least-squares quadratic `x = a·y² + b·y + c` through lane pixels.
//!
//! Lanes in a top-down view are close to vertical, so x is modelled as a
//! function of y. The normal equations are solved in centred and scaled y
//! (`t = (y - mean) / scale`, `t ∈ [-1, 1]`) and mapped back to pixel
//! coefficients; raw `y⁴` sums over 720 rows are poorly conditioned.

use nalgebra::{Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};

use crate::Lane;

/// Minimal number of distinct rows for a well-posed quadratic.
pub const MIN_DISTINCT_ROWS: usize = 3;

/// Coefficients of `x = a·y² + b·y + c` in pixel units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quadratic {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Quadratic {
    #[inline]
    pub fn eval(&self, y: f64) -> f64 {
        (self.a * y + self.b) * y + self.c
    }
}

/// Fitted curve for one lane, sampled once per row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneFit {
    pub curve: Quadratic,
    /// RMS horizontal residual over the lane pixels.
    pub rms_px: f64,
    /// First sampled row (top of the highest window with pixels).
    pub y_top: usize,
    /// Rows `y_top..height`, increasing.
    pub sample_y: Vec<f64>,
    /// `curve.eval(y)` for each entry of `sample_y`.
    pub sample_x: Vec<f64>,
}

impl LaneFit {
    /// Sampled x at integer row `y`, if `y` lies in the sampled range.
    pub fn x_at_row(&self, y: usize) -> Option<f64> {
        y.checked_sub(self.y_top)
            .and_then(|i| self.sample_x.get(i))
            .copied()
    }

    /// One past the last sampled row.
    pub fn y_end(&self) -> usize {
        self.y_top + self.sample_y.len()
    }
}

fn distinct_rows(points: &[Point2<f64>]) -> usize {
    let mut ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    ys.sort_unstable_by(f64::total_cmp);
    ys.dedup();
    ys.len()
}

/// Fit `x(y)` through `points` (`p.x` is x, `p.y` is y).
///
/// Returns `None` for fewer than three distinct y-values, or when the solve
/// does not produce finite coefficients.
pub fn fit_quadratic(points: &[Point2<f64>]) -> Option<(Quadratic, f64)> {
    if points.len() < MIN_DISTINCT_ROWS || distinct_rows(points) < MIN_DISTINCT_ROWS {
        return None;
    }

    let n = points.len() as f64;
    let mean = points.iter().map(|p| p.y).sum::<f64>() / n;
    let scale = points
        .iter()
        .map(|p| (p.y - mean).abs())
        .fold(0.0_f64, f64::max);
    if scale <= 0.0 || !scale.is_finite() {
        return None;
    }

    // Power sums s[k] = Σ tᵏ and moments m[k] = Σ x·tᵏ.
    let mut s = [0.0_f64; 5];
    let mut m = [0.0_f64; 3];
    for p in points {
        let t = (p.y - mean) / scale;
        let mut tk = 1.0;
        for (k, sk) in s.iter_mut().enumerate() {
            *sk += tk;
            if k < 3 {
                m[k] += p.x * tk;
            }
            tk *= t;
        }
    }

    let normal = Matrix3::new(
        s[4], s[3], s[2], //
        s[3], s[2], s[1], //
        s[2], s[1], s[0],
    );
    let rhs = Vector3::new(m[2], m[1], m[0]);
    let sol = normal.lu().solve(&rhs)?;
    let (alpha, beta, gamma) = (sol[0], sol[1], sol[2]);

    // x = α t² + β t + γ with t = (y - mean) / scale.
    let s2 = scale * scale;
    let curve = Quadratic {
        a: alpha / s2,
        b: beta / scale - 2.0 * alpha * mean / s2,
        c: alpha * mean * mean / s2 - beta * mean / scale + gamma,
    };
    if !(curve.a.is_finite() && curve.b.is_finite() && curve.c.is_finite()) {
        return None;
    }

    let sse: f64 = points.iter().map(|p| (p.x - curve.eval(p.y)).powi(2)).sum();
    Some((curve, (sse / n).sqrt()))
}

/// Fit a tracked lane and sample the curve from its top detected row down to
/// the bottom of a mask of `height` rows.
///
/// `None` means the fit is undefined for this lane (too few or degenerate
/// pixels).
pub fn fit_lane(lane: &Lane, height: usize) -> Option<LaneFit> {
    let y_top = lane.top_detected_row()?;
    let points: Vec<Point2<f64>> = lane
        .pixels
        .iter()
        .map(|p| Point2::new(p.x as f64, p.y as f64))
        .collect();
    let (curve, rms_px) = fit_quadratic(&points)?;

    let sample_y: Vec<f64> = (y_top..height).map(|y| y as f64).collect();
    let sample_x = sample_y.iter().map(|&y| curve.eval(y)).collect();
    Some(LaneFit {
        curve,
        rms_px,
        y_top,
        sample_y,
        sample_x,
    })
}
