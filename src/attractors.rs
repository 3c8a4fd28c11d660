//! C7: attractor post-processing — bends a previously uniformized layout
//! towards the peaks of a Gaussian-mixture density field.

use crate::geometry::Pos;
use crate::point::Point;
use crate::workspace::AttractorWorkspace;

/// One rotated 2D Gaussian lobe of the attractor mixture: mean `(mx, my)`,
/// standard deviations `(sigma_x, sigma_y)` along its own axes, and a
/// rotation `theta` (radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianAttractor {
    pub mx: f64,
    pub my: f64,
    pub sigma_x: f64,
    pub sigma_y: f64,
    pub theta: f64,
}

impl GaussianAttractor {
    fn eval(&self, x: f64, y: f64) -> f64 {
        let (s, c) = self.theta.sin_cos();
        let a = c * c / (2.0 * self.sigma_x * self.sigma_x) + s * s / (2.0 * self.sigma_y * self.sigma_y);
        let b = -s * (2.0 * self.theta).sin() / (4.0 * self.sigma_x * self.sigma_x)
            + (2.0 * self.theta).sin() / (4.0 * self.sigma_y * self.sigma_y);
        let cc = s * s / (2.0 * self.sigma_x * self.sigma_x) + c * c / (2.0 * self.sigma_y * self.sigma_y);
        let dx = x - self.mx;
        let dy = y - self.my;
        (-a * dx * dx - 2.0 * b * dx * dy - cc * dy * dy).exp()
    }
}

/// Builds the `n_grid x n_grid` density grid (spec §4.7 steps 3-6): sums the
/// (self-maximum-normalized) Gaussian lobes, rescales the sum to `[0,
/// l0_uni]`, and computes its gradient by central differences.
///
/// Grid point `(ix, iy)` sits at normalized coordinate
/// `(ix / (n_grid - 1), iy / (n_grid - 1))`; `density`/`grad_x`/`grad_y` are
/// stored flat in row-major `[iy * n_grid + ix]` order.
pub(crate) fn build_density_grid(
    n_grid: usize,
    gaussians: &[GaussianAttractor],
    l0_uni: f64,
    ws: &mut AttractorWorkspace,
) {
    ws.ensure_grid(n_grid);
    let step = 1.0 / (n_grid - 1) as f64;

    for iy in 0..n_grid {
        let y = iy as f64 * step;
        for ix in 0..n_grid {
            let x = ix as f64 * step;
            let mut sum = 0.0;
            for g in gaussians {
                // Normalize each lobe to its own maximum (attained at its
                // mean) before summing, per spec §4.7 step 4.
                let peak = g.eval(g.mx, g.my).max(f64::EPSILON);
                sum += g.eval(x, y) / peak;
            }
            ws.density[iy * n_grid + ix] = sum;
        }
    }

    let (min, max) = ws
        .density
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(mn, mx), &v| {
            (mn.min(v), mx.max(v))
        });
    let span = (max - min).max(f64::EPSILON);
    for v in ws.density.iter_mut() {
        *v = l0_uni * (*v - min) / span;
    }

    gradient(n_grid, &ws.density.clone(), &mut ws.grad_x, &mut ws.grad_y, step);
}

/// Central-difference gradient, forward/backward at the borders.
fn gradient(n_grid: usize, density: &[f64], grad_x: &mut [f64], grad_y: &mut [f64], step: f64) {
    let at = |iy: usize, ix: usize| density[iy * n_grid + ix];
    for iy in 0..n_grid {
        for ix in 0..n_grid {
            let gx = if ix == 0 {
                (at(iy, 1) - at(iy, 0)) / step
            } else if ix == n_grid - 1 {
                (at(iy, ix) - at(iy, ix - 1)) / step
            } else {
                (at(iy, ix + 1) - at(iy, ix - 1)) / (2.0 * step)
            };
            let gy = if iy == 0 {
                (at(1, ix) - at(0, ix)) / step
            } else if iy == n_grid - 1 {
                (at(iy, ix) - at(iy - 1, ix)) / step
            } else {
                (at(iy + 1, ix) - at(iy - 1, ix)) / (2.0 * step)
            };
            grad_x[iy * n_grid + ix] = gx;
            grad_y[iy * n_grid + ix] = gy;
        }
    }
}

/// Bilinearly interpolates `field` (a flat `n_grid x n_grid` grid over
/// `[0,1]^2`) at `(x, y)`, clamping out-of-range coordinates to the grid
/// border instead of producing `NaN`.
fn bilinear(field: &[f64], n_grid: usize, x: f64, y: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    let y = y.clamp(0.0, 1.0);
    let scale = (n_grid - 1) as f64;
    let fx = x * scale;
    let fy = y * scale;
    let ix0 = (fx.floor() as usize).min(n_grid - 2);
    let iy0 = (fy.floor() as usize).min(n_grid - 2);
    let tx = fx - ix0 as f64;
    let ty = fy - iy0 as f64;
    let at = |iy: usize, ix: usize| field[iy * n_grid + ix];
    let v00 = at(iy0, ix0);
    let v10 = at(iy0, ix0 + 1);
    let v01 = at(iy0 + 1, ix0);
    let v11 = at(iy0 + 1, ix0 + 1);
    let top = v00 * (1.0 - tx) + v10 * tx;
    let bottom = v01 * (1.0 - tx) + v11 * tx;
    top * (1.0 - ty) + bottom * ty
}

/// Displaces every point of `points` (assumed already restored to its `uni`
/// snapshot) towards the density peaks of `gaussians` by straight gradient
/// ascent on the density field. See DESIGN.md for why this isn't a
/// component swap despite appearances in some reference material.
pub(crate) fn apply_displacement(points: &mut [Point], n_grid: usize, ws: &AttractorWorkspace) {
    // ε is a single guard shared by every point — the maximum gradient
    // magnitude over the whole point set, scaled down — matching the
    // original's `grad_norm.max() / 1000` (a reduction over the batch, not a
    // per-point term).
    let per_point: Vec<(f64, f64, f64, f64)> = points
        .iter()
        .map(|p| {
            let (x, y) = (p.cur.x, p.cur.y);
            let density = bilinear(&ws.density, n_grid, x, y);
            let gx = bilinear(&ws.grad_x, n_grid, x, y);
            let gy = bilinear(&ws.grad_y, n_grid, x, y);
            let mag = (gx * gx + gy * gy).sqrt();
            (density, gx, gy, mag)
        })
        .collect();
    let max_mag = per_point.iter().fold(0.0_f64, |acc, &(_, _, _, mag)| acc.max(mag));
    let eps = max_mag / 1000.0;

    for (p, &(density, gx, gy, mag)) in points.iter_mut().zip(per_point.iter()) {
        let denom = (mag + eps).max(f64::EPSILON);
        let dx = density * gx / denom;
        let dy = density * gy / denom;
        p.schedule_move_to(Pos::new(p.cur.x + dx, p.cur.y + dy));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_lobe_peaks_at_its_mean() {
        let mut ws = AttractorWorkspace::default();
        let gaussians = vec![GaussianAttractor {
            mx: 0.5,
            my: 0.5,
            sigma_x: 0.1,
            sigma_y: 0.1,
            theta: 0.0,
        }];
        build_density_grid(21, &gaussians, 1.0, &mut ws);
        let center = bilinear(&ws.density, 21, 0.5, 0.5);
        let corner = bilinear(&ws.density, 21, 0.0, 0.0);
        assert!(center > corner);
    }

    #[test]
    fn density_is_rescaled_into_l0_uni() {
        let mut ws = AttractorWorkspace::default();
        let gaussians = vec![GaussianAttractor {
            mx: 0.5,
            my: 0.5,
            sigma_x: 0.1,
            sigma_y: 0.1,
            theta: 0.0,
        }];
        build_density_grid(21, &gaussians, 0.05, &mut ws);
        let max = ws.density.iter().cloned().fold(f64::MIN, f64::max);
        let min = ws.density.iter().cloned().fold(f64::MAX, f64::min);
        assert!((max - 0.05).abs() < 1e-9);
        assert!(min.abs() < 1e-9);
    }
}
