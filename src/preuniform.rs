//! C5: pre-uniformization — a deterministic initial spread inside an
//! axis-aligned square centered on the region, so that the first Delaunay
//! triangulation is well conditioned and relaxation starts close to
//! equilibrium.

use crate::geometry::{Bounds, Pos};
use crate::point::Point;

/// Spreads `points` (already restored to their original positions) into a
/// square of half-side `half_side` centered at `center`.
///
/// Sorts a *copy* of the index order by `x`, assigning evenly spaced `x`
/// coordinates, then repeats for `y` — the two passes are independent, so
/// the final layout is grid-like but data-aware (points keep their relative
/// rank along each axis).
pub fn preuniformize(points: &mut [Point], center: Pos, half_side: f64, bounds: &Bounds) {
    let n = points.len();
    if n < 2 {
        return;
    }
    let (x1, x2) = (center.x - half_side, center.x + half_side);
    let (y1, y2) = (center.y - half_side, center.y + half_side);

    let mut by_x: Vec<usize> = (0..n).collect();
    by_x.sort_by(|&a, &b| points[a].cur.x.total_cmp(&points[b].cur.x));
    for (rank, &idx) in by_x.iter().enumerate() {
        let x = x1 + (rank as f64 / (n - 1) as f64) * (x2 - x1);
        let p = Pos::new(x, points[idx].cur.y);
        points[idx].set_cur(p, bounds);
    }

    let mut by_y: Vec<usize> = (0..n).collect();
    by_y.sort_by(|&a, &b| points[a].cur.y.total_cmp(&points[b].cur.y));
    for (rank, &idx) in by_y.iter().enumerate() {
        let y = y1 + (rank as f64 / (n - 1) as f64) * (y2 - y1);
        let p = Pos::new(points[idx].cur.x, y);
        points[idx].set_cur(p, bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bounds() -> Bounds {
        Bounds {
            xmin: 0.0,
            xmax: 1.0,
            ymin: 0.0,
            ymax: 1.0,
        }
    }

    #[test]
    fn spreads_points_across_the_target_square() {
        let bounds = unit_bounds();
        let mut pts: Vec<Point> = (0..9)
            .map(|i| Point::new(Pos::new(i as f64 / 8.0, i as f64 / 8.0), &bounds))
            .collect();
        preuniformize(&mut pts, Pos::new(0.5, 0.5), 1.0 / 3.0, &bounds);
        for p in &pts {
            assert!(p.cur.x >= 0.5 - 1.0 / 3.0 - 1e-9 && p.cur.x <= 0.5 + 1.0 / 3.0 + 1e-9);
            assert!(p.cur.y >= 0.5 - 1.0 / 3.0 - 1e-9 && p.cur.y <= 0.5 + 1.0 / 3.0 + 1e-9);
        }
        let mut xs: Vec<f64> = pts.iter().map(|p| p.cur.x).collect();
        xs.sort_by(|a, b| a.total_cmp(b));
        for w in xs.windows(2) {
            assert!(w[1] > w[0]);
        }
    }
}
