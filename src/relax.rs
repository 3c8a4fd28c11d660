//! C6: the main relaxation loop — repulsive force accumulation, integration,
//! boundary projection, retriangulation triggering, and the stop test.

use log::trace;

use crate::density::DensityField;
use crate::geometry::{Bounds, Polygon};
use crate::point::Point;
use crate::triangulation;
use crate::workspace::RelaxWorkspace;
use crate::EngineError;

/// Tunable constants of the relaxation loop, exposed as a struct (rather
/// than hardcoded) so tests can probe convergence behavior without
/// touching engine internals.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxParams {
    /// Integration time step.
    pub dt: f64,
    /// Fraction of `l0_uni` a point may drift before its neighborhood is
    /// considered stale and a retriangulation is triggered.
    pub tri_tol: f64,
    /// Internal pressure multiplier applied to the target rest length.
    pub int_pres: f64,
    /// Spring stiffness.
    pub k: f64,
    /// Convergence threshold: a step is "settled" once every point's pending
    /// move is below `stop_tol * l0_uni`.
    pub stop_tol: f64,
}

impl Default for RelaxParams {
    fn default() -> Self {
        RelaxParams {
            dt: 0.2,
            tri_tol: 0.1,
            int_pres: 1.2,
            k: 1.0,
            stop_tol: 0.001,
        }
    }
}

/// Outcome of a `distribute` run. A negative `steps` means the run was
/// cancelled via `stop()`, with `steps.abs()` steps completed before the
/// cancellation was observed (spec §4.6, §7 `Cancelled`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub steps: i64,
    pub triangulations: u64,
}

/// Rebuilds the neighbor graph from scratch via a fresh Delaunay
/// triangulation of the current point positions, and snapshots `prev <- cur`
/// for every point (spec §4.6 step 1).
pub(crate) fn retriangulate(
    points: &mut [Point],
    workspace: &mut RelaxWorkspace,
) -> Result<(), EngineError> {
    workspace.tri_points.clear();
    workspace.tri_points.extend(points.iter().map(|p| p.cur));

    let triangles = triangulation::triangulate(&workspace.tri_points)?;
    let tri_count = triangles.len();

    for p in points.iter_mut() {
        p.reset_neighbors();
        p.snapshot_as_prev();
    }

    for [a, b, c] in triangles {
        add_edge(points, a, b);
        add_edge(points, b, c);
        add_edge(points, a, c);
    }

    trace!(
        "retriangulated into {} triangles, {} edges",
        tri_count,
        points.iter().map(|p| p.neighbors.len()).sum::<usize>() / 2
    );

    Ok(())
}

fn add_edge(points: &mut [Point], a: u32, b: u32) {
    if !points[a as usize].neighbors.contains(&b) {
        points[a as usize].neighbors.push(b);
    }
    if !points[b as usize].neighbors.contains(&a) {
        points[b as usize].neighbors.push(a);
    }
}

/// Computes `hScale`: the rest length, adjusted so the spring network
/// budgets area to match the integral of `1/h^2` over every edge midpoint
/// (spec §4.6 step 2).
pub(crate) fn compute_h_scale(points: &[Point], density: &DensityField, l0_uni: f64) -> f64 {
    let mut target_area = 0.0;
    let mut n_pair: u64 = 0;
    for p in points {
        for &n_idx in &p.neighbors {
            let n = &points[n_idx as usize];
            let mid = p.mid_to(n);
            target_area += 1.0 / density.eval(mid.x, mid.y).powi(2);
            n_pair += 1;
        }
    }
    if n_pair == 0 || target_area <= 0.0 {
        return l0_uni;
    }
    l0_uni * (n_pair as f64 / target_area).sqrt()
}

/// Accumulates repulsive forces for every directed neighbor pair (spec §4.6
/// step 3). Only the target of each directed pair is pushed; since the
/// neighbor graph is symmetric, each undirected edge ends up pushing both of
/// its endpoints exactly once.
pub(crate) fn accumulate_forces(
    points: &mut [Point],
    density: &DensityField,
    h_scale: f64,
    params: &RelaxParams,
) {
    let n = points.len();
    for p_idx in 0..n {
        let neighbors = points[p_idx].neighbors.clone();
        let p_cur = points[p_idx].cur;
        for n_idx in neighbors {
            let n_idx = n_idx as usize;
            let (mid, d) = {
                let n_pt = &points[n_idx];
                (nalgebra::center(&p_cur, &n_pt.cur), nalgebra::distance(&p_cur, &n_pt.cur))
            };
            let f = params.k * (params.int_pres * h_scale / density.eval(mid.x, mid.y) - d);
            if f > 0.0 {
                points[n_idx].accumulate_repulsion(params.dt * f, p_cur);
            }
        }
    }
}

/// Integrates every point's pending move, projects escapees back onto the
/// region, and evaluates the convergence and retriangulation-needed tests
/// (spec §4.6 step 4). Returns `(converged, needs_retri)`.
pub(crate) fn integrate_and_project(
    points: &mut [Point],
    region: &Polygon,
    bounds: &Bounds,
    l0_uni: f64,
    tri_tol: f64,
    stop_tol: f64,
) -> (bool, bool) {
    let mut converged = true;
    let mut needs_retri = false;
    for p in points.iter_mut() {
        if region.contains(p.shape()) {
            if converged && p.pending_move_magnitude() / l0_uni > stop_tol {
                converged = false;
            }
        } else {
            let target = region.nearest_on_boundary(p.shape());
            p.schedule_move_to(target);
        }
        p.integrate(bounds);
        if !needs_retri && p.drift_since_last_tri() / l0_uni > tri_tol {
            needs_retri = true;
        }
    }
    (converged, needs_retri)
}
