//! C4: the `Corpus` engine — owns all points, the active region, the density
//! field, and the rest length, and is the crate's public entry point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::attractors::{self, GaussianAttractor};
use crate::density::DensityField;
use crate::error::EngineError;
use crate::export::{ExportObserver, NoopObserver, Positions};
use crate::geometry::{Bounds, Pos, Polygon};
use crate::point::Point;
use crate::preuniform;
use crate::relax::{self, RelaxParams, RunStats};
use crate::workspace::{AttractorWorkspace, RelaxWorkspace};

/// A cooperative, cross-thread handle used to request cancellation of an
/// in-progress [`Corpus::distribute`] run (spec §5). Cheap to clone; every
/// clone shares the same underlying flag.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// The uniformization engine. Owns a fixed set of grains (one per input
/// row), redistributes them to fill a region evenly under a density field,
/// and can bend a previously uniformized layout towards attractor peaks.
///
/// `K` is the host's buffer identifier type; the engine only needs to
/// remember each buffer's length, in insertion order, so the host can later
/// slice the flat point array back into per-buffer runs.
pub struct Corpus<K> {
    buffers_md: Vec<(K, usize)>,
    /// Every input row, concatenated across buffers in insertion order.
    /// Retained (not just their two selected columns) so `set_cols` can
    /// reselect columns without re-ingesting.
    rows: Vec<Vec<f64>>,
    xcol: usize,
    ycol: usize,

    bounds: Bounds,
    points: Vec<Point>,
    region: Polygon,
    /// `(centroid, half_side)` of the inner box pre-uniformization spreads
    /// points into; cached by `set_region`.
    region_inbox: (Pos, f64),
    density: DensityField,
    l0_uni: f64,

    stop_flag: Arc<AtomicBool>,
    observer: Box<dyn ExportObserver>,
    relax_params: RelaxParams,
    relax_ws: RelaxWorkspace,
    attractor_ws: AttractorWorkspace,
}

impl<K: Clone> Corpus<K> {
    /// Builds a new engine from a buffer-id -> grain-rows mapping and the
    /// two column indices to use as (x, y). `buffers` is iterated in the
    /// order given, which becomes (and remains) the engine's stable point
    /// ordering.
    pub fn new<I>(buffers: I, xcol: usize, ycol: usize) -> Result<Corpus<K>, EngineError>
    where
        I: IntoIterator<Item = (K, Vec<Vec<f64>>)>,
    {
        let mut buffers_md = Vec::new();
        let mut rows = Vec::new();
        for (id, buffer) in buffers {
            buffers_md.push((id, buffer.len()));
            rows.extend(buffer);
        }
        let n_points = rows.len();

        let mut corpus = Corpus {
            buffers_md,
            rows,
            xcol,
            ycol,
            bounds: Bounds {
                xmin: 0.0,
                xmax: 1.0,
                ymin: 0.0,
                ymax: 1.0,
            },
            points: Vec::new(),
            region: Polygon::unit_square(),
            region_inbox: (Pos::new(0.5, 0.5), 1.0 / 3.0),
            density: DensityField::constant(),
            l0_uni: 0.0,
            stop_flag: Arc::new(AtomicBool::new(false)),
            observer: Box::new(NoopObserver),
            relax_params: RelaxParams::default(),
            relax_ws: RelaxWorkspace::with_capacity(n_points),
            attractor_ws: AttractorWorkspace::default(),
        };
        corpus.set_cols(xcol, ycol, true)?;
        Ok(corpus)
    }

    /// Per-buffer row counts, in insertion order — lets a host slice the
    /// flat point array back into its original per-buffer runs.
    pub fn buffer_lengths(&self) -> &[(K, usize)] {
        &self.buffers_md
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn l0_uni(&self) -> f64 {
        self.l0_uni
    }

    pub fn region(&self) -> &Polygon {
        &self.region
    }

    /// Installs a new export observer, replacing any previously set one.
    pub fn set_observer(&mut self, observer: impl ExportObserver + 'static) {
        self.observer = Box::new(observer);
    }

    /// A cloneable handle that can request cancellation of an in-progress
    /// `distribute` run from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop_flag.clone())
    }

    /// Requests cancellation of an in-progress `distribute` run.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Reselects the (x, y) columns used to build points from the ingested
    /// rows, rebuilding bounds and points. If `reset_region`, the region is
    /// also reset to the unit square; otherwise the existing (already
    /// normalized) region is kept and only `l0_uni` is recomputed against
    /// the new point count.
    pub fn set_cols(&mut self, xcol: usize, ycol: usize, reset_region: bool) -> Result<(), EngineError> {
        let scaled: Vec<Pos> = self
            .rows
            .iter()
            .map(|row| {
                let x = *row.get(xcol).ok_or_else(|| {
                    EngineError::InvalidConfiguration(format!("xcol {xcol} out of range"))
                })?;
                let y = *row.get(ycol).ok_or_else(|| {
                    EngineError::InvalidConfiguration(format!("ycol {ycol} out of range"))
                })?;
                Ok(Pos::new(x, y))
            })
            .collect::<Result<_, EngineError>>()?;

        let bounds = Bounds::from_points(&scaled).ok_or_else(|| {
            EngineError::InvalidConfiguration(
                "selected columns produce a degenerate bounding box".to_string(),
            )
        })?;

        self.xcol = xcol;
        self.ycol = ycol;
        self.bounds = bounds;
        self.points = scaled.iter().map(|&p| Point::new(p, &bounds)).collect();

        info!(
            "columns reselected (xcol={xcol}, ycol={ycol}): {} points, bounds={:?}",
            self.points.len(),
            self.bounds
        );

        if reset_region {
            self.set_region(Polygon::unit_square(), true)
        } else {
            self.recompute_l0_uni()
        }
    }

    /// Installs a new active region. If `is_normalized` is false, `region`
    /// is treated as being in the input (original) frame and is scaled by
    /// the current bounds before being stored.
    pub fn set_region(&mut self, region: Polygon, is_normalized: bool) -> Result<(), EngineError> {
        let normalized = if is_normalized {
            region
        } else {
            region.scaled_by(&self.bounds)
        };
        if normalized.area() <= 0.0 {
            return Err(EngineError::InvalidConfiguration(
                "region has non-positive area".to_string(),
            ));
        }
        let center = normalized.centroid();
        let half_side = normalized.area().sqrt() / 3.0;
        self.region = normalized;
        self.region_inbox = (center, half_side);
        info!("region replaced: area={}", self.region.area());
        self.recompute_l0_uni()
    }

    /// Installs a new density field.
    pub fn set_density(&mut self, density: DensityField) {
        self.density = density;
        info!("density field replaced");
    }

    fn recompute_l0_uni(&mut self) -> Result<(), EngineError> {
        let n = self.points.len();
        if n == 0 {
            self.l0_uni = 0.0;
            return Ok(());
        }
        let area = self.region.area();
        if area <= 0.0 {
            return Err(EngineError::InvalidConfiguration(
                "region area must be positive".to_string(),
            ));
        }
        self.l0_uni = (2.0 / (3f64.sqrt() * n as f64 / area)).sqrt();
        Ok(())
    }

    /// Runs the relaxation loop to a local equilibrium (spec §4.6).
    ///
    /// `export_period`: if nonzero, `export(0.0)` is invoked every
    /// `export_period` steps. `stop_tol`: overrides the default convergence
    /// tolerance for this run only.
    ///
    /// Returns `RunStats { steps, .. }` with a *negative* step count if the
    /// run was cancelled via [`Corpus::stop`]/[`StopHandle::request_stop`]
    /// before converging.
    pub fn distribute(
        &mut self,
        export_period: u64,
        stop_tol: Option<f64>,
    ) -> Result<RunStats, EngineError> {
        if self.points.len() < 3 {
            return Err(EngineError::InvalidConfiguration(
                "at least 3 points are required to relax".to_string(),
            ));
        }

        let mut params = self.relax_params.clone();
        if let Some(tol) = stop_tol {
            params.stop_tol = tol;
        }

        debug!(
            "distribute: n={}, region_area={}, l0_uni={}",
            self.points.len(),
            self.region.area(),
            self.l0_uni
        );

        self.stop_flag.store(false, Ordering::SeqCst);
        for p in self.points.iter_mut() {
            p.restore_from_og(&self.bounds);
        }
        preuniform::preuniformize(
            &mut self.points,
            self.region_inbox.0,
            self.region_inbox.1,
            &self.bounds,
        );

        let mut needs_retri = true;
        let mut tot_count: i64 = 0;
        let mut tri_count: u64 = 0;

        loop {
            if needs_retri {
                relax::retriangulate(&mut self.points, &mut self.relax_ws)?;
                tri_count += 1;
                needs_retri = false;
            }

            let h_scale = relax::compute_h_scale(&self.points, &self.density, self.l0_uni);
            relax::accumulate_forces(&mut self.points, &self.density, h_scale, &params);

            let (converged, retri_needed) = relax::integrate_and_project(
                &mut self.points,
                &self.region,
                &self.bounds,
                self.l0_uni,
                params.tri_tol,
                params.stop_tol,
            );
            needs_retri = retri_needed;
            tot_count += 1;

            if export_period != 0 && (tot_count as u64) % export_period == 0 {
                self.export(0.0);
            }

            if self.stop_flag.load(Ordering::SeqCst) {
                warn!("distribute cancelled after {tot_count} steps ({tri_count} triangulations)");
                return Ok(RunStats {
                    steps: -tot_count,
                    triangulations: tri_count,
                });
            }

            if converged {
                break;
            }
        }

        for p in self.points.iter_mut() {
            p.reset_neighbors();
            p.snapshot_as_uni();
        }

        Ok(RunStats {
            steps: tot_count,
            triangulations: tri_count,
        })
    }

    /// Displaces the cached uniform layout towards the peaks of a Gaussian
    /// mixture (spec §4.7). If `reset`, restores `cur` from the `uni`
    /// snapshot, exports, and returns without computing any displacement.
    pub fn simple_attractors(&mut self, gaussians: &[GaussianAttractor], reset: bool) {
        for p in self.points.iter_mut() {
            p.restore_from_uni(&self.bounds);
        }
        if reset {
            self.export(0.0);
            return;
        }

        let n_grid = 2 * (self.points.len() as f64).sqrt().ceil() as usize;
        attractors::build_density_grid(n_grid, gaussians, self.l0_uni, &mut self.attractor_ws);
        attractors::apply_displacement(&mut self.points, n_grid, &self.attractor_ws);
        for p in self.points.iter_mut() {
            p.integrate(&self.bounds);
        }
        self.export(0.0);
    }

    /// Invokes the export observer with every point's position in the
    /// original frame, blended between the live position and the original
    /// input position by `interp` (`0` = fully relaxed, `1` = fully
    /// original).
    pub fn export(&mut self, interp: f64) {
        let positions = self
            .points
            .iter()
            .map(|p| {
                let blended = p.cur * (1.0 - interp) + p.og.coords * interp;
                self.bounds.denormalize(blended)
            })
            .collect();
        self.observer.export(&Positions { interp, positions });
    }
}
