//! Scratch buffers reused across calls into the engine, following the same
//! "workspace holds pre-allocated memory so hot loops don't reallocate"
//! pattern used elsewhere for surface reconstruction. The engine is
//! single-threaded, so unlike a thread-local pool there is exactly one
//! workspace per [`Corpus`].

use crate::geometry::Pos;

/// Memory reused between [`crate::corpus::Corpus::distribute`] calls.
#[derive(Debug, Default, Clone)]
pub(crate) struct RelaxWorkspace {
    /// Positions handed to the triangulator; refreshed every retriangulation
    /// instead of being freshly allocated.
    pub tri_points: Vec<Pos>,
}

impl RelaxWorkspace {
    pub fn with_capacity(capacity: usize) -> RelaxWorkspace {
        RelaxWorkspace {
            tri_points: Vec::with_capacity(capacity),
        }
    }
}

/// Memory reused between [`crate::corpus::Corpus::simple_attractors`] calls.
/// The grid resolution only depends on point count, so these buffers are
/// only reallocated when `n_grid` changes.
#[derive(Debug, Default, Clone)]
pub(crate) struct AttractorWorkspace {
    n_grid: usize,
    pub density: Vec<f64>,
    pub grad_x: Vec<f64>,
    pub grad_y: Vec<f64>,
}

impl AttractorWorkspace {
    /// Ensures the scratch buffers are sized for an `n_grid x n_grid` grid,
    /// zeroing them for reuse.
    pub fn ensure_grid(&mut self, n_grid: usize) {
        let len = n_grid * n_grid;
        if self.n_grid != n_grid {
            self.density = vec![0.0; len];
            self.grad_x = vec![0.0; len];
            self.grad_y = vec![0.0; len];
            self.n_grid = n_grid;
        } else {
            self.density.iter_mut().for_each(|v| *v = 0.0);
            self.grad_x.iter_mut().for_each(|v| *v = 0.0);
            self.grad_y.iter_mut().for_each(|v| *v = 0.0);
        }
    }
}
