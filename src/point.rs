//! C3: per-grain point state.
//!
//! Neighbor references are stored as plain `u32` indices into the owning
//! engine's point array rather than as borrowed/shared references — the
//! same "indices into a contiguous owned array" pattern used for the
//! scratch buffers in [`crate::workspace`].

use crate::geometry::{Bounds, Pos};
use nalgebra::Vector2;
use smallvec::SmallVec;

/// Neighbor lists are small in practice (Delaunay degree is usually under
/// 10); `SmallVec` avoids a heap allocation for the common case while still
/// growing for high-degree vertices.
pub type NeighborList = SmallVec<[u32; 8]>;

/// One grain: the per-point state the relaxation loop reads and mutates.
#[derive(Debug, Clone)]
pub struct Point {
    /// Original position, input frame. Immutable after construction.
    pub scaled_og: Pos,
    /// Original position, normalized frame. Immutable after construction.
    pub og: Pos,
    /// Live position, normalized frame.
    pub cur: Pos,
    /// Denormalized cache of `cur`, refreshed by [`Point::integrate`] and
    /// [`Point::restore_from_og`]/[`Point::restore_from_uni`]. Convenience
    /// for host consumers that want original-frame coordinates without
    /// going through [`crate::export`].
    pub scaled_cur: Pos,
    /// Position saved at the end of the last successful uniformization.
    pub uni: Pos,
    /// Position at the last retriangulation, used by [`Point::drift_since_last_tri`].
    pub prev: Pos,
    /// Accumulated displacement for the current step; zeroed on integration.
    push: Vector2<f64>,
    /// Delaunay neighbors, as indices into the owning engine's point array.
    /// Duplicate-free and symmetric by construction (see `Corpus`'s
    /// retriangulation step).
    pub neighbors: NeighborList,
    /// `cur + push` after force accumulation, `cur` after integration — the
    /// position polygon-containment predicates should observe.
    shape: Pos,
}

impl Point {
    /// Constructs a point from an input-frame position and the bounds used
    /// to normalize it.
    pub fn new(scaled_og: Pos, bounds: &Bounds) -> Point {
        let og = bounds.normalize(scaled_og);
        Point {
            scaled_og,
            og,
            cur: og,
            scaled_cur: scaled_og,
            uni: og,
            prev: og,
            push: Vector2::zeros(),
            neighbors: NeighborList::new(),
            shape: og,
        }
    }

    /// The position polygon predicates should use: `cur + push` mid-step,
    /// `cur` once integrated.
    pub fn shape(&self) -> Pos {
        self.shape
    }

    pub fn mid_to(&self, other: &Point) -> Pos {
        nalgebra::center(&self.cur, &other.cur)
    }

    pub fn dist_to(&self, other: &Point) -> f64 {
        nalgebra::distance(&self.cur, &other.cur)
    }

    /// Increments `self`'s push by `f` along the unit vector from `from` to
    /// `self`, and refreshes the shape cache to `cur + push`.
    ///
    /// Takes the source's position rather than a `&Point` so the relaxation
    /// loop can compute it once and then mutate the target without running
    /// into two overlapping borrows of the same point array.
    ///
    /// When `from` and `self` coincide, the direction defaults to `(1, 0)`
    /// (matching `atan2(0, 0) == 0`) rather than producing a `NaN` from
    /// normalizing a zero vector.
    pub fn accumulate_repulsion(&mut self, f: f64, from: Pos) {
        let delta = self.cur - from;
        let dir = if delta.norm_squared() > f64::EPSILON {
            delta.normalize()
        } else {
            Vector2::new(1.0, 0.0)
        };
        self.push += dir * f;
        self.shape = self.cur + self.push;
    }

    /// Sets `push` so that the next [`Point::integrate`] lands `cur` exactly
    /// on `target`.
    pub fn schedule_move_to(&mut self, target: Pos) {
        self.push = target - self.cur;
    }

    /// Magnitude of the currently scheduled move.
    pub fn pending_move_magnitude(&self) -> f64 {
        self.push.norm()
    }

    /// Applies `push` to `cur`, refreshes `scaled_cur`, zeros `push`, and
    /// resets the shape cache to the new `cur`.
    pub fn integrate(&mut self, bounds: &Bounds) {
        self.cur += self.push;
        self.push = Vector2::zeros();
        self.shape = self.cur;
        self.scaled_cur = bounds.denormalize(self.cur);
    }

    /// Directly overwrites `cur` (bypassing the push/integrate machinery) and
    /// refreshes the dependent caches. Used by pre-uniformization, which
    /// seeds an initial layout rather than relaxing towards one.
    pub fn set_cur(&mut self, p: Pos, bounds: &Bounds) {
        self.cur = p;
        self.shape = p;
        self.scaled_cur = bounds.denormalize(p);
    }

    /// Euclidean drift of `cur` from the position at the last retriangulation.
    pub fn drift_since_last_tri(&self) -> f64 {
        nalgebra::distance(&self.cur, &self.prev)
    }

    pub fn reset_neighbors(&mut self) {
        self.neighbors.clear();
    }

    /// Snapshots `cur` as the position to measure future drift against.
    pub fn snapshot_as_prev(&mut self) {
        self.prev = self.cur;
    }

    /// Snapshots `cur` as the uniformized position.
    pub fn snapshot_as_uni(&mut self) {
        self.uni = self.cur;
    }

    /// Restores `cur` (and dependent caches) from the original position.
    pub fn restore_from_og(&mut self, bounds: &Bounds) {
        self.cur = self.og;
        self.push = Vector2::zeros();
        self.shape = self.cur;
        self.scaled_cur = bounds.denormalize(self.cur);
    }

    /// Restores `cur` (and dependent caches) from the uniform snapshot.
    pub fn restore_from_uni(&mut self, bounds: &Bounds) {
        self.cur = self.uni;
        self.push = Vector2::zeros();
        self.shape = self.cur;
        self.scaled_cur = bounds.denormalize(self.cur);
    }
}
