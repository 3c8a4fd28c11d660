//!
//! Uniformization engine: takes a fixed set of 2D points and redistributes
//! them to fill an arbitrary polygonal region evenly, under a caller-supplied
//! density field, by relaxing a Delaunay-maintained repulsive spring network.
//! Entry point is the [`corpus::Corpus`] type.
//!

/// Re-export the version of nalgebra used by this crate's public API.
pub use nalgebra;

mod attractors;
mod corpus;
mod density;
mod error;
mod export;
mod geometry;
mod point;
mod preuniform;
mod relax;
mod triangulation;
pub(crate) mod workspace;

pub use attractors::GaussianAttractor;
pub use corpus::{Corpus, StopHandle};
pub use density::DensityField;
pub use error::EngineError;
pub use export::{ExportObserver, NoopObserver, Positions};
pub use geometry::{Bounds, Polygon, Pos};
pub use point::{NeighborList, Point};
pub use relax::{RelaxParams, RunStats};
