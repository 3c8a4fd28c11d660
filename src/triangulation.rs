//! C2: 2D Delaunay triangulation of a point set.
//!
//! This is a thin wrapper around the `spade` crate's incremental Delaunay
//! triangulation — the engine has no business implementing its own geometric
//! predicates when a well-tested crate already does.

use crate::error::EngineError;
use crate::geometry::Pos;
use spade::{DelaunayTriangulation, InsertionError, Point2 as SpadePoint, Triangulation};

/// One triangle of a triangulation, as indices into the input point slice.
pub type TriangleIndices = [u32; 3];

/// Computes a Delaunay triangulation of `points`.
///
/// Fails with [`EngineError::DegenerateInput`] if the points are collinear or
/// otherwise admit no non-degenerate triangle (including the case of fewer
/// than 3 distinct points).
pub fn triangulate(points: &[Pos]) -> Result<Vec<TriangleIndices>, EngineError> {
    let mut dt: DelaunayTriangulation<SpadePoint<f64>> = DelaunayTriangulation::new();

    // spade's incremental insertion assigns vertex handles in insertion
    // order for a freshly constructed triangulation, so handle index ==
    // input index as long as every insertion succeeds.
    for (i, p) in points.iter().enumerate() {
        let handle = dt
            .insert(SpadePoint::new(p.x, p.y))
            .map_err(|e: InsertionError| {
                EngineError::DegenerateInput(format!("point {i} rejected by triangulator: {e}"))
            })?;
        if handle.index() != i {
            return Err(EngineError::DegenerateInput(format!(
                "point {i} coincides with an earlier point"
            )));
        }
    }

    let triangles: Vec<TriangleIndices> = dt
        .inner_faces()
        .map(|face| {
            let [a, b, c] = face.vertices();
            [
                a.index() as u32,
                b.index() as u32,
                c.index() as u32,
            ]
        })
        .collect();

    if triangles.is_empty() {
        return Err(EngineError::DegenerateInput(
            "point set is collinear or otherwise yields no triangle".to_string(),
        ));
    }

    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangulates_a_simple_quad() {
        let pts = vec![
            Pos::new(0.0, 0.0),
            Pos::new(1.0, 0.0),
            Pos::new(1.0, 1.0),
            Pos::new(0.0, 1.0),
        ];
        let tris = triangulate(&pts).unwrap();
        assert_eq!(tris.len(), 2);
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let pts = vec![
            Pos::new(0.0, 0.0),
            Pos::new(1.0, 0.0),
            Pos::new(2.0, 0.0),
        ];
        assert!(matches!(
            triangulate(&pts),
            Err(EngineError::DegenerateInput(_))
        ));
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let pts = vec![
            Pos::new(0.0, 0.0),
            Pos::new(1.0, 0.0),
            Pos::new(0.0, 0.0),
        ];
        assert!(matches!(
            triangulate(&pts),
            Err(EngineError::DegenerateInput(_))
        ));
    }
}
