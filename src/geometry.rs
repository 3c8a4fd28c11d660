//! Geometry primitives: bounds, polygons, point-in-polygon, nearest-boundary
//! projection. This is C1 of the uniformization engine: every other
//! component consumes these primitives but none of them own geometric state.

use nalgebra::{Point2, Vector2};

/// The coordinate type used throughout the engine, both in the input frame
/// and the normalized `[0, 1]^2` frame.
pub type Pos = Point2<f64>;

/// Axis-aligned bounding box of the selected input columns, computed once at
/// construction (or whenever the column selection changes) and otherwise
/// immutable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Bounds {
    /// Computes bounds from a non-empty slice of input-frame positions.
    ///
    /// Returns `None` if `points` is empty or the resulting box is
    /// degenerate (zero width or height).
    pub fn from_points(points: &[Pos]) -> Option<Bounds> {
        let mut iter = points.iter();
        let first = iter.next()?;
        let (mut xmin, mut xmax) = (first.x, first.x);
        let (mut ymin, mut ymax) = (first.y, first.y);
        for p in iter {
            xmin = xmin.min(p.x);
            xmax = xmax.max(p.x);
            ymin = ymin.min(p.y);
            ymax = ymax.max(p.y);
        }
        let bounds = Bounds { xmin, xmax, ymin, ymax };
        if bounds.xmax > bounds.xmin && bounds.ymax > bounds.ymin {
            Some(bounds)
        } else {
            None
        }
    }

    /// Maps a point from the input frame into the normalized `[0, 1]^2` frame.
    pub fn normalize(&self, p: Pos) -> Pos {
        Pos::new(
            (p.x - self.xmin) / (self.xmax - self.xmin),
            (p.y - self.ymin) / (self.ymax - self.ymin),
        )
    }

    /// Maps a point from the normalized frame back into the input frame.
    pub fn denormalize(&self, p: Pos) -> Pos {
        Pos::new(
            p.x * (self.xmax - self.xmin) + self.xmin,
            p.y * (self.ymax - self.ymin) + self.ymin,
        )
    }
}

/// A simple (non-self-intersecting) polygon, stored as an ordered ring of
/// vertices (first vertex is not repeated at the end).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Pos>,
}

impl Polygon {
    /// Constructs a polygon from a vertex ring. Returns `None` if fewer than
    /// three vertices are given or the resulting area would be zero.
    pub fn new(vertices: Vec<Pos>) -> Option<Polygon> {
        if vertices.len() < 3 {
            return None;
        }
        let polygon = Polygon { vertices };
        if polygon.area() > 0.0 {
            Some(polygon)
        } else {
            None
        }
    }

    /// The unit square `[0, 1]^2`, used as the default region.
    pub fn unit_square() -> Polygon {
        Polygon {
            vertices: vec![
                Pos::new(0.0, 0.0),
                Pos::new(1.0, 0.0),
                Pos::new(1.0, 1.0),
                Pos::new(0.0, 1.0),
            ],
        }
    }

    pub fn vertices(&self) -> &[Pos] {
        &self.vertices
    }

    fn edges(&self) -> impl Iterator<Item = (Pos, Pos)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Non-negative area via the shoelace formula.
    pub fn area(&self) -> f64 {
        let mut acc = 0.0;
        for (a, b) in self.edges() {
            acc += a.x * b.y - b.x * a.y;
        }
        (acc * 0.5).abs()
    }

    /// Centroid of the polygon. Exact for convex polygons; for arbitrary
    /// simple polygons this is the area-weighted centroid (not merely the
    /// average of the vertices).
    pub fn centroid(&self) -> Pos {
        let mut cx = 0.0;
        let mut cy = 0.0;
        let mut signed_area = 0.0;
        for (a, b) in self.edges() {
            let cross = a.x * b.y - b.x * a.y;
            signed_area += cross;
            cx += (a.x + b.x) * cross;
            cy += (a.y + b.y) * cross;
        }
        if signed_area.abs() < f64::EPSILON {
            // Degenerate fallback: vertex average.
            let n = self.vertices.len() as f64;
            let sum = self
                .vertices
                .iter()
                .fold(Vector2::zeros(), |acc, p| acc + p.coords);
            return Pos::from(sum / n);
        }
        signed_area *= 0.5;
        Pos::new(cx / (6.0 * signed_area), cy / (6.0 * signed_area))
    }

    /// Point-in-polygon test via ray casting. Points on the boundary count as
    /// inside.
    pub fn contains(&self, p: Pos) -> bool {
        if self.on_boundary(p) {
            return true;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            let crosses = (a.y > p.y) != (b.y > p.y);
            if crosses {
                let x_at_y = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x_at_y {
                    inside = !inside;
                }
            }
        }
        inside
    }

    fn on_boundary(&self, p: Pos) -> bool {
        self.edges()
            .any(|(a, b)| point_segment_distance(p, a, b) <= 1e-12)
    }

    /// Closest point of the polygon's closure (boundary) to `p`, breaking
    /// ties by the first edge (in vertex order) that attains the minimum —
    /// arbitrary but deterministic.
    pub fn nearest_on_boundary(&self, p: Pos) -> Pos {
        let mut best: Option<(f64, Pos)> = None;
        for (a, b) in self.edges() {
            let (dist, proj) = point_segment_projection(p, a, b);
            match &best {
                Some((best_dist, _)) if *best_dist <= dist => {}
                _ => best = Some((dist, proj)),
            }
        }
        best.expect("polygon has at least one edge").1
    }

    /// Maps every vertex of `self` through `bounds.normalize`, producing a
    /// polygon in the normalized frame.
    pub fn scaled_by(&self, bounds: &Bounds) -> Polygon {
        Polygon {
            vertices: self.vertices.iter().map(|&v| bounds.normalize(v)).collect(),
        }
    }
}

fn point_segment_distance(p: Pos, a: Pos, b: Pos) -> f64 {
    point_segment_projection(p, a, b).0
}

/// Returns `(distance, closest_point)` of `p` projected onto segment `a..b`.
fn point_segment_projection(p: Pos, a: Pos, b: Pos) -> (f64, Pos) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    let t = if len_sq <= f64::EPSILON {
        0.0
    } else {
        ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
    };
    let proj = a + ab * t;
    ((p - proj).norm(), proj)
}
