use serde::{Deserialize, Serialize};

use super::room_box::RoomBox;
use crate::error::{DegenerateGeometryError, GeometryEntity};
use crate::math::intersect_2d::{collinear_overlap, segments_touch};
use crate::math::polygon_2d::{
    clip_to_box, dedup_vertices, perimeter, point_in_polygon, remove_collinear,
    rotate_to_canonical_start, signed_area,
};
use crate::math::{Point2, DEFAULT_EPSILON};

/// A simple closed polygon with positive area.
///
/// Vertices are stored in input order and orientation; the closing edge from
/// the last vertex back to the first is implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point2>", into = "Vec<Point2>")]
pub struct Polygon {
    vertices: Vec<Point2>,
}

/// The outer envelope of a floorplan.
pub type Boundary = Polygon;

impl TryFrom<Vec<Point2>> for Polygon {
    type Error = DegenerateGeometryError;

    fn try_from(vertices: Vec<Point2>) -> Result<Self, Self::Error> {
        Self::new(vertices, DEFAULT_EPSILON)
    }
}

impl From<Polygon> for Vec<Point2> {
    fn from(p: Polygon) -> Self {
        p.vertices
    }
}

impl Polygon {
    /// Creates a validated polygon.
    ///
    /// `epsilon` is relative to the larger side of the bounding box. A
    /// repeated closing vertex and consecutive duplicates are dropped.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometryError` when a coordinate is not finite,
    /// fewer than 3 distinct vertices remain, the area is within tolerance of
    /// zero, or two edges intersect anywhere other than at a shared vertex.
    pub fn new(vertices: Vec<Point2>, epsilon: f64) -> Result<Self, DegenerateGeometryError> {
        let entity = GeometryEntity::Polygon;
        if !vertices.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
            return Err(DegenerateGeometryError::NonFinite { entity });
        }
        let eps = epsilon * bbox_scale(&vertices);
        let vertices = dedup_vertices(&vertices, eps);
        if vertices.len() < 3 {
            return Err(DegenerateGeometryError::TooFewVertices {
                entity,
                count: vertices.len(),
            });
        }
        let area = signed_area(&vertices);
        if area.abs() <= eps * eps.max(1.0) {
            return Err(DegenerateGeometryError::ZeroArea { entity, area });
        }
        if let Some((first, second)) = first_self_intersection(&vertices, eps) {
            return Err(DegenerateGeometryError::SelfIntersecting {
                entity,
                first,
                second,
            });
        }
        Ok(Self { vertices })
    }

    /// The rectangle of a room box, counter-clockwise from its lower-left corner.
    #[must_use]
    pub fn from_box(room: &RoomBox) -> Self {
        Self {
            vertices: room.corners().to_vec(),
        }
    }

    /// Builds a polygon from vertices already known to be simple and non-degenerate.
    pub(crate) fn from_trusted(vertices: Vec<Point2>) -> Self {
        Self { vertices }
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Edge `i`, from vertex `i` to vertex `i + 1` (wrapping).
    #[must_use]
    pub fn edge(&self, i: usize) -> (Point2, Point2) {
        let n = self.vertices.len();
        (self.vertices[i % n], self.vertices[(i + 1) % n])
    }

    /// Iterates over all edges in vertex order.
    pub fn edges(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        (0..self.vertices.len()).map(|i| self.edge(i))
    }

    /// Signed area; positive for counter-clockwise polygons.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    #[must_use]
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    #[must_use]
    pub fn perimeter(&self) -> f64 {
        perimeter(&self.vertices)
    }

    /// Axis-aligned bounding box as `(min, max)` corners.
    #[must_use]
    pub fn bounding_box(&self) -> (Point2, Point2) {
        bounding_box(&self.vertices)
    }

    /// Larger side of the bounding box; the scale relative epsilons apply to.
    #[must_use]
    pub fn scale(&self) -> f64 {
        bbox_scale(&self.vertices)
    }

    /// Absolute tolerance for a relative `epsilon`.
    #[must_use]
    pub fn tolerance(&self, epsilon: f64) -> f64 {
        epsilon * self.scale()
    }

    /// Point containment; points within `eps` of the outline count as inside.
    #[must_use]
    pub fn contains(&self, point: &Point2, eps: f64) -> bool {
        point_in_polygon(point, &self.vertices, eps)
    }

    /// Clips the polygon to an axis-aligned box. The returned ring may be
    /// empty or contain zero-width bridges; its shoelace area is exact.
    #[must_use]
    pub fn clip_to_box(&self, min: &Point2, max: &Point2) -> Vec<Point2> {
        clip_to_box(&self.vertices, min, max)
    }

    /// Area of the intersection with an axis-aligned box.
    #[must_use]
    pub fn clipped_area(&self, min: &Point2, max: &Point2) -> f64 {
        signed_area(&self.clip_to_box(min, max)).abs()
    }

    /// Counter-clockwise copy without collinear vertices, starting at the
    /// lexicographically smallest vertex.
    #[must_use]
    pub fn canonicalized(&self, eps: f64) -> Self {
        let mut pts = remove_collinear(&self.vertices, eps);
        if signed_area(&pts) < 0.0 {
            pts.reverse();
        }
        Self {
            vertices: rotate_to_canonical_start(&pts, eps),
        }
    }
}

fn bounding_box(points: &[Point2]) -> (Point2, Point2) {
    let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min, max)
}

fn bbox_scale(points: &[Point2]) -> f64 {
    if points.is_empty() {
        return 1.0;
    }
    let (min, max) = bounding_box(points);
    let scale = (max.x - min.x).max(max.y - min.y);
    if scale > 0.0 {
        scale
    } else {
        1.0
    }
}

/// Returns the first pair of edges that intersect other than at their
/// shared vertex, or adjacent edges that fold back onto each other.
fn first_self_intersection(pts: &[Point2], eps: f64) -> Option<(usize, usize)> {
    let n = pts.len();
    for i in 0..n {
        let (a0, a1) = (pts[i], pts[(i + 1) % n]);
        for j in (i + 1)..n {
            let (b0, b1) = (pts[j], pts[(j + 1) % n]);
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                if collinear_overlap(&a0, &a1, &b0, &b1, eps).is_some() {
                    return Some((i, j));
                }
            } else if segments_touch(&a0, &a1, &b0, &b1, eps) {
                return Some((i, j));
            }
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::RoomType;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn closing_vertex_is_dropped() {
        let poly = Polygon::new(
            vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0), p(0.0, 0.0)],
            DEFAULT_EPSILON,
        )
        .unwrap();
        assert_eq!(poly.len(), 4);
        assert_relative_eq!(poly.area(), 4.0);
    }

    #[test]
    fn too_few_vertices() {
        let err = Polygon::new(vec![p(0.0, 0.0), p(1.0, 0.0)], DEFAULT_EPSILON).unwrap_err();
        assert!(matches!(
            err,
            DegenerateGeometryError::TooFewVertices { count: 2, .. }
        ));
    }

    #[test]
    fn collinear_points_have_zero_area() {
        let err = Polygon::new(
            vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)],
            DEFAULT_EPSILON,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DegenerateGeometryError::ZeroArea { .. }
                | DegenerateGeometryError::SelfIntersecting { .. }
        ));
    }

    #[test]
    fn bow_tie_is_rejected() {
        let err = Polygon::new(
            vec![p(0.0, 0.0), p(2.0, 2.0), p(2.0, 0.0), p(0.0, 2.0)],
            DEFAULT_EPSILON,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DegenerateGeometryError::SelfIntersecting { .. }
        ));
    }

    #[test]
    fn canonicalized_is_ccw_from_smallest_vertex() {
        let cw = Polygon::new(
            vec![p(2.0, 2.0), p(2.0, 0.0), p(1.0, 0.0), p(0.0, 0.0), p(0.0, 2.0)],
            DEFAULT_EPSILON,
        )
        .unwrap();
        let canon = cw.canonicalized(1e-9);
        assert!(canon.is_ccw());
        assert_eq!(canon.len(), 4);
        assert_eq!(canon.vertices()[0], p(0.0, 0.0));
        assert_eq!(canon.vertices()[1], p(2.0, 0.0));
    }

    #[test]
    fn from_box_matches_corners() {
        let room = RoomBox::new(1.0, 2.0, 4.0, 3.0, RoomType::StudyRoom).unwrap();
        let poly = Polygon::from_box(&room);
        assert!(poly.is_ccw());
        assert_relative_eq!(poly.area(), room.area());
    }

    #[test]
    fn deserialize_validates() {
        let poly: Polygon = serde_json::from_str("[[0,0],[3,0],[3,3],[0,3]]").unwrap();
        assert_relative_eq!(poly.area(), 9.0);
        assert!(serde_json::from_str::<Polygon>("[[0,0],[3,0]]").is_err());
    }
}
