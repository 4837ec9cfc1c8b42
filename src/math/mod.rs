pub mod distance_2d;
pub mod intersect_2d;
pub mod polygon_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Default relative epsilon, scaled by the bounding-box size of the input.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Absolute floor for floating-point comparisons on unit-free quantities.
pub const TOLERANCE: f64 = 1e-10;

/// 2D cross product `a.x * b.y - a.y * b.x`.
#[must_use]
pub fn cross(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Lexicographic (x, then y) ordering of points.
#[must_use]
pub fn lex_cmp(a: &Point2, b: &Point2) -> std::cmp::Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}
