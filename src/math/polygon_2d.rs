use super::distance_2d::point_to_segment_dist;
use super::{cross, Point2};

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Total edge length of a closed polygon.
#[must_use]
pub fn perimeter(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| (points[(i + 1) % n] - points[i]).norm()).sum()
}

/// Index of the lexicographically smallest vertex (smallest x, then smallest y).
///
/// Coordinates closer than `eps` count as equal.
#[must_use]
pub fn canonical_start_index(points: &[Point2], eps: f64) -> usize {
    let mut best = 0;
    for (i, pt) in points.iter().enumerate().skip(1) {
        let b = &points[best];
        if pt.x < b.x - eps || ((pt.x - b.x).abs() <= eps && pt.y < b.y - eps) {
            best = i;
        }
    }
    best
}

/// Rotates a closed polygon so it starts at its lexicographically smallest vertex.
#[must_use]
pub fn rotate_to_canonical_start(points: &[Point2], eps: f64) -> Vec<Point2> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let best = canonical_start_index(points, eps);
    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&points[best..]);
    rotated.extend_from_slice(&points[..best]);
    rotated
}

/// Drops consecutive duplicates and a repeated closing vertex.
#[must_use]
pub fn dedup_vertices(points: &[Point2], eps: f64) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_some_and(|last| (p - last).norm() <= eps) {
            continue;
        }
        out.push(p);
    }
    while out.len() > 1 && out.last().is_some_and(|last| (out[0] - last).norm() <= eps) {
        out.pop();
    }
    out
}

/// Removes vertices whose neighbours are collinear with them, including
/// spikes that fold back on the previous edge.
#[must_use]
pub fn remove_collinear(points: &[Point2], eps: f64) -> Vec<Point2> {
    let mut pts = dedup_vertices(points, eps);
    loop {
        let n = pts.len();
        if n < 3 {
            return pts;
        }
        let redundant = (0..n).find(|&i| {
            let prev = pts[(i + n - 1) % n];
            let next = pts[(i + 1) % n];
            point_to_segment_dist(&pts[i], &prev, &next) <= eps
                || cross(&(pts[i] - prev), &(next - pts[i])).abs()
                    <= eps * (pts[i] - prev).norm().max((next - pts[i]).norm())
        });
        match redundant {
            Some(i) => {
                pts.remove(i);
            }
            None => return pts,
        }
    }
}

/// Even-odd point-in-polygon test. Points within `eps` of an edge count as inside.
#[must_use]
pub fn point_in_polygon(point: &Point2, points: &[Point2], eps: f64) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        if point_to_segment_dist(point, a, b) <= eps {
            return true;
        }
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Clips a closed polygon to an axis-aligned box (Sutherland-Hodgman).
///
/// The box is the convex clip window, so any simple subject polygon works;
/// for non-convex subjects the result may contain zero-width bridges along
/// the box edges, which do not change its area.
#[must_use]
pub fn clip_to_box(points: &[Point2], min: &Point2, max: &Point2) -> Vec<Point2> {
    // Each half-plane is `sign * (coord - bound) >= 0` on the given axis.
    let planes: [(usize, f64, f64); 4] = [
        (0, min.x, 1.0),
        (0, max.x, -1.0),
        (1, min.y, 1.0),
        (1, max.y, -1.0),
    ];

    let mut output = points.to_vec();
    for (axis, bound, sign) in planes {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let n = input.len();
        for i in 0..n {
            let cur = input[i];
            let prev = input[(i + n - 1) % n];
            let d_cur = sign * (cur[axis] - bound);
            let d_prev = sign * (prev[axis] - bound);
            if d_cur >= 0.0 {
                if d_prev < 0.0 {
                    output.push(lerp_at(&prev, &cur, d_prev, d_cur));
                }
                output.push(cur);
            } else if d_prev >= 0.0 {
                output.push(lerp_at(&prev, &cur, d_prev, d_cur));
            }
        }
    }
    output
}

fn lerp_at(a: &Point2, b: &Point2, da: f64, db: f64) -> Point2 {
    let t = da / (da - db);
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn l_shape() -> Vec<Point2> {
        vec![
            p(0.0, 0.0),
            p(4.0, 0.0),
            p(4.0, 2.0),
            p(2.0, 2.0),
            p(2.0, 4.0),
            p(0.0, 4.0),
        ]
    }

    #[test]
    fn signed_area_orientation() {
        let ccw = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        assert_relative_eq!(signed_area(&ccw), 1.0);
        let cw: Vec<_> = ccw.iter().rev().copied().collect();
        assert_relative_eq!(signed_area(&cw), -1.0);
        assert_relative_eq!(signed_area(&ccw[..2]), 0.0);
    }

    #[test]
    fn l_shape_area_and_perimeter() {
        assert_relative_eq!(signed_area(&l_shape()), 12.0);
        assert_relative_eq!(perimeter(&l_shape()), 16.0);
    }

    #[test]
    fn canonical_start_rotation() {
        let pts = vec![p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p(0.0, 0.0)];
        let rotated = rotate_to_canonical_start(&pts, 1e-9);
        assert_relative_eq!(rotated[0].x, 0.0);
        assert_relative_eq!(rotated[0].y, 0.0);
        assert_relative_eq!(rotated[1].x, 1.0);
    }

    #[test]
    fn dedup_drops_closing_vertex() {
        let pts = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 0.0)];
        assert_eq!(dedup_vertices(&pts, 1e-9).len(), 3);
    }

    #[test]
    fn collinear_vertices_removed() {
        let pts = vec![
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 2.0),
            p(0.0, 2.0),
            p(0.0, 1.0),
        ];
        let simplified = remove_collinear(&pts, 1e-9);
        assert_eq!(simplified.len(), 4);
        assert_relative_eq!(signed_area(&simplified), 4.0);
    }

    #[test]
    fn point_in_l_shape() {
        let poly = l_shape();
        assert!(point_in_polygon(&p(1.0, 1.0), &poly, 1e-9));
        assert!(point_in_polygon(&p(1.0, 3.0), &poly, 1e-9));
        assert!(!point_in_polygon(&p(3.0, 3.0), &poly, 1e-9));
        // On the boundary.
        assert!(point_in_polygon(&p(4.0, 1.0), &poly, 1e-9));
    }

    #[test]
    fn clip_l_shape_to_box() {
        let clipped = clip_to_box(&l_shape(), &p(1.0, 1.0), &p(3.0, 3.0));
        // Box area 4 minus the missing upper-right quadrant (1x1).
        assert_relative_eq!(signed_area(&clipped), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn clip_disjoint_is_empty() {
        let clipped = clip_to_box(&l_shape(), &p(5.0, 5.0), &p(6.0, 6.0));
        assert!(signed_area(&clipped).abs() < 1e-12);
    }
}
