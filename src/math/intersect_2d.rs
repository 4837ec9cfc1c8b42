use super::distance_2d::point_to_segment_dist;
use super::{cross, Point2, TOLERANCE};

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
/// Parallel segments return `None`; use [`collinear_overlap`] for those.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;

    let denom = cross(&da, &db);
    if denom.abs() < TOLERANCE * da.norm().max(db.norm()).max(1.0) {
        return None;
    }

    let d = b0 - a0;
    let t = cross(&d, &db) / denom;
    let u = cross(&d, &da) / denom;

    // Use a small epsilon to include endpoints.
    let eps = TOLERANCE;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        let t_clamped = t.clamp(0.0, 1.0);
        Some((a0 + da * t_clamped, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Overlap of two collinear segments.
///
/// Returns the endpoints of the shared sub-segment (ordered along `a0 → a1`)
/// when both segments lie on the same line within `eps` and overlap by more
/// than `eps`.
#[must_use]
pub fn collinear_overlap(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
    eps: f64,
) -> Option<(Point2, Point2)> {
    let da = a1 - a0;
    let len = da.norm();
    if len <= eps || (b1 - b0).norm() <= eps {
        return None;
    }
    let dir = da / len;

    // Both endpoints of b must lie on the supporting line of a.
    let off0 = cross(&dir, &(b0 - a0));
    let off1 = cross(&dir, &(b1 - a0));
    if off0.abs() > eps || off1.abs() > eps {
        return None;
    }

    let s0 = (b0 - a0).dot(&dir);
    let s1 = (b1 - a0).dot(&dir);
    let lo = s0.min(s1).max(0.0);
    let hi = s0.max(s1).min(len);
    if hi - lo <= eps {
        return None;
    }
    Some((a0 + dir * lo, a0 + dir * hi))
}

/// Returns `true` when two segments share at least one point (within `eps`).
#[must_use]
pub fn segments_touch(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2, eps: f64) -> bool {
    segment_segment_intersect_2d(a0, a1, b0, b1).is_some()
        || point_to_segment_dist(a0, b0, b1) <= eps
        || point_to_segment_dist(a1, b0, b1) <= eps
        || point_to_segment_dist(b0, a0, a1) <= eps
        || point_to_segment_dist(b1, a0, a1) <= eps
}
