use std::cmp::Ordering;

use serde::Serialize;

use super::polygon::Polygon;
use crate::math::intersect_2d::collinear_overlap;
use crate::math::{cross, lex_cmp, Point2, Vector2};

/// A straight segment with endpoints in canonical (lexicographic) order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: Point2,
    pub end: Point2,
}

impl Segment {
    /// Creates a segment, ordering the endpoints lexicographically.
    #[must_use]
    pub fn new(a: Point2, b: Point2) -> Self {
        if lex_cmp(&a, &b) == Ordering::Greater {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    #[must_use]
    pub fn midpoint(&self) -> Point2 {
        self.start + (self.end - self.start) * 0.5
    }

    /// Unit direction from `start` to `end`, or zero for a degenerate segment.
    #[must_use]
    pub fn direction(&self) -> Vector2 {
        let d = self.end - self.start;
        let len = d.norm();
        if len > 0.0 {
            d / len
        } else {
            Vector2::zeros()
        }
    }

    /// The sub-segment of length `min(width, self.length())` centred on this one.
    #[must_use]
    pub fn centered(&self, width: f64) -> Self {
        let half = 0.5 * width.min(self.length());
        let mid = self.midpoint();
        let dir = self.direction();
        Self::new(mid - dir * half, mid + dir * half)
    }

    /// Whether both segments lie on one line and overlap or touch end to end.
    fn joins(&self, other: &Segment, eps: f64) -> bool {
        let dir = self.direction();
        if cross(&dir, &(other.start - self.start)).abs() > eps
            || cross(&dir, &(other.end - self.start)).abs() > eps
        {
            return false;
        }
        let s0 = (other.start - self.start).dot(&dir);
        let s1 = (other.end - self.start).dot(&dir);
        s0.min(s1) <= self.length() + eps && s0.max(s1) >= -eps
    }

    fn merged(&self, other: &Segment) -> Self {
        let mut pts = [self.start, self.end, other.start, other.end];
        pts.sort_by(lex_cmp);
        Self::new(pts[0], pts[3])
    }
}

/// All maximal collinear overlaps between an edge of `a` and an edge of `b`.
///
/// Overlaps that continue each other are merged. The result is sorted by
/// start point.
#[must_use]
pub fn shared_segments(a: &Polygon, b: &Polygon, eps: f64) -> Vec<Segment> {
    let mut pieces: Vec<Segment> = Vec::new();
    for (a0, a1) in a.edges() {
        for (b0, b1) in b.edges() {
            if let Some((s, e)) = collinear_overlap(&a0, &a1, &b0, &b1, eps) {
                pieces.push(Segment::new(s, e));
            }
        }
    }
    merge_segments(pieces, eps)
}

/// The longest shared segment of two polygons, if any. Ties keep the first
/// segment in start-point order.
#[must_use]
pub fn shared_segment(a: &Polygon, b: &Polygon, eps: f64) -> Option<Segment> {
    shared_segments(a, b, eps)
        .into_iter()
        .fold(None, |best: Option<Segment>, seg| match best {
            Some(kept) if kept.length() >= seg.length() - eps => Some(kept),
            _ => Some(seg),
        })
}

/// Merges collinear segments that overlap or touch end to end.
#[must_use]
pub fn merge_segments(mut pieces: Vec<Segment>, eps: f64) -> Vec<Segment> {
    let mut merged = true;
    while merged {
        merged = false;
        'outer: for i in 0..pieces.len() {
            for j in (i + 1)..pieces.len() {
                if pieces[i].joins(&pieces[j], eps) {
                    let joined = pieces[i].merged(&pieces[j]);
                    pieces[i] = joined;
                    pieces.remove(j);
                    merged = true;
                    break 'outer;
                }
            }
        }
    }
    pieces.sort_by(|s, t| lex_cmp(&s.start, &t.start).then(lex_cmp(&s.end, &t.end)));
    pieces
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::DEFAULT_EPSILON;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::new(
            vec![p(x0, y0), p(x1, y0), p(x1, y1), p(x0, y1)],
            DEFAULT_EPSILON,
        )
        .unwrap()
    }

    #[test]
    fn endpoints_are_canonical() {
        let s = Segment::new(p(3.0, 1.0), p(1.0, 1.0));
        assert_eq!(s.start, p(1.0, 1.0));
        assert_relative_eq!(s.length(), 2.0);
    }

    #[test]
    fn centered_clips_to_length() {
        let s = Segment::new(p(0.0, 0.0), p(4.0, 0.0));
        let c = s.centered(1.0);
        assert_relative_eq!(c.start.x, 1.5);
        assert_relative_eq!(c.end.x, 2.5);
        let wide = s.centered(10.0);
        assert_relative_eq!(wide.length(), 4.0);
    }

    #[test]
    fn side_by_side_rooms_share_wall() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(2.0, 1.0, 4.0, 5.0);
        let seg = shared_segment(&a, &b, 1e-9).unwrap();
        assert_eq!(seg.start, p(2.0, 1.0));
        assert_eq!(seg.end, p(2.0, 2.0));
    }

    #[test]
    fn corner_contact_shares_nothing() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(1.0, 1.0, 2.0, 2.0);
        assert!(shared_segment(&a, &b, 1e-9).is_none());
    }

    #[test]
    fn continuing_pieces_are_merged() {
        let pieces = vec![
            Segment::new(p(0.0, 0.0), p(1.0, 0.0)),
            Segment::new(p(2.0, 0.0), p(3.0, 0.0)),
            Segment::new(p(1.0, 0.0), p(2.0, 0.0)),
        ];
        let merged = merge_segments(pieces, 1e-9);
        assert_eq!(merged.len(), 1);
        assert_relative_eq!(merged[0].length(), 3.0);
    }

    #[test]
    fn longest_of_several_shared_segments() {
        // An L-shaped room wrapping a square one on two sides.
        let l = Polygon::new(
            vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 1.0), p(1.0, 1.0), p(1.0, 3.0), p(0.0, 3.0)],
            DEFAULT_EPSILON,
        )
        .unwrap();
        let sq = rect(1.0, 1.0, 3.0, 3.0);
        let all = shared_segments(&l, &sq, 1e-9);
        assert_eq!(all.len(), 2);
        let longest = shared_segment(&l, &sq, 1e-9).unwrap();
        assert_relative_eq!(longest.length(), 2.0);
    }
}
