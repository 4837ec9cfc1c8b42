//! Turning-function shape signature.
//!
//! The turning function maps normalised arc length along the outline to the
//! cumulative turning angle. It is invariant under translation and uniform
//! scaling; [`TurningFunction::distance`] additionally factors out rotation
//! and the choice of start vertex.

use serde::Serialize;

use crate::error::{GeometryEntity, Result};
use crate::geometry::Polygon;
use crate::math::{cross, lex_cmp, Point2};

/// Breakpoints `(x_k, y_k)` of the turning function, one per vertex.
///
/// `x_k` is the arc length from the lexicographically smallest vertex to
/// vertex `k` over the perimeter, so `x_0 = 0` and all `x_k` lie in `[0, 1)`.
/// `y_k` is the signed turn accumulated up to and including vertex `k`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurningFunction {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl TurningFunction {
    /// Validates `vertices` as a polygon and computes its turning function.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometryError` (entity `Signature`) for fewer than
    /// 3 distinct vertices, zero area, or a self-intersecting outline.
    pub fn compute(vertices: Vec<Point2>, epsilon: f64) -> Result<Self> {
        let polygon = Polygon::new(vertices, epsilon)
            .map_err(|err| err.with_entity(GeometryEntity::Signature))?;
        Ok(Self::from_polygon(&polygon))
    }

    /// Turning function of an already validated polygon. The polygon's
    /// orientation is kept.
    #[must_use]
    pub fn from_polygon(polygon: &Polygon) -> Self {
        let pts = polygon.vertices();
        let n = pts.len();
        let start = (0..n)
            .min_by(|&a, &b| lex_cmp(&pts[a], &pts[b]))
            .unwrap_or(0);
        let ordered: Vec<Point2> = (0..n).map(|k| pts[(start + k) % n]).collect();
        let perimeter = polygon.perimeter();

        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        let (mut arc, mut turn) = (0.0, 0.0);
        for k in 0..n {
            if k > 0 {
                arc += (ordered[k] - ordered[k - 1]).norm();
            }
            let incoming = ordered[k] - ordered[(k + n - 1) % n];
            let outgoing = ordered[(k + 1) % n] - ordered[k];
            turn += cross(&incoming, &outgoing).atan2(incoming.dot(&outgoing));
            xs.push(arc / perimeter);
            ys.push(turn);
        }
        Self { xs, ys }
    }

    /// Breakpoints as `(x, y)` pairs.
    #[must_use]
    pub fn breakpoints(&self) -> Vec<(f64, f64)> {
        self.xs.iter().copied().zip(self.ys.iter().copied()).collect()
    }

    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    #[must_use]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Signed exterior angle at each vertex.
    #[must_use]
    pub fn deltas(&self) -> Vec<f64> {
        let mut prev = 0.0;
        self.ys
            .iter()
            .map(|&y| {
                let d = y - prev;
                prev = y;
                d
            })
            .collect()
    }

    /// Total turn: close to `2π` for counter-clockwise outlines and `-2π`
    /// for clockwise ones.
    #[must_use]
    pub fn total_turn(&self) -> f64 {
        self.ys.last().copied().unwrap_or(0.0)
    }

    /// Step-function value at `x`, extended with `f(x + 1) = f(x) + total_turn`.
    #[must_use]
    pub fn value_at(&self, x: f64) -> f64 {
        let period = x.floor();
        let r = x - period;
        let k = self.xs.partition_point(|&v| v <= r).saturating_sub(1);
        self.ys.get(k).copied().unwrap_or(0.0) + period * self.total_turn()
    }

    /// L2 distance between turning functions, minimised over rotation and
    /// start point.
    ///
    /// For a fixed start shift the best rotation has a closed form, which
    /// leaves the variance of the difference. The shift is searched over
    /// every alignment of a breakpoint of `self` with one of `other`.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        let mut best = f64::INFINITY;
        for &xa in &self.xs {
            for &xb in &other.xs {
                let shift = (xa - xb).rem_euclid(1.0);
                best = best.min(self.shifted_variance(other, shift));
            }
        }
        best.max(0.0).sqrt()
    }

    /// `∫g² - (∫g)²` over one period, with `g(s) = self(s + shift) - other(s)`.
    fn shifted_variance(&self, other: &Self, shift: f64) -> f64 {
        let mut cuts: Vec<f64> = other
            .xs
            .iter()
            .copied()
            .chain(self.xs.iter().map(|&x| (x - shift).rem_euclid(1.0)))
            .collect();
        cuts.push(1.0);
        cuts.sort_by(f64::total_cmp);

        let (mut sum, mut sum_sq) = (0.0, 0.0);
        let mut lo = 0.0;
        for &hi in &cuts {
            let width = hi - lo;
            if width > 0.0 {
                let mid = 0.5 * (lo + hi);
                let g = self.value_at(mid + shift) - other.value_at(mid);
                sum += g * width;
                sum_sq += g * g * width;
            }
            lo = hi;
        }
        sum_sq - sum * sum
    }
}
