use crate::geometry::Polygon;
use crate::math::Point2;

/// Non-uniform grid over the boundary's bounding box.
///
/// Cell `(i, j)` spans `xs[i]..xs[i + 1]` by `ys[j]..ys[j + 1]` and has the
/// flat index `j * nx + i`.
#[derive(Debug, Clone)]
pub(super) struct Grid {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Grid {
    /// Builds the grid from the boundary vertices plus extra lines. Lines
    /// outside the boundary's bounding box are clamped to it; lines closer
    /// than `eps` are merged.
    pub(super) fn build(
        boundary: &Polygon,
        extra_xs: impl IntoIterator<Item = f64>,
        extra_ys: impl IntoIterator<Item = f64>,
        eps: f64,
    ) -> Self {
        let (min, max) = boundary.bounding_box();
        let mut xs: Vec<f64> = boundary.vertices().iter().map(|p| p.x).collect();
        let mut ys: Vec<f64> = boundary.vertices().iter().map(|p| p.y).collect();
        xs.extend(extra_xs.into_iter().map(|x| x.clamp(min.x, max.x)));
        ys.extend(extra_ys.into_iter().map(|y| y.clamp(min.y, max.y)));
        Self {
            xs: merge_lines(xs, eps),
            ys: merge_lines(ys, eps),
        }
    }

    pub(super) fn nx(&self) -> usize {
        self.xs.len().saturating_sub(1)
    }

    pub(super) fn ny(&self) -> usize {
        self.ys.len().saturating_sub(1)
    }

    pub(super) fn len(&self) -> usize {
        self.nx() * self.ny()
    }

    pub(super) fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub(super) fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub(super) fn cell(&self, i: usize, j: usize) -> usize {
        j * self.nx() + i
    }

    /// Cell containing `p`, clamped to the grid.
    pub(super) fn locate(&self, p: &Point2) -> usize {
        let i = self.xs.partition_point(|&x| x <= p.x).clamp(1, self.nx()) - 1;
        let j = self.ys.partition_point(|&y| y <= p.y).clamp(1, self.ny()) - 1;
        self.cell(i, j)
    }

    pub(super) fn coords(&self, cell: usize) -> (usize, usize) {
        (cell % self.nx(), cell / self.nx())
    }

    pub(super) fn bounds(&self, cell: usize) -> (Point2, Point2) {
        let (i, j) = self.coords(cell);
        (
            Point2::new(self.xs[i], self.ys[j]),
            Point2::new(self.xs[i + 1], self.ys[j + 1]),
        )
    }

    pub(super) fn center(&self, cell: usize) -> Point2 {
        let (min, max) = self.bounds(cell);
        Point2::new(0.5 * (min.x + max.x), 0.5 * (min.y + max.y))
    }

    /// Grid vertex `(i, j)` in world coordinates.
    pub(super) fn vertex(&self, i: usize, j: usize) -> Point2 {
        Point2::new(self.xs[i], self.ys[j])
    }

    /// Edge-sharing neighbours in the order below, left, right, above.
    pub(super) fn neighbors(&self, cell: usize) -> impl Iterator<Item = usize> {
        let (nx, ny) = (self.nx(), self.ny());
        let (i, j) = (cell % nx, cell / nx);
        [
            (j > 0).then(|| cell - nx),
            (i > 0).then(|| cell - 1),
            (i + 1 < nx).then(|| cell + 1),
            (j + 1 < ny).then(|| cell + nx),
        ]
        .into_iter()
        .flatten()
    }
}

fn merge_lines(mut values: Vec<f64>, eps: f64) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    let mut out: Vec<f64> = Vec::with_capacity(values.len());
    for v in values {
        match out.last() {
            Some(&last) if v - last <= eps => {}
            _ => out.push(v),
        }
    }
    out
}
