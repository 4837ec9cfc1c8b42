use std::collections::BTreeMap;

use super::grid::Grid;
use crate::geometry::Polygon;
use crate::math::distance_2d::point_to_segment_dist;
use crate::math::Point2;

/// Corner of a room outline: a grid vertex, or a point where the boundary
/// crosses a grid line between two grid vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Corner {
    Grid(usize, usize),
    Crossing(usize),
}

/// A straight piece of a grid side or of the boundary, inside the boundary.
///
/// Walking `from -> to`, cell `left` is on the left and cell `right` on the
/// right; `None` is the outside of the boundary.
#[derive(Debug, Clone, Copy)]
struct Piece {
    from: Corner,
    to: Corner,
    left: Option<usize>,
    right: Option<usize>,
}

type Cuts = BTreeMap<(usize, usize), Vec<(f64, Corner)>>;

/// The partition grid cut by the boundary.
///
/// Every cell holds the area it shares with the boundary. Two neighbouring
/// cells are connected only through a stretch of their common side that lies
/// inside the boundary. Room outlines are assembled from pieces of cell
/// sides and of boundary edges, so a cell crossed by a slanted boundary edge
/// contributes only its inside part.
#[derive(Debug, Clone)]
pub(super) struct Subdivision {
    grid: Grid,
    crossings: Vec<Point2>,
    area: Vec<f64>,
    open_right: Vec<bool>,
    open_up: Vec<bool>,
    pieces: Vec<Piece>,
}

impl Subdivision {
    /// Cuts `grid`, whose lines include every boundary vertex coordinate,
    /// by `boundary`.
    pub(super) fn build(grid: Grid, boundary: &Polygon, eps: f64) -> Self {
        let area = (0..grid.len())
            .map(|c| {
                let (min, max) = grid.bounds(c);
                boundary.clipped_area(&min, &max)
            })
            .collect();
        let cells = grid.len();
        let mut sub = Self {
            grid,
            crossings: Vec::new(),
            area,
            open_right: vec![false; cells],
            open_up: vec![false; cells],
            pieces: Vec::new(),
        };
        let mut vertical = Cuts::new();
        let mut horizontal = Cuts::new();
        sub.cut_boundary(boundary, eps, &mut vertical, &mut horizontal);
        sub.cut_sides(boundary, eps, &vertical, &horizontal);
        sub
    }

    pub(super) fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Area of `cell` inside the boundary.
    pub(super) fn area(&self, cell: usize) -> f64 {
        self.area[cell]
    }

    pub(super) fn point(&self, corner: Corner) -> Point2 {
        match corner {
            Corner::Grid(i, j) => self.grid.vertex(i, j),
            Corner::Crossing(id) => self.crossings[id],
        }
    }

    /// Neighbours of `cell` reachable without leaving the boundary.
    pub(super) fn neighbors(&self, cell: usize) -> impl Iterator<Item = usize> + '_ {
        self.grid
            .neighbors(cell)
            .filter(move |&next| self.is_open(cell, next))
    }

    fn is_open(&self, a: usize, b: usize) -> bool {
        let (lo, hi) = (a.min(b), a.max(b));
        if self.grid.coords(lo).1 == self.grid.coords(hi).1 {
            self.open_right[lo]
        } else {
            self.open_up[lo]
        }
    }

    /// Directed outline edges of the cells owned by `room`, region on the left.
    pub(super) fn outline_edges(&self, owners: &[Option<usize>], room: usize) -> Vec<(Corner, Corner)> {
        self.pieces
            .iter()
            .filter_map(|piece| {
                let left = piece.left.and_then(|c| owners[c]);
                let right = piece.right.and_then(|c| owners[c]);
                if left == right {
                    None
                } else if left == Some(room) {
                    Some((piece.from, piece.to))
                } else if right == Some(room) {
                    Some((piece.to, piece.from))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Splits every boundary edge where it crosses grid lines.
    fn cut_boundary(&mut self, boundary: &Polygon, eps: f64, vertical: &mut Cuts, horizontal: &mut Cuts) {
        let mut ring = boundary.vertices().to_vec();
        if !boundary.is_ccw() {
            ring.reverse();
        }
        let (nx, ny) = (self.grid.nx(), self.grid.ny());
        let snapped: Vec<(usize, usize)> = ring
            .iter()
            .map(|p| (nearest(self.grid.xs(), p.x), nearest(self.grid.ys(), p.y)))
            .collect();

        for k in 0..snapped.len() {
            let (a, b) = (snapped[k], snapped[(k + 1) % snapped.len()]);
            if a == b {
                continue;
            }
            if a.0 == b.0 {
                let i = a.0;
                if a.1 < b.1 {
                    for j in a.1..b.1 {
                        let left = (i > 0).then(|| self.grid.cell(i - 1, j));
                        self.push_outer(Corner::Grid(i, j), Corner::Grid(i, j + 1), left);
                    }
                } else {
                    for j in (b.1..a.1).rev() {
                        let left = (i < nx).then(|| self.grid.cell(i, j));
                        self.push_outer(Corner::Grid(i, j + 1), Corner::Grid(i, j), left);
                    }
                }
            } else if a.1 == b.1 {
                let j = a.1;
                if a.0 < b.0 {
                    for i in a.0..b.0 {
                        let left = (j < ny).then(|| self.grid.cell(i, j));
                        self.push_outer(Corner::Grid(i, j), Corner::Grid(i + 1, j), left);
                    }
                } else {
                    for i in (b.0..a.0).rev() {
                        let left = (j > 0).then(|| self.grid.cell(i, j - 1));
                        self.push_outer(Corner::Grid(i + 1, j), Corner::Grid(i, j), left);
                    }
                }
            } else {
                self.cut_slanted(a, b, eps, vertical, horizontal);
            }
        }
    }

    fn cut_slanted(
        &mut self,
        a: (usize, usize),
        b: (usize, usize),
        eps: f64,
        vertical: &mut Cuts,
        horizontal: &mut Cuts,
    ) {
        let (p, q) = (self.grid.vertex(a.0, a.1), self.grid.vertex(b.0, b.1));
        let mut cuts = vec![(0.0, Corner::Grid(a.0, a.1)), (1.0, Corner::Grid(b.0, b.1))];

        for i in (a.0.min(b.0) + 1)..a.0.max(b.0) {
            let x = self.grid.xs()[i];
            let t = (x - p.x) / (q.x - p.x);
            let y = p.y + t * (q.y - p.y);
            let corner = match snap(self.grid.ys(), y, eps) {
                Some(j) => Corner::Grid(i, j),
                None => {
                    let j = self.grid.ys().partition_point(|&v| v < y).saturating_sub(1);
                    let corner = self.crossing(Point2::new(x, y));
                    vertical.entry((i, j)).or_default().push((y, corner));
                    corner
                }
            };
            cuts.push((t, corner));
        }
        for j in (a.1.min(b.1) + 1)..a.1.max(b.1) {
            let y = self.grid.ys()[j];
            let t = (y - p.y) / (q.y - p.y);
            let x = p.x + t * (q.x - p.x);
            let corner = match snap(self.grid.xs(), x, eps) {
                Some(i) => Corner::Grid(i, j),
                None => {
                    let i = self.grid.xs().partition_point(|&v| v < x).saturating_sub(1);
                    let corner = self.crossing(Point2::new(x, y));
                    horizontal.entry((j, i)).or_default().push((x, corner));
                    corner
                }
            };
            cuts.push((t, corner));
        }

        cuts.sort_by(|l, r| l.0.total_cmp(&r.0));
        cuts.dedup_by(|next, prev| next.1 == prev.1);
        for pair in cuts.windows(2) {
            let (from, to) = (pair[0].1, pair[1].1);
            let mid = nalgebra::center(&self.point(from), &self.point(to));
            let cell = self.grid.locate(&mid);
            self.push_outer(from, to, Some(cell));
        }
    }

    /// Splits every grid side at the boundary crossings and keeps the
    /// stretches inside the boundary.
    fn cut_sides(&mut self, boundary: &Polygon, eps: f64, vertical: &Cuts, horizontal: &Cuts) {
        let (nx, ny) = (self.grid.nx(), self.grid.ny());
        for i in 0..=nx {
            for j in 0..ny {
                let (y0, y1) = (self.grid.ys()[j], self.grid.ys()[j + 1]);
                let corners = side_corners(
                    (y0, Corner::Grid(i, j)),
                    vertical.get(&(i, j)).map(Vec::as_slice),
                    (y1, Corner::Grid(i, j + 1)),
                );
                let left = (i > 0).then(|| self.grid.cell(i - 1, j));
                let right = (i < nx).then(|| self.grid.cell(i, j));
                self.push_side(boundary, eps, &corners, left, right, true);
            }
        }
        for j in 0..=ny {
            for i in 0..nx {
                let (x0, x1) = (self.grid.xs()[i], self.grid.xs()[i + 1]);
                let corners = side_corners(
                    (x0, Corner::Grid(i, j)),
                    horizontal.get(&(j, i)).map(Vec::as_slice),
                    (x1, Corner::Grid(i + 1, j)),
                );
                let left = (j < ny).then(|| self.grid.cell(i, j));
                let right = (j > 0).then(|| self.grid.cell(i, j - 1));
                self.push_side(boundary, eps, &corners, left, right, false);
            }
        }
    }

    fn push_side(
        &mut self,
        boundary: &Polygon,
        eps: f64,
        corners: &[Corner],
        left: Option<usize>,
        right: Option<usize>,
        vertical: bool,
    ) {
        for pair in corners.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let mid = nalgebra::center(&self.point(from), &self.point(to));
            if !strictly_inside(boundary, &mid, eps) {
                continue;
            }
            if let (Some(l), Some(r)) = (left, right) {
                if vertical {
                    self.open_right[l] = true;
                } else {
                    self.open_up[r] = true;
                }
            }
            self.pieces.push(Piece {
                from,
                to,
                left,
                right,
            });
        }
    }

    fn push_outer(&mut self, from: Corner, to: Corner, left: Option<usize>) {
        self.pieces.push(Piece {
            from,
            to,
            left,
            right: None,
        });
    }

    fn crossing(&mut self, p: Point2) -> Corner {
        self.crossings.push(p);
        Corner::Crossing(self.crossings.len() - 1)
    }
}

/// Corners along one grid side in ascending coordinate order.
fn side_corners(
    start: (f64, Corner),
    cuts: Option<&[(f64, Corner)]>,
    end: (f64, Corner),
) -> Vec<Corner> {
    let mut all = vec![start];
    if let Some(cuts) = cuts {
        all.extend(cuts.iter().copied());
    }
    all.push(end);
    all.sort_by(|l, r| l.0.total_cmp(&r.0));
    let mut corners: Vec<Corner> = all.into_iter().map(|(_, c)| c).collect();
    corners.dedup();
    corners
}

fn strictly_inside(boundary: &Polygon, p: &Point2, eps: f64) -> bool {
    boundary.contains(p, eps)
        && boundary
            .edges()
            .all(|(a, b)| point_to_segment_dist(p, &a, &b) > eps)
}

/// Index of the grid line closest to `v`.
fn nearest(lines: &[f64], v: f64) -> usize {
    let k = lines.partition_point(|&l| l < v);
    match (k.checked_sub(1), lines.get(k)) {
        (Some(lo), Some(&hi)) if v - lines[lo] <= hi - v => lo,
        (Some(lo), None) => lo,
        _ => k,
    }
}

/// Index of a grid line within `eps` of `v`.
fn snap(lines: &[f64], v: f64, eps: f64) -> Option<usize> {
    let k = nearest(lines, v);
    ((lines[k] - v).abs() <= eps).then_some(k)
}
