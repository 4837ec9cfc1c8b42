//! Boundary partitioning.
//!
//! Splits the outer boundary among the aligned rooms on a compressed grid
//! whose lines are the boundary vertices, the box edges and the walls that
//! divide overlapping boxes. The grid is cut by the boundary, so cells on a
//! slanted boundary edge keep only their inside part. Overlaps are settled
//! cell by cell, detached fragments are released, and every uncovered cell
//! goes to the nearest room.

mod grid;
mod overlap;
mod subdivision;
mod trace;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, VecDeque};

use serde::Serialize;
use tracing::{debug, warn};

use self::grid::Grid;
use self::overlap::{owner, split_line, SplitLine};
use self::subdivision::Subdivision;
use self::trace::trace_loops;
use crate::config::PartitionParams;
use crate::error::{DegenerateGeometryError, GeometryEntity, Result, UnrecoverableGapError};
use crate::geometry::Polygon;
use crate::math::polygon_2d::signed_area;
use crate::math::{Point2, DEFAULT_EPSILON};
use crate::operations::matching::{AlignedRoom, Alignment};

/// One room polygon per aligned node, plus coverage diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct RoomPartition {
    rooms: BTreeMap<usize, Polygon>,
    covered_area: f64,
    residual_fraction: f64,
    rooms_with_holes: Vec<usize>,
}

impl RoomPartition {
    /// Room polygons keyed by reference node, counter-clockwise and
    /// canonicalized.
    #[must_use]
    pub fn rooms(&self) -> &BTreeMap<usize, Polygon> {
        &self.rooms
    }

    #[must_use]
    pub fn room(&self, node: usize) -> Option<&Polygon> {
        self.rooms.get(&node)
    }

    /// Boundary area covered by the rooms.
    #[must_use]
    pub fn covered_area(&self) -> f64 {
        self.covered_area
    }

    /// Uncovered fraction of the boundary area.
    #[must_use]
    pub fn residual_fraction(&self) -> f64 {
        self.residual_fraction
    }

    /// Nodes whose region encloses a hole. Their polygon is the outer outline.
    #[must_use]
    pub fn rooms_with_holes(&self) -> &[usize] {
        &self.rooms_with_holes
    }
}

/// Partitions the outer boundary among the rooms of an alignment.
pub struct PartitionBoundary<'a> {
    boundary: &'a Polygon,
    alignment: &'a Alignment<'a>,
    params: PartitionParams,
    epsilon: f64,
}

impl<'a> PartitionBoundary<'a> {
    #[must_use]
    pub fn new(boundary: &'a Polygon, alignment: &'a Alignment<'a>) -> Self {
        Self {
            boundary,
            alignment,
            params: PartitionParams::default(),
            epsilon: DEFAULT_EPSILON,
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: PartitionParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the epsilon, relative to the boundary's bounding box.
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Executes the partition.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometryError::EmptyRoom` for a room that ends up
    /// with no area, and `UnrecoverableGapError` when the uncovered fraction
    /// exceeds `max_gap_fraction`.
    pub fn execute(&self) -> Result<RoomPartition> {
        let eps = self.boundary.tolerance(self.epsilon);
        let rooms: Vec<AlignedRoom<'_>> = self.alignment.rooms().collect();
        let sub = Subdivision::build(self.build_grid(&rooms, eps), self.boundary, eps);
        let cells = sub.grid().len();

        let inside: Vec<bool> = (0..cells).map(|c| sub.area(c) > eps * eps).collect();
        let mut owners = claim_cells(sub.grid(), &inside, &rooms, eps);
        let released = keep_largest_components(&sub, &mut owners, rooms.len());
        let filled = fill_gaps(&sub, &inside, &mut owners);
        debug!(
            cells,
            rooms = rooms.len(),
            released,
            filled,
            "partition grid resolved"
        );

        for (k, room) in rooms.iter().enumerate() {
            if !owners.contains(&Some(k)) {
                return Err(DegenerateGeometryError::EmptyRoom {
                    entity: GeometryEntity::RoomBoundary(room.node),
                }
                .into());
            }
        }

        let boundary_area = self.boundary.area();
        let covered_area: f64 = (0..cells)
            .filter(|&c| owners[c].is_some())
            .map(|c| sub.area(c))
            .sum();
        let residual_fraction = ((boundary_area - covered_area) / boundary_area).max(0.0);
        if residual_fraction > self.params.max_gap_fraction {
            return Err(UnrecoverableGapError {
                residual_fraction,
                max_fraction: self.params.max_gap_fraction,
            }
            .into());
        }

        let mut polygons = BTreeMap::new();
        let mut rooms_with_holes = Vec::new();
        for (k, room) in rooms.iter().enumerate() {
            let (outline, holes) = outline(&sub, &owners, k);
            if holes > 0 {
                warn!(node = room.node, holes, "room region encloses a hole");
                rooms_with_holes.push(room.node);
            }
            polygons.insert(room.node, Polygon::from_trusted(outline).canonicalized(eps));
        }

        debug!(covered_area, residual_fraction, "boundary partitioned");
        Ok(RoomPartition {
            rooms: polygons,
            covered_area,
            residual_fraction,
            rooms_with_holes,
        })
    }

    fn build_grid(&self, rooms: &[AlignedRoom<'_>], eps: f64) -> Grid {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for room in rooms {
            xs.extend([room.room.x_min(), room.room.x_max()]);
            ys.extend([room.room.y_min(), room.room.y_max()]);
        }
        for (a, ra) in rooms.iter().enumerate() {
            for rb in &rooms[a + 1..] {
                match split_line(ra, rb, eps) {
                    Some(SplitLine::Vertical(x)) => xs.push(x),
                    Some(SplitLine::Horizontal(y)) => ys.push(y),
                    None => {}
                }
            }
        }
        Grid::build(self.boundary, xs, ys, eps)
    }
}

/// Initial owner of every inside cell from box coverage and overlap contests.
fn claim_cells(
    grid: &Grid,
    inside: &[bool],
    rooms: &[AlignedRoom<'_>],
    eps: f64,
) -> Vec<Option<usize>> {
    (0..grid.len())
        .map(|c| {
            if !inside[c] {
                return None;
            }
            let at = grid.center(c);
            let covering: Vec<usize> = (0..rooms.len())
                .filter(|&k| rooms[k].room.contains_point(&at))
                .collect();
            match covering.as_slice() {
                [] => None,
                [only] => Some(*only),
                _ => owner(rooms, &covering, &at, eps),
            }
        })
        .collect()
}

/// Keeps each room's largest component, connected through cell sides inside
/// the boundary; returns the number of released cells.
fn keep_largest_components(sub: &Subdivision, owners: &mut [Option<usize>], room_count: usize) -> usize {
    let cells = sub.grid().len();
    let mut released = 0;
    for k in 0..room_count {
        let mut seen = vec![false; cells];
        let mut components: Vec<Vec<usize>> = Vec::new();
        for start in 0..cells {
            if owners[start] != Some(k) || seen[start] {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            seen[start] = true;
            while let Some(cell) = queue.pop_front() {
                component.push(cell);
                for next in sub.neighbors(cell) {
                    if owners[next] == Some(k) && !seen[next] {
                        seen[next] = true;
                        queue.push_back(next);
                    }
                }
            }
            components.push(component);
        }
        // Ties keep the component found first.
        let keep = components
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, usize)>, (idx, comp)| match best {
                Some((_, size)) if size >= comp.len() => best,
                _ => Some((idx, comp.len())),
            })
            .map(|(idx, _)| idx);
        for (idx, component) in components.iter().enumerate() {
            if Some(idx) != keep {
                for &cell in component {
                    owners[cell] = None;
                }
                released += component.len();
            }
        }
    }
    released
}

#[derive(Debug, Clone, Copy)]
struct Frontier {
    dist: f64,
    room: usize,
    cell: usize,
}

impl Frontier {
    fn key(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then(self.room.cmp(&other.room))
            .then(self.cell.cmp(&other.cell))
    }
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.key(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    // Reversed so the max-heap pops the nearest entry, lower room first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key(self)
    }
}

/// Assigns every unowned inside cell to the room nearest along cell
/// adjacency, measured between cell centres. Returns the number of cells
/// assigned.
fn fill_gaps(sub: &Subdivision, inside: &[bool], owners: &mut [Option<usize>]) -> usize {
    let grid = sub.grid();
    let mut heap = BinaryHeap::new();
    let mut best: Vec<Option<(f64, usize)>> = vec![None; grid.len()];
    for (cell, owner) in owners.iter().enumerate() {
        if let Some(room) = *owner {
            heap.push(Frontier {
                dist: 0.0,
                room,
                cell,
            });
        }
    }

    let mut settled = vec![false; grid.len()];
    let mut filled = 0;
    while let Some(Frontier { dist, room, cell }) = heap.pop() {
        if settled[cell] {
            continue;
        }
        settled[cell] = true;
        if owners[cell].is_none() {
            owners[cell] = Some(room);
            filled += 1;
        }
        let from = grid.center(cell);
        for next in sub.neighbors(cell) {
            if !inside[next] || settled[next] || owners[next].is_some() {
                continue;
            }
            let d = dist + (grid.center(next) - from).norm();
            let improves = best[next].map_or(true, |(bd, br)| {
                d.total_cmp(&bd).then(room.cmp(&br)) == Ordering::Less
            });
            if improves {
                best[next] = Some((d, room));
                heap.push(Frontier {
                    dist: d,
                    room,
                    cell: next,
                });
            }
        }
    }
    filled
}

/// Outer outline of the region owned by `room`, and its hole count.
fn outline(sub: &Subdivision, owners: &[Option<usize>], room: usize) -> (Vec<Point2>, usize) {
    let edges = sub.outline_edges(owners, room);
    let loops: Vec<Vec<Point2>> = trace_loops(&edges, |c| sub.point(c))
        .into_iter()
        .map(|ring| ring.into_iter().map(|c| sub.point(c)).collect())
        .collect();
    let holes = loops.iter().filter(|ring| signed_area(ring) < 0.0).count();
    let outer = loops
        .into_iter()
        .max_by(|a, b| signed_area(a).total_cmp(&signed_area(b)))
        .unwrap_or_default();
    (outer, holes)
}
