use nalgebra::DMatrix;

use crate::config::MatchParams;
use crate::geometry::{AdjacencyGraph, RoomBox, RoomType};

/// Wall adjacency between detected boxes, as a symmetric boolean matrix.
#[derive(Debug, Clone)]
pub struct BoxAdjacency {
    adjacent: Vec<Vec<bool>>,
}

impl BoxAdjacency {
    #[must_use]
    pub fn build(boxes: &[RoomBox], gap: f64, eps: f64) -> Self {
        let n = boxes.len();
        let mut adjacent = vec![vec![false; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let adj = boxes[i].is_adjacent(&boxes[j], gap, eps);
                adjacent[i][j] = adj;
                adjacent[j][i] = adj;
            }
        }
        Self { adjacent }
    }

    #[must_use]
    pub fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.adjacent[a][b]
    }

    /// Sorted multiset of neighbour types of box `i`.
    #[must_use]
    pub fn neighbor_types(&self, boxes: &[RoomBox], i: usize) -> Vec<RoomType> {
        let mut out: Vec<RoomType> = self.adjacent[i]
            .iter()
            .enumerate()
            .filter(|&(_, &adj)| adj)
            .map(|(j, _)| boxes[j].room_type())
            .collect();
        out.sort_unstable();
        out
    }
}

/// Size of the symmetric difference of two sorted multisets.
#[must_use]
pub fn multiset_difference(a: &[RoomType], b: &[RoomType]) -> usize {
    let (mut i, mut j, mut diff) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                diff += 1;
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                diff += 1;
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    diff + (a.len() - i) + (b.len() - j)
}

/// Node × box displacement and index terms. Pairs of different type are
/// `f64::INFINITY`.
///
/// The displacement is the distance to the node's expected position
/// normalised by the diagonal of the detected boxes, and only applies when
/// the graph carries positions.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn linear_costs(boxes: &[RoomBox], graph: &AdjacencyGraph, params: &MatchParams) -> DMatrix<f64> {
    let diagonal = detected_diagonal(boxes);
    DMatrix::from_fn(graph.node_count(), boxes.len(), |node, b| {
        if graph.room_type(node) != boxes[b].room_type() {
            return f64::INFINITY;
        }
        let displacement = graph.positions().map_or(0.0, |positions| {
            (boxes[b].center() - positions[node]).norm() / diagonal
        });
        let index = node.abs_diff(b) as f64;
        params.displacement_weight * displacement + params.index_weight * index
    })
}

/// Node × box cost matrix of the linear relaxation. Pairs of different type
/// are `f64::INFINITY`.
///
/// Adds to [`linear_costs`] the neighbour-type disagreement of each pair,
/// which ignores which neighbour ends up where. The optimum of this matrix
/// seeds the exact search.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cost_matrix(
    boxes: &[RoomBox],
    graph: &AdjacencyGraph,
    adjacency: &BoxAdjacency,
    params: &MatchParams,
) -> DMatrix<f64> {
    let node_types: Vec<Vec<RoomType>> = (0..graph.node_count())
        .map(|n| graph.neighbor_types(n))
        .collect();
    let box_types: Vec<Vec<RoomType>> = (0..boxes.len())
        .map(|b| adjacency.neighbor_types(boxes, b))
        .collect();
    let mut cost = linear_costs(boxes, graph, params);
    for node in 0..graph.node_count() {
        for b in 0..boxes.len() {
            if cost[(node, b)].is_finite() {
                let structure = multiset_difference(&node_types[node], &box_types[b]) as f64;
                cost[(node, b)] += params.structure_weight * structure;
            }
        }
    }
    cost
}

/// Edge disagreement of a complete or partial assignment.
///
/// Counts reference edges between matched nodes whose boxes are not
/// adjacent, plus adjacent matched box pairs with no reference edge.
#[must_use]
pub fn structural_disagreement(
    assignment: &[(usize, usize)],
    graph: &AdjacencyGraph,
    adjacency: &BoxAdjacency,
) -> usize {
    let mut count = 0;
    for (i, &(node_a, box_a)) in assignment.iter().enumerate() {
        for &(node_b, box_b) in &assignment[i + 1..] {
            if graph.has_edge(node_a, node_b) != adjacency.is_adjacent(box_a, box_b) {
                count += 1;
            }
        }
    }
    count
}

fn detected_diagonal(boxes: &[RoomBox]) -> f64 {
    let (mut x0, mut y0) = (f64::INFINITY, f64::INFINITY);
    let (mut x1, mut y1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for b in boxes {
        x0 = x0.min(b.x_min());
        y0 = y0.min(b.y_min());
        x1 = x1.max(b.x_max());
        y1 = y1.max(b.y_max());
    }
    let diag = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
    if diag.is_finite() && diag > 0.0 {
        diag
    } else {
        1.0
    }
}
