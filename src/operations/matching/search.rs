use std::cmp::Reverse;

use nalgebra::DMatrix;

use super::cost::BoxAdjacency;
use crate::geometry::AdjacencyGraph;

/// Objective values closer than this are equal; the earlier one stays.
const TIE: f64 = 1e-12;

/// Node → box assignment and its objective value.
#[derive(Debug, Clone)]
pub(super) struct Incumbent {
    pub(super) slots: Vec<Option<usize>>,
    pub(super) cost: f64,
}

/// Objective of a full assignment: weighted edge disagreement plus the
/// linear terms of every matched pair.
#[allow(clippy::cast_precision_loss)]
pub(super) fn objective(
    slots: &[Option<usize>],
    graph: &AdjacencyGraph,
    adjacency: &BoxAdjacency,
    linear: &DMatrix<f64>,
    structure_weight: f64,
) -> f64 {
    let pairs: Vec<(usize, usize)> = slots
        .iter()
        .enumerate()
        .filter_map(|(n, b)| b.map(|b| (n, b)))
        .collect();
    let disagreement = super::cost::structural_disagreement(&pairs, graph, adjacency);
    let linear: f64 = pairs.iter().map(|&(n, b)| linear[(n, b)]).sum();
    structure_weight * disagreement as f64 + linear
}

/// Depth-first branch and bound over type-consistent assignments.
///
/// Nodes are decided most-connected first. A node takes a free box of its
/// type or, while its type has more nodes than boxes, stays unmatched. The
/// bound adds, for every undecided node, its cheapest option against the
/// nodes decided so far.
pub(super) struct Search<'s> {
    graph: &'s AdjacencyGraph,
    adjacency: &'s BoxAdjacency,
    linear: &'s DMatrix<f64>,
    structure_weight: f64,
    candidates: Vec<Vec<usize>>,
    class: Vec<usize>,
    spare: Vec<usize>,
    order: Vec<usize>,
    slots: Vec<Option<usize>>,
    used: Vec<bool>,
    best: Incumbent,
    expanded: usize,
    limit: usize,
}

impl<'s> Search<'s> {
    /// `blocks` lists, per room type, its nodes and boxes.
    pub(super) fn new<'b>(
        graph: &'s AdjacencyGraph,
        adjacency: &'s BoxAdjacency,
        linear: &'s DMatrix<f64>,
        structure_weight: f64,
        blocks: impl IntoIterator<Item = &'b (Vec<usize>, Vec<usize>)>,
        seed: Incumbent,
        limit: usize,
    ) -> Self {
        let nodes = graph.node_count();
        let mut candidates = vec![Vec::new(); nodes];
        let mut class = vec![0; nodes];
        let mut spare = Vec::new();
        for (k, (block_nodes, block_boxes)) in blocks.into_iter().enumerate() {
            for &n in block_nodes {
                let mut boxes = block_boxes.clone();
                boxes.sort_by(|&a, &b| linear[(n, a)].total_cmp(&linear[(n, b)]).then(a.cmp(&b)));
                candidates[n] = boxes;
                class[n] = k;
            }
            spare.push(block_nodes.len().saturating_sub(block_boxes.len()));
        }

        let mut order: Vec<usize> = (0..nodes).collect();
        order.sort_by_key(|&n| (Reverse(graph.neighbors(n).len()), n));

        Self {
            graph,
            adjacency,
            linear,
            structure_weight,
            candidates,
            class,
            spare,
            order,
            slots: vec![None; nodes],
            used: vec![false; linear.ncols()],
            best: seed,
            expanded: 0,
            limit,
        }
    }

    /// Runs the search. The flag is `false` when the expansion limit cut it
    /// short, in which case the result is the best assignment seen.
    pub(super) fn run(mut self) -> (Incumbent, bool) {
        self.descend(0, 0.0);
        let proven = self.expanded <= self.limit;
        (self.best, proven)
    }

    fn descend(&mut self, depth: usize, cost: f64) {
        if depth == self.order.len() {
            if cost < self.best.cost - TIE {
                self.best = Incumbent {
                    slots: self.slots.clone(),
                    cost,
                };
            }
            return;
        }
        self.expanded += 1;
        if self.expanded > self.limit {
            return;
        }
        let Some(bound) = self.remaining_bound(depth) else {
            return;
        };
        if cost + bound >= self.best.cost - TIE {
            return;
        }

        let node = self.order[depth];
        for k in 0..self.candidates[node].len() {
            let b = self.candidates[node][k];
            if self.used[b] {
                continue;
            }
            let step = self.step_cost(depth, node, b);
            self.used[b] = true;
            self.slots[node] = Some(b);
            self.descend(depth + 1, cost + step);
            self.slots[node] = None;
            self.used[b] = false;
        }
        let class = self.class[node];
        if self.spare[class] > 0 {
            self.spare[class] -= 1;
            self.descend(depth + 1, cost);
            self.spare[class] += 1;
        }
    }

    /// Cost of giving `node` box `b`, counted against the first `depth`
    /// decided nodes.
    #[allow(clippy::cast_precision_loss)]
    fn step_cost(&self, depth: usize, node: usize, b: usize) -> f64 {
        let conflicts = self.order[..depth]
            .iter()
            .filter(|&&m| {
                self.slots[m].is_some_and(|c| {
                    self.graph.has_edge(node, m) != self.adjacency.is_adjacent(b, c)
                })
            })
            .count();
        self.structure_weight * conflicts as f64 + self.linear[(node, b)]
    }

    /// Lower bound on the cost of the undecided nodes; `None` when one of
    /// them has no option left.
    fn remaining_bound(&self, depth: usize) -> Option<f64> {
        let mut bound = 0.0;
        for &node in &self.order[depth..] {
            let mut cheapest = (self.spare[self.class[node]] > 0).then_some(0.0);
            for &b in &self.candidates[node] {
                if !self.used[b] {
                    let c = self.step_cost(depth, node, b);
                    cheapest = Some(cheapest.map_or(c, |m: f64| m.min(c)));
                }
            }
            bound += cheapest?;
        }
        Some(bound)
    }
}
