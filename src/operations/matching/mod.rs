mod cost;
mod hungarian;
mod search;

use std::collections::BTreeMap;

use nalgebra::DMatrix;
use tracing::{debug, warn};

pub use cost::{linear_costs, multiset_difference, structural_disagreement, BoxAdjacency};
pub use hungarian::{assignment_cost, min_cost_assignment};

use self::search::{objective, Incumbent, Search};
use crate::config::MatchParams;
use crate::error::{AlignmentInfeasibleError, Result};
use crate::geometry::{AdjacencyGraph, RoomBox, RoomType};
use crate::math::DEFAULT_EPSILON;

/// A detected box assigned to a reference node.
#[derive(Debug, Clone, Copy)]
pub struct AlignedRoom<'a> {
    /// Reference node index.
    pub node: usize,
    /// Index of the box in the detected set.
    pub detected: usize,
    /// The detected box itself, borrowed from the caller's set.
    pub room: &'a RoomBox,
}

/// Mapping from reference nodes to detected boxes.
///
/// Rooms are keyed by node index and borrow the detected boxes, so the
/// aligned set is a re-labeling of the input rather than a copy.
#[derive(Debug, Clone)]
pub struct Alignment<'a> {
    boxes: &'a [RoomBox],
    node_to_box: BTreeMap<usize, usize>,
    node_count: usize,
    unmatched_nodes: Vec<usize>,
    unmatched_boxes: Vec<usize>,
    structural_cost: usize,
    total_cost: f64,
}

impl<'a> Alignment<'a> {
    /// Number of reference nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Whether every node received a box.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unmatched_nodes.is_empty()
    }

    /// Per node, the index of its detected box. `None` unless complete.
    #[must_use]
    pub fn order(&self) -> Option<Vec<usize>> {
        if !self.is_complete() {
            return None;
        }
        Some(self.node_to_box.values().copied().collect())
    }

    /// Detected box index assigned to `node`.
    #[must_use]
    pub fn detected_index(&self, node: usize) -> Option<usize> {
        self.node_to_box.get(&node).copied()
    }

    /// Detected box assigned to `node`.
    #[must_use]
    pub fn room_for_node(&self, node: usize) -> Option<&'a RoomBox> {
        self.detected_index(node).map(|b| &self.boxes[b])
    }

    /// Matched rooms in ascending node order.
    pub fn rooms(&self) -> impl Iterator<Item = AlignedRoom<'a>> + '_ {
        let boxes = self.boxes;
        self.node_to_box
            .iter()
            .map(move |(&node, &detected)| AlignedRoom {
                node,
                detected,
                room: &boxes[detected],
            })
    }

    /// Boxes re-indexed to reference numbering; `None` for unmatched nodes.
    #[must_use]
    pub fn boxes_aligned(&self) -> Vec<Option<&'a RoomBox>> {
        (0..self.node_count).map(|n| self.room_for_node(n)).collect()
    }

    /// `(node, detected)` pairs in ascending node order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.node_to_box.iter().map(|(&n, &b)| (n, b)).collect()
    }

    #[must_use]
    pub fn unmatched_nodes(&self) -> &[usize] {
        &self.unmatched_nodes
    }

    #[must_use]
    pub fn unmatched_boxes(&self) -> &[usize] {
        &self.unmatched_boxes
    }

    /// Reference edges whose boxes are not adjacent plus adjacent boxes with
    /// no reference edge, over the matched nodes.
    #[must_use]
    pub fn structural_cost(&self) -> usize {
        self.structural_cost
    }

    /// Objective value of the chosen assignment: weighted edge disagreement
    /// plus the displacement and index terms.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }
}

/// Aligns detected room boxes to the nodes of a reference adjacency graph.
///
/// Minimises the number of room pairs whose geometric adjacency disagrees
/// with the reference graph, then the displacement to expected positions,
/// then `|box - node|`. Boxes and nodes of different type are never paired.
///
/// The Hungarian algorithm first solves, per room type, the linear
/// relaxation that compares neighbour-type multisets. Its assignment seeds
/// an exact branch and bound over the type-consistent assignments.
pub struct MatchRooms<'a> {
    boxes: &'a [RoomBox],
    graph: &'a AdjacencyGraph,
    params: MatchParams,
    epsilon: f64,
}

impl<'a> MatchRooms<'a> {
    /// Creates a matcher with default parameters.
    #[must_use]
    pub fn new(boxes: &'a [RoomBox], graph: &'a AdjacencyGraph) -> Self {
        Self {
            boxes,
            graph,
            params: MatchParams::default(),
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// Sets cost weights and the partial-match policy.
    #[must_use]
    pub fn with_params(mut self, params: MatchParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the relative epsilon used by the adjacency predicate.
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Node × box cost matrix of the linear relaxation; different-type pairs
    /// are infinite.
    #[must_use]
    pub fn cost_matrix(&self) -> DMatrix<f64> {
        cost::cost_matrix(self.boxes, self.graph, &self.adjacency(), &self.params)
    }

    /// Executes the assignment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParamsError` for a negative or non-finite weight, and
    /// `AlignmentInfeasibleError::NoCandidate` when a node's type has no
    /// detected box. Unless partial matches are allowed, also returns
    /// `CountMismatch` when the counts differ and `TypeCountMismatch` when
    /// the per-type counts differ.
    pub fn execute(&self) -> Result<Alignment<'a>> {
        self.params.validate()?;
        self.check_feasible()?;

        let adjacency = self.adjacency();
        let relaxed = cost::cost_matrix(self.boxes, self.graph, &adjacency, &self.params);
        let linear = linear_costs(self.boxes, self.graph, &self.params);
        let blocks = self.type_blocks();

        let mut seed = vec![None; self.graph.node_count()];
        for (room_type, (nodes, boxes)) in &blocks {
            let block = DMatrix::from_fn(nodes.len(), boxes.len(), |r, c| relaxed[(nodes[r], boxes[c])]);
            for (r, c) in min_cost_assignment(&block).into_iter().enumerate() {
                seed[nodes[r]] = c.map(|c| boxes[c]);
            }
            debug!(%room_type, nodes = nodes.len(), boxes = boxes.len(), "relaxed type block");
        }
        let weight = self.params.structure_weight;
        let seed = Incumbent {
            cost: objective(&seed, self.graph, &adjacency, &linear, weight),
            slots: seed,
        };
        let seed_cost = seed.cost;

        let (best, proven) = Search::new(
            self.graph,
            &adjacency,
            &linear,
            weight,
            blocks.values(),
            seed,
            self.params.search_limit,
        )
        .run();
        if !proven {
            warn!(
                limit = self.params.search_limit,
                "assignment search hit its expansion limit; keeping the best assignment found"
            );
        }

        let node_to_box: BTreeMap<usize, usize> = best
            .slots
            .iter()
            .enumerate()
            .filter_map(|(n, b)| b.map(|b| (n, b)))
            .collect();
        let unmatched_nodes: Vec<usize> = (0..self.graph.node_count())
            .filter(|n| !node_to_box.contains_key(n))
            .collect();
        let mut used = vec![false; self.boxes.len()];
        for &b in node_to_box.values() {
            used[b] = true;
        }
        let unmatched_boxes: Vec<usize> = (0..self.boxes.len()).filter(|&b| !used[b]).collect();

        let pairs: Vec<(usize, usize)> = node_to_box.iter().map(|(&n, &b)| (n, b)).collect();
        let structural_cost = structural_disagreement(&pairs, self.graph, &adjacency);

        debug!(
            matched = pairs.len(),
            unmatched_nodes = unmatched_nodes.len(),
            unmatched_boxes = unmatched_boxes.len(),
            structural_cost,
            seed_cost,
            total_cost = best.cost,
            "rooms aligned"
        );

        Ok(Alignment {
            boxes: self.boxes,
            node_to_box,
            node_count: self.graph.node_count(),
            unmatched_nodes,
            unmatched_boxes,
            structural_cost,
            total_cost: best.cost,
        })
    }

    fn adjacency(&self) -> BoxAdjacency {
        let eps = self.epsilon * detected_scale(self.boxes);
        BoxAdjacency::build(self.boxes, self.params.adjacency_gap, eps)
    }

    /// Node and box indices grouped by room type, in type order.
    fn type_blocks(&self) -> BTreeMap<RoomType, (Vec<usize>, Vec<usize>)> {
        let mut blocks: BTreeMap<RoomType, (Vec<usize>, Vec<usize>)> = BTreeMap::new();
        for (node, &t) in self.graph.types().iter().enumerate() {
            blocks.entry(t).or_default().0.push(node);
        }
        for (b, room) in self.boxes.iter().enumerate() {
            blocks.entry(room.room_type()).or_default().1.push(b);
        }
        blocks
    }

    fn check_feasible(&self) -> std::result::Result<(), AlignmentInfeasibleError> {
        let detected = self.boxes.len();
        let reference = self.graph.node_count();
        if !self.params.allow_partial && detected != reference {
            return Err(AlignmentInfeasibleError::CountMismatch {
                detected,
                reference,
            });
        }

        let blocks = self.type_blocks();
        for (node, &room_type) in self.graph.types().iter().enumerate() {
            let (nodes, boxes) = &blocks[&room_type];
            if boxes.is_empty() {
                return Err(AlignmentInfeasibleError::NoCandidate { node, room_type });
            }
            if !self.params.allow_partial && boxes.len() != nodes.len() {
                return Err(AlignmentInfeasibleError::TypeCountMismatch {
                    node,
                    room_type,
                    detected: boxes.len(),
                    reference: nodes.len(),
                });
            }
        }
        Ok(())
    }
}

fn detected_scale(boxes: &[RoomBox]) -> f64 {
    let (mut x0, mut y0) = (f64::INFINITY, f64::INFINITY);
    let (mut x1, mut y1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for b in boxes {
        x0 = x0.min(b.x_min());
        y0 = y0.min(b.y_min());
        x1 = x1.max(b.x_max());
        y1 = y1.max(b.y_max());
    }
    let scale = (x1 - x0).max(y1 - y0);
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{FloorplanError, InvalidParamsError};
    use crate::math::Point2;
    use proptest::prelude::*;

    fn room(x0: f64, y0: f64, x1: f64, y1: f64, t: RoomType) -> RoomBox {
        RoomBox::new(x0, y0, x1, y1, t).unwrap()
    }

    /// 2x2 grid of 5x5 rooms: 0 bottom-left, 1 bottom-right, 2 top-left, 3 top-right.
    fn grid_boxes(types: [RoomType; 4]) -> Vec<RoomBox> {
        vec![
            room(0.0, 0.0, 5.0, 5.0, types[0]),
            room(5.0, 0.0, 10.0, 5.0, types[1]),
            room(0.0, 5.0, 5.0, 10.0, types[2]),
            room(5.0, 5.0, 10.0, 10.0, types[3]),
        ]
    }

    fn grid_graph(types: [RoomType; 4]) -> AdjacencyGraph {
        AdjacencyGraph::new(types.to_vec(), [(0, 1), (0, 2), (1, 3), (2, 3)]).unwrap()
    }

    const DISTINCT: [RoomType; 4] = [
        RoomType::LivingRoom,
        RoomType::Kitchen,
        RoomType::MasterRoom,
        RoomType::Bathroom,
    ];

    #[test]
    fn exact_grid_is_identity() {
        let boxes = grid_boxes(DISTINCT);
        let graph = grid_graph(DISTINCT);
        let matcher = MatchRooms::new(&boxes, &graph);
        let cost = matcher.cost_matrix();
        assert_eq!(cost.shape(), (4, 4));
        assert!(cost[(0, 1)].is_infinite());
        let alignment = matcher.execute().unwrap();
        assert_eq!(alignment.order(), Some(vec![0, 1, 2, 3]));
        assert_eq!(alignment.structural_cost(), 0);
        assert!(alignment.unmatched_nodes().is_empty());
        assert!(alignment.total_cost().abs() < 1e-12);
    }

    #[test]
    fn shuffled_boxes_are_recovered() {
        let boxes = grid_boxes(DISTINCT);
        let shuffled = vec![boxes[3], boxes[0], boxes[2], boxes[1]];
        let graph = grid_graph(DISTINCT);
        let alignment = MatchRooms::new(&shuffled, &graph).execute().unwrap();
        assert_eq!(alignment.order(), Some(vec![1, 3, 2, 0]));
        let aligned = alignment.boxes_aligned();
        for (node, room) in aligned.iter().enumerate() {
            assert!(std::ptr::eq(room.unwrap(), &shuffled[alignment.detected_index(node).unwrap()]));
            assert_eq!(room.unwrap().room_type(), graph.room_type(node));
        }
    }

    #[test]
    fn same_types_resolved_by_structure() {
        // Chain living - bedroom - bath - bedroom; both bedrooms look alike by
        // type, structure decides.
        let boxes = vec![
            room(0.0, 0.0, 2.0, 2.0, RoomType::SecondRoom),
            room(2.0, 0.0, 4.0, 2.0, RoomType::Bathroom),
            room(4.0, 0.0, 6.0, 2.0, RoomType::SecondRoom),
            room(6.0, 0.0, 8.0, 2.0, RoomType::LivingRoom),
        ];
        // Node 0 is the bedroom next to the living room.
        let graph = AdjacencyGraph::new(
            vec![
                RoomType::SecondRoom,
                RoomType::LivingRoom,
                RoomType::Bathroom,
                RoomType::SecondRoom,
            ],
            [(0, 1), (0, 2), (2, 3)],
        )
        .unwrap();
        let alignment = MatchRooms::new(&boxes, &graph).execute().unwrap();
        assert_eq!(alignment.order(), Some(vec![2, 3, 1, 0]));
        assert_eq!(alignment.structural_cost(), 0);
    }

    #[test]
    fn positions_break_structural_ties() {
        let types = [RoomType::SecondRoom; 4];
        let boxes = grid_boxes(types);
        let graph = grid_graph(types)
            .with_positions(vec![
                Point2::new(7.5, 7.5),
                Point2::new(2.5, 7.5),
                Point2::new(7.5, 2.5),
                Point2::new(2.5, 2.5),
            ])
            .unwrap();
        let alignment = MatchRooms::new(&boxes, &graph).execute().unwrap();
        assert_eq!(alignment.order(), Some(vec![3, 2, 1, 0]));
    }

    #[test]
    fn identical_rooms_fall_back_to_index_order() {
        let types = [RoomType::SecondRoom; 4];
        let boxes = grid_boxes(types);
        let graph = grid_graph(types);
        let alignment = MatchRooms::new(&boxes, &graph).execute().unwrap();
        assert_eq!(alignment.order(), Some(vec![0, 1, 2, 3]));
    }

    #[test]
    fn same_type_chain_follows_the_edges() {
        // Four equal rooms in a row; the reference chain visits them 0-2-1-3.
        let boxes: Vec<RoomBox> = (0..4)
            .map(|i| {
                let x = f64::from(i) * 2.0;
                room(x, 0.0, x + 2.0, 2.0, RoomType::SecondRoom)
            })
            .collect();
        let graph =
            AdjacencyGraph::new(vec![RoomType::SecondRoom; 4], [(0, 2), (2, 1), (1, 3)]).unwrap();
        let relaxed = MatchRooms::new(&boxes, &graph).cost_matrix();
        assert!(relaxed[(0, 0)].abs() < 1e-12 && relaxed[(1, 1)].abs() < 1e-12);

        let alignment = MatchRooms::new(&boxes, &graph).execute().unwrap();
        assert_eq!(alignment.order(), Some(vec![0, 2, 1, 3]));
        assert_eq!(alignment.structural_cost(), 0);
        assert!((alignment.total_cost() - 2e-9).abs() < 1e-12);
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        let boxes = grid_boxes(DISTINCT);
        let graph = grid_graph(DISTINCT);
        let params = MatchParams {
            structure_weight: f64::INFINITY,
            ..MatchParams::default()
        };
        let err = MatchRooms::new(&boxes, &graph)
            .with_params(params)
            .execute()
            .unwrap_err();
        assert!(matches!(
            err,
            FloorplanError::Params(InvalidParamsError {
                name: "structure_weight",
                ..
            })
        ));
    }

    #[test]
    fn count_mismatch_is_infeasible() {
        let boxes = grid_boxes(DISTINCT)[..3].to_vec();
        let graph = grid_graph(DISTINCT);
        let err = MatchRooms::new(&boxes, &graph).execute().unwrap_err();
        assert!(matches!(
            err,
            FloorplanError::Alignment(AlignmentInfeasibleError::CountMismatch {
                detected: 3,
                reference: 4
            })
        ));
    }

    #[test]
    fn missing_type_names_the_node() {
        let mut types = DISTINCT;
        types[2] = RoomType::Balcony;
        let boxes = grid_boxes(DISTINCT);
        let graph = grid_graph(types);
        let err = MatchRooms::new(&boxes, &graph).execute().unwrap_err();
        assert!(matches!(
            err,
            FloorplanError::Alignment(AlignmentInfeasibleError::NoCandidate { node: 2, .. })
        ));
    }

    #[test]
    fn per_type_count_mismatch() {
        let boxes = grid_boxes([
            RoomType::Kitchen,
            RoomType::Kitchen,
            RoomType::Bathroom,
            RoomType::Bathroom,
        ]);
        let graph = grid_graph([
            RoomType::Kitchen,
            RoomType::Bathroom,
            RoomType::Bathroom,
            RoomType::Bathroom,
        ]);
        let err = MatchRooms::new(&boxes, &graph).execute().unwrap_err();
        assert!(matches!(
            err,
            FloorplanError::Alignment(AlignmentInfeasibleError::TypeCountMismatch {
                node: 0,
                detected: 2,
                reference: 1,
                ..
            })
        ));
    }

    #[test]
    fn partial_mode_reports_unmatched() {
        let types = [
            RoomType::SecondRoom,
            RoomType::SecondRoom,
            RoomType::Kitchen,
            RoomType::Bathroom,
        ];
        let full = grid_boxes(types);
        let boxes = vec![full[0], full[2], full[3]];
        let graph = grid_graph(types);
        let params = MatchParams {
            allow_partial: true,
            ..MatchParams::default()
        };
        let alignment = MatchRooms::new(&boxes, &graph)
            .with_params(params)
            .execute()
            .unwrap();
        assert_eq!(alignment.order(), None);
        assert!(!alignment.is_complete());
        assert_eq!(alignment.unmatched_nodes(), &[1]);
        assert!(alignment.unmatched_boxes().is_empty());
        assert_eq!(alignment.pairs(), vec![(0, 0), (2, 1), (3, 2)]);
        assert!(alignment.boxes_aligned()[1].is_none());
    }

    #[test]
    fn partial_mode_reports_surplus_boxes() {
        let mut boxes = grid_boxes(DISTINCT);
        boxes.push(room(10.0, 0.0, 12.0, 2.0, RoomType::Kitchen));
        let graph = grid_graph(DISTINCT);
        let params = MatchParams {
            allow_partial: true,
            ..MatchParams::default()
        };
        let alignment = MatchRooms::new(&boxes, &graph)
            .with_params(params)
            .execute()
            .unwrap();
        assert_eq!(alignment.order(), Some(vec![0, 1, 2, 3]));
        assert_eq!(alignment.unmatched_boxes(), &[4]);
    }

    proptest! {
        #[test]
        fn shuffled_input_is_recovered(perm in Just(vec![0usize, 1, 2, 3]).prop_shuffle()) {
            // Both bedrooms share a type; their neighbours tell them apart.
            let types = [RoomType::SecondRoom, RoomType::SecondRoom, RoomType::Kitchen, RoomType::Bathroom];
            let base = grid_boxes(types);
            let boxes: Vec<RoomBox> = perm.iter().map(|&i| base[i]).collect();
            let graph = grid_graph(types);
            let first = MatchRooms::new(&boxes, &graph).execute().unwrap();
            let second = MatchRooms::new(&boxes, &graph).execute().unwrap();
            let order = first.order().unwrap();
            prop_assert_eq!(Some(order.clone()), second.order());
            for (node, &detected) in order.iter().enumerate() {
                prop_assert_eq!(perm[detected], node);
            }
            prop_assert_eq!(first.structural_cost(), 0);
        }

        #[test]
        fn structural_cost_is_the_true_minimum(mask in proptest::collection::vec(any::<bool>(), 10)) {
            // Five equal rooms: a 2x2 grid plus one room east of the bottom row.
            let mut boxes = grid_boxes([RoomType::SecondRoom; 4]);
            boxes.push(room(10.0, 0.0, 15.0, 5.0, RoomType::SecondRoom));
            let pairs: Vec<(usize, usize)> = (0..5)
                .flat_map(|u| ((u + 1)..5).map(move |v| (u, v)))
                .collect();
            let edges: Vec<(usize, usize)> = pairs
                .iter()
                .zip(&mask)
                .filter_map(|(&edge, &keep)| keep.then_some(edge))
                .collect();
            let graph = AdjacencyGraph::new(vec![RoomType::SecondRoom; 5], edges).unwrap();
            let adjacency = BoxAdjacency::build(&boxes, 0.0, 1e-9);

            let mut best = usize::MAX;
            let mut perm: Vec<usize> = (0..5).collect();
            permutations(&mut perm, 0, &mut |order| {
                let assignment: Vec<(usize, usize)> = order.iter().copied().enumerate().collect();
                best = best.min(structural_disagreement(&assignment, &graph, &adjacency));
            });

            let alignment = MatchRooms::new(&boxes, &graph).execute().unwrap();
            prop_assert_eq!(alignment.structural_cost(), best);
        }
    }

    fn permutations(items: &mut [usize], k: usize, visit: &mut impl FnMut(&[usize])) {
        if k == items.len() {
            visit(items);
            return;
        }
        for i in k..items.len() {
            items.swap(k, i);
            permutations(items, k + 1, visit);
            items.swap(k, i);
        }
    }
}
