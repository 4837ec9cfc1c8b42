use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::room_box::RoomType;
use crate::error::{DegenerateGeometryError, GeometryEntity};
use crate::math::Point2;

/// Reference room adjacency: typed nodes and undirected shared-wall edges.
///
/// Edges are stored as `(u, v)` with `u < v`, sorted and without duplicates.
/// Optional expected positions (one per node) feed the matcher's tie-break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphRecord")]
pub struct AdjacencyGraph {
    types: Vec<RoomType>,
    edges: Vec<(usize, usize)>,
    positions: Option<Vec<Point2>>,
}

#[derive(Deserialize)]
struct GraphRecord {
    types: Vec<RoomType>,
    edges: Vec<(usize, usize)>,
    #[serde(default)]
    positions: Option<Vec<Point2>>,
}

impl TryFrom<GraphRecord> for AdjacencyGraph {
    type Error = DegenerateGeometryError;

    fn try_from(r: GraphRecord) -> Result<Self, Self::Error> {
        let graph = Self::new(r.types, r.edges)?;
        match r.positions {
            Some(positions) => graph.with_positions(positions),
            None => Ok(graph),
        }
    }
}

impl AdjacencyGraph {
    /// Creates a graph from node types and edges.
    ///
    /// Self-loops are dropped; `(v, u)` and `(u, v)` are the same edge.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometryError::InvalidEdge` naming the first edge
    /// with an endpoint outside `0..types.len()`.
    pub fn new(
        types: Vec<RoomType>,
        edges: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, DegenerateGeometryError> {
        let node_count = types.len();
        let mut canonical = BTreeSet::new();
        for (index, (u, v)) in edges.into_iter().enumerate() {
            if let Some(&node) = [u, v].iter().find(|&&n| n >= node_count) {
                return Err(DegenerateGeometryError::InvalidEdge {
                    entity: GeometryEntity::GraphEdge(index),
                    node,
                    node_count,
                });
            }
            if u != v {
                canonical.insert((u.min(v), u.max(v)));
            }
        }
        Ok(Self {
            types,
            edges: canonical.into_iter().collect(),
            positions: None,
        })
    }

    /// Attaches expected node positions.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometryError::PositionCount` when the number of
    /// positions differs from the node count, or `NonFinite` for a bad point.
    pub fn with_positions(mut self, positions: Vec<Point2>) -> Result<Self, DegenerateGeometryError> {
        if positions.len() != self.types.len() {
            return Err(DegenerateGeometryError::PositionCount {
                expected: self.types.len(),
                actual: positions.len(),
            });
        }
        if !positions.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
            return Err(DegenerateGeometryError::NonFinite {
                entity: GeometryEntity::Graph,
            });
        }
        self.positions = Some(positions);
        Ok(self)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn types(&self) -> &[RoomType] {
        &self.types
    }

    #[must_use]
    pub fn room_type(&self, node: usize) -> RoomType {
        self.types[node]
    }

    /// Canonical edge list, `(u, v)` with `u < v`, ascending.
    #[must_use]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    #[must_use]
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.edges.binary_search(&(u.min(v), u.max(v))).is_ok()
    }

    /// Neighbours of `node` in ascending order.
    #[must_use]
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .edges
            .iter()
            .filter_map(|&(u, v)| {
                if u == node {
                    Some(v)
                } else if v == node {
                    Some(u)
                } else {
                    None
                }
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Sorted multiset of the neighbours' room types.
    #[must_use]
    pub fn neighbor_types(&self, node: usize) -> Vec<RoomType> {
        let mut out: Vec<RoomType> = self
            .neighbors(node)
            .into_iter()
            .map(|n| self.types[n])
            .collect();
        out.sort_unstable();
        out
    }

    #[must_use]
    pub fn positions(&self) -> Option<&[Point2]> {
        self.positions.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_canonical_and_deduplicated() {
        let g = AdjacencyGraph::new(
            vec![RoomType::LivingRoom, RoomType::Kitchen, RoomType::Bathroom],
            [(1, 0), (0, 1), (2, 0), (1, 1)],
        )
        .unwrap();
        assert_eq!(g.edges(), &[(0, 1), (0, 2)]);
        assert!(g.has_edge(1, 0));
        assert!(!g.has_edge(1, 2));
        assert_eq!(g.neighbors(0), vec![1, 2]);
        assert_eq!(
            g.neighbor_types(0),
            vec![RoomType::Kitchen, RoomType::Bathroom]
        );
    }

    #[test]
    fn invalid_endpoint_names_edge() {
        let err = AdjacencyGraph::new(vec![RoomType::Kitchen], [(0, 3)]).unwrap_err();
        assert!(matches!(
            err,
            DegenerateGeometryError::InvalidEdge {
                entity: GeometryEntity::GraphEdge(0),
                node: 3,
                node_count: 1,
            }
        ));
    }

    #[test]
    fn position_count_checked() {
        let g = AdjacencyGraph::new(vec![RoomType::Kitchen, RoomType::Balcony], Vec::new()).unwrap();
        assert!(g.clone().with_positions(vec![Point2::new(0.0, 0.0)]).is_err());
        let g = g
            .with_positions(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)])
            .unwrap();
        assert_eq!(g.positions().unwrap().len(), 2);
    }

    #[test]
    fn deserializes_from_record() {
        let g: AdjacencyGraph =
            serde_json::from_str(r#"{"types":[0,2,3],"edges":[[0,1],[2,0]]}"#).unwrap();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edges(), &[(0, 1), (0, 2)]);
        assert!(serde_json::from_str::<AdjacencyGraph>(r#"{"types":[0],"edges":[[0,1]]}"#).is_err());
    }
}
