use serde::Serialize;
use tracing::debug;

use crate::config::OpeningParams;
use crate::geometry::{shared_segment, AdjacencyGraph, Polygon, Segment};
use crate::math::intersect_2d::collinear_overlap;
use crate::math::DEFAULT_EPSILON;
use crate::operations::partition::RoomPartition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningKind {
    Door,
    Window,
}

/// A door or window placed on a wall segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Opening {
    pub kind: OpeningKind,
    pub segment: Segment,
    /// Owning node, and for doors the node on the other side.
    pub rooms: (usize, Option<usize>),
}

/// Doors and windows of one partition, in placement order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Openings {
    pub doors: Vec<Opening>,
    pub windows: Vec<Opening>,
}

/// Places doors on walls shared by reference-adjacent rooms and windows on
/// the exterior walls of rooms whose type faces outside.
pub struct PlaceOpenings<'a> {
    partition: &'a RoomPartition,
    graph: &'a AdjacencyGraph,
    boundary: &'a Polygon,
    params: OpeningParams,
    epsilon: f64,
}

impl<'a> PlaceOpenings<'a> {
    #[must_use]
    pub fn new(partition: &'a RoomPartition, graph: &'a AdjacencyGraph, boundary: &'a Polygon) -> Self {
        Self {
            partition,
            graph,
            boundary,
            params: OpeningParams::default(),
            epsilon: DEFAULT_EPSILON,
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: OpeningParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the epsilon, relative to the boundary's bounding box.
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    #[must_use]
    pub fn execute(&self) -> Openings {
        let eps = self.boundary.tolerance(self.epsilon);
        let openings = Openings {
            doors: self.doors(eps),
            windows: self.windows(eps),
        };
        debug!(
            doors = openings.doors.len(),
            windows = openings.windows.len(),
            "openings placed"
        );
        openings
    }

    fn doors(&self, eps: f64) -> Vec<Opening> {
        self.graph
            .edges()
            .iter()
            .filter_map(|&(u, v)| {
                let wall = shared_segment(self.partition.room(u)?, self.partition.room(v)?, eps)?;
                (wall.length() + eps >= self.params.min_door_length).then(|| Opening {
                    kind: OpeningKind::Door,
                    segment: wall.centered(self.params.door_width),
                    rooms: (u, Some(v)),
                })
            })
            .collect()
    }

    fn windows(&self, eps: f64) -> Vec<Opening> {
        let mut windows = Vec::new();
        for (&node, polygon) in self.partition.rooms() {
            if !self.params.exterior_types.contains(&self.graph.room_type(node)) {
                continue;
            }
            for (r0, r1) in polygon.edges() {
                for (b0, b1) in self.boundary.edges() {
                    let Some((s, e)) = collinear_overlap(&r0, &r1, &b0, &b1, eps) else {
                        continue;
                    };
                    let wall = Segment::new(s, e);
                    if wall.length() + eps >= self.params.min_window_length {
                        windows.push(Opening {
                            kind: OpeningKind::Window,
                            segment: wall.centered(self.params.window_width),
                            rooms: (node, None),
                        });
                    }
                }
            }
        }
        windows
    }
}
