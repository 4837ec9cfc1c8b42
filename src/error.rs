use std::fmt;

use thiserror::Error;

use crate::geometry::RoomType;

/// Top-level error type for floorplan analysis.
#[derive(Debug, Error)]
pub enum FloorplanError {
    #[error(transparent)]
    Geometry(#[from] DegenerateGeometryError),

    #[error(transparent)]
    Alignment(#[from] AlignmentInfeasibleError),

    #[error(transparent)]
    Gap(#[from] UnrecoverableGapError),

    #[error(transparent)]
    Params(#[from] InvalidParamsError),
}

impl FloorplanError {
    /// Returns the pipeline stage that produced this error.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Geometry(err) => match err.entity() {
                GeometryEntity::RoomBoundary(_) => Stage::Partition,
                GeometryEntity::Signature => Stage::Signature,
                _ => Stage::Input,
            },
            Self::Alignment(_) => Stage::Matching,
            Self::Gap(_) => Stage::Partition,
            Self::Params(_) => Stage::Input,
        }
    }
}

/// Pipeline stage, reported alongside failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Matching,
    Partition,
    Signature,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "input",
            Self::Matching => "matching",
            Self::Partition => "partition",
            Self::Signature => "signature",
        };
        f.write_str(name)
    }
}

/// The geometric entity a [`DegenerateGeometryError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryEntity {
    /// The outer boundary of the sample.
    Boundary,
    /// A detected room box, by index in the sample.
    RoomBox(usize),
    /// A partitioned room polygon, by reference node index.
    RoomBoundary(usize),
    /// The reference graph as a whole.
    Graph,
    /// A reference graph edge, by index in the edge list.
    GraphEdge(usize),
    /// A free-standing polygon passed to the turning function.
    Signature,
    /// A polygon not tied to any sample entity.
    Polygon,
}

impl fmt::Display for GeometryEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boundary => f.write_str("boundary"),
            Self::RoomBox(i) => write!(f, "room box {i}"),
            Self::RoomBoundary(n) => write!(f, "room boundary of node {n}"),
            Self::Graph => f.write_str("reference graph"),
            Self::GraphEdge(e) => write!(f, "graph edge {e}"),
            Self::Signature => f.write_str("signature polygon"),
            Self::Polygon => f.write_str("polygon"),
        }
    }
}

/// Malformed polygon, box or graph input. Fatal for the sample.
#[derive(Debug, Error)]
pub enum DegenerateGeometryError {
    #[error("{entity}: {count} vertices, at least 3 required")]
    TooFewVertices { entity: GeometryEntity, count: usize },

    #[error("{entity}: area {area} is below tolerance")]
    ZeroArea { entity: GeometryEntity, area: f64 },

    #[error("{entity}: edges {first} and {second} intersect")]
    SelfIntersecting {
        entity: GeometryEntity,
        first: usize,
        second: usize,
    },

    #[error("{entity}: inverted or empty extent")]
    InvertedBox { entity: GeometryEntity },

    #[error("{entity}: non-finite coordinate")]
    NonFinite { entity: GeometryEntity },

    #[error("{entity}: endpoint {node} is not a valid node (node count {node_count})")]
    InvalidEdge {
        entity: GeometryEntity,
        node: usize,
        node_count: usize,
    },

    #[error("{entity}: room received no area")]
    EmptyRoom { entity: GeometryEntity },

    #[error("reference graph: {actual} positions for {expected} nodes")]
    PositionCount { expected: usize, actual: usize },
}

impl DegenerateGeometryError {
    /// Returns the entity that triggered the error.
    #[must_use]
    pub fn entity(&self) -> GeometryEntity {
        match self {
            Self::TooFewVertices { entity, .. }
            | Self::ZeroArea { entity, .. }
            | Self::SelfIntersecting { entity, .. }
            | Self::InvertedBox { entity }
            | Self::NonFinite { entity }
            | Self::InvalidEdge { entity, .. }
            | Self::EmptyRoom { entity } => *entity,
            Self::PositionCount { .. } => GeometryEntity::Graph,
        }
    }

    /// Re-targets the error at another entity.
    #[must_use]
    pub fn with_entity(self, entity: GeometryEntity) -> Self {
        match self {
            Self::TooFewVertices { count, .. } => Self::TooFewVertices { entity, count },
            Self::ZeroArea { area, .. } => Self::ZeroArea { entity, area },
            Self::SelfIntersecting { first, second, .. } => Self::SelfIntersecting {
                entity,
                first,
                second,
            },
            Self::InvertedBox { .. } => Self::InvertedBox { entity },
            Self::NonFinite { .. } => Self::NonFinite { entity },
            Self::InvalidEdge {
                node, node_count, ..
            } => Self::InvalidEdge {
                entity,
                node,
                node_count,
            },
            Self::EmptyRoom { .. } => Self::EmptyRoom { entity },
            Self::PositionCount { expected, actual } => Self::PositionCount { expected, actual },
        }
    }
}

/// No type-consistent assignment exists. Fatal for the sample.
#[derive(Debug, Error)]
pub enum AlignmentInfeasibleError {
    #[error("{detected} detected rooms but {reference} reference nodes")]
    CountMismatch { detected: usize, reference: usize },

    #[error("node {node} ({room_type}): no detected room of this type")]
    NoCandidate { node: usize, room_type: RoomType },

    #[error("node {node} ({room_type}): {detected} detected rooms of this type, {reference} required")]
    TypeCountMismatch {
        node: usize,
        room_type: RoomType,
        detected: usize,
        reference: usize,
    },
}

/// Partition repair left too much of the boundary uncovered.
#[derive(Debug, Error)]
#[error("uncovered fraction {residual_fraction:.4} exceeds limit {max_fraction:.4}")]
pub struct UnrecoverableGapError {
    pub residual_fraction: f64,
    pub max_fraction: f64,
}

/// A tunable parameter outside its valid range.
#[derive(Debug, Error)]
#[error("parameter {name} = {value} must be finite and non-negative")]
pub struct InvalidParamsError {
    pub name: &'static str,
    pub value: f64,
}

/// Convenience type alias for results using [`FloorplanError`].
pub type Result<T> = std::result::Result<T, FloorplanError>;
