//! Tunable parameters for every pipeline stage.
//!
//! Each stage reads its own `*Params` struct; [`PipelineConfig`] bundles them
//! so a caller can load one object (for example from JSON) and pass it in.
//! Missing fields take their defaults.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::InvalidParamsError;
use crate::geometry::RoomType;
use crate::math::DEFAULT_EPSILON;

/// Numerical tolerance shared by all geometric predicates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryParams {
    /// Relative epsilon; multiplied by the larger side of the boundary's
    /// bounding box to obtain the absolute tolerance.
    pub epsilon: f64,
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Cost weighting and feasibility policy of the graph matcher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    /// Weight of each pair of rooms whose geometric adjacency disagrees with
    /// the reference graph.
    pub structure_weight: f64,
    /// Weight of the normalised centroid displacement to the node's expected
    /// position. Only used when the graph carries positions.
    pub displacement_weight: f64,
    /// Weight of `|box index - node index|`; resolves exact ties.
    pub index_weight: f64,
    /// Largest wall gap between two boxes still considered adjacent.
    pub adjacency_gap: f64,
    /// Allow detected and reference counts to differ and report unmatched
    /// entries instead of failing.
    pub allow_partial: bool,
    /// Search nodes the exact matcher may expand before settling for the
    /// best assignment found so far.
    pub search_limit: usize,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            structure_weight: 1.0,
            displacement_weight: 1e-3,
            index_weight: 1e-9,
            adjacency_gap: 0.0,
            allow_partial: false,
            search_limit: 2_000_000,
        }
    }
}

impl MatchParams {
    /// Checks that every weight and the adjacency gap are finite and
    /// non-negative.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParamsError` naming the first offending field.
    pub fn validate(&self) -> Result<(), InvalidParamsError> {
        [
            ("structure_weight", self.structure_weight),
            ("displacement_weight", self.displacement_weight),
            ("index_weight", self.index_weight),
            ("adjacency_gap", self.adjacency_gap),
        ]
        .into_iter()
        .find(|&(_, value)| !(value.is_finite() && value >= 0.0))
        .map_or(Ok(()), |(name, value)| Err(InvalidParamsError { name, value }))
    }
}

/// Coverage-repair limits of the boundary partitioner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionParams {
    /// Largest fraction of the boundary area allowed to stay uncovered.
    pub max_gap_fraction: f64,
}

impl Default for PartitionParams {
    fn default() -> Self {
        Self {
            max_gap_fraction: 0.02,
        }
    }
}

/// Door and window sizes and the rooms that receive windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpeningParams {
    /// Door length along the wall.
    pub door_width: f64,
    /// Shortest shared wall that can host a door.
    pub min_door_length: f64,
    /// Window length along the wall.
    pub window_width: f64,
    /// Shortest exterior wall piece that can host a window.
    pub min_window_length: f64,
    /// Room types that receive windows on exterior walls.
    pub exterior_types: BTreeSet<RoomType>,
}

impl Default for OpeningParams {
    fn default() -> Self {
        Self {
            door_width: 0.9,
            min_door_length: 1.0,
            window_width: 1.5,
            min_window_length: 1.0,
            exterior_types: [
                RoomType::LivingRoom,
                RoomType::MasterRoom,
                RoomType::Kitchen,
                RoomType::DiningRoom,
                RoomType::ChildRoom,
                RoomType::StudyRoom,
                RoomType::SecondRoom,
                RoomType::GuestRoom,
                RoomType::Balcony,
            ]
            .into_iter()
            .collect(),
        }
    }
}

/// All pipeline parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub geometry: GeometryParams,
    pub matching: MatchParams,
    pub partition: PartitionParams,
    pub openings: OpeningParams,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{"matching":{"allow_partial":true},"openings":{"exterior_types":[3]}}"#,
        )
        .unwrap();
        assert!(cfg.matching.allow_partial);
        assert!((cfg.matching.structure_weight - 1.0).abs() < f64::EPSILON);
        assert_eq!(cfg.openings.exterior_types.len(), 1);
        assert!(cfg.openings.exterior_types.contains(&RoomType::Bathroom));
        assert!((cfg.partition.max_gap_fraction - 0.02).abs() < f64::EPSILON);
    }

    #[test]
    fn match_weights_are_validated() {
        assert!(MatchParams::default().validate().is_ok());
        let params = MatchParams {
            structure_weight: f64::INFINITY,
            ..MatchParams::default()
        };
        let err = params.validate().unwrap_err();
        assert_eq!(err.name, "structure_weight");
        let params = MatchParams {
            adjacency_gap: -0.5,
            ..MatchParams::default()
        };
        assert_eq!(params.validate().unwrap_err().name, "adjacency_gap");
        let params = MatchParams {
            index_weight: f64::NAN,
            ..MatchParams::default()
        };
        assert_eq!(params.validate().unwrap_err().name, "index_weight");
    }

    #[test]
    fn roundtrips_through_json() {
        let cfg = PipelineConfig::default();
        let text = serde_json::to_string(&cfg).unwrap();
        let back: PipelineConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
