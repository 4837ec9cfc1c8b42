//! End-to-end analysis of one floorplan sample.
//!
//! The matcher runs once; its [`Alignment`] feeds both the partitioner and,
//! through the partition, the opening placer. The turning function only
//! looks at the outer boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::error::{GeometryEntity, Result};
use crate::geometry::{AdjacencyGraph, Polygon, RoomBox, RoomType};
use crate::math::Point2;
use crate::operations::{
    Alignment, MatchRooms, Opening, Openings, PartitionBoundary, PlaceOpenings, RoomPartition,
    TurningFunction,
};

/// One floorplan: outer boundary, detected room boxes and the reference graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorplanSample {
    pub boundary: Polygon,
    pub boxes: Vec<RoomBox>,
    pub graph: AdjacencyGraph,
}

impl FloorplanSample {
    /// Builds a sample from raw coordinates, naming the offending entity on
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometryError` for an invalid boundary (entity
    /// `Boundary`) or box (entity `RoomBox(i)`).
    pub fn from_parts(
        boundary: Vec<Point2>,
        boxes: impl IntoIterator<Item = ([f64; 4], RoomType)>,
        graph: AdjacencyGraph,
        epsilon: f64,
    ) -> Result<Self> {
        let boundary = Polygon::new(boundary, epsilon)
            .map_err(|err| err.with_entity(GeometryEntity::Boundary))?;
        let boxes = boxes
            .into_iter()
            .enumerate()
            .map(|(i, ([x0, y0, x1, y1], room_type))| {
                RoomBox::new(x0, y0, x1, y1, room_type)
                    .map_err(|err| err.with_entity(GeometryEntity::RoomBox(i)))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            boundary,
            boxes,
            graph,
        })
    }
}

/// Runs matching, partition, opening placement and the boundary signature.
pub struct AnalyzeFloorplan<'a> {
    sample: &'a FloorplanSample,
    config: PipelineConfig,
}

impl<'a> AnalyzeFloorplan<'a> {
    #[must_use]
    pub fn new(sample: &'a FloorplanSample) -> Self {
        Self {
            sample,
            config: PipelineConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Executes the pipeline.
    ///
    /// # Errors
    ///
    /// Propagates the first failing stage's error; see
    /// [`FloorplanError::stage`](crate::FloorplanError::stage).
    pub fn execute(&self) -> Result<FloorplanAnalysis<'a>> {
        self.run().inspect_err(|err| {
            warn!(stage = %err.stage(), error = %err, "floorplan analysis failed");
        })
    }

    fn run(&self) -> Result<FloorplanAnalysis<'a>> {
        let sample = self.sample;
        let epsilon = self.config.geometry.epsilon;

        // The sample may have been validated with another tolerance.
        Polygon::new(sample.boundary.vertices().to_vec(), epsilon)
            .map_err(|err| err.with_entity(GeometryEntity::Boundary))?;

        let alignment = MatchRooms::new(&sample.boxes, &sample.graph)
            .with_params(self.config.matching)
            .with_epsilon(epsilon)
            .execute()?;

        let partition = PartitionBoundary::new(&sample.boundary, &alignment)
            .with_params(self.config.partition)
            .with_epsilon(epsilon)
            .execute()?;

        let openings = PlaceOpenings::new(&partition, &sample.graph, &sample.boundary)
            .with_params(self.config.openings.clone())
            .with_epsilon(epsilon)
            .execute();

        let turning_function = TurningFunction::from_polygon(&sample.boundary);

        debug!(
            rooms = partition.rooms().len(),
            doors = openings.doors.len(),
            windows = openings.windows.len(),
            structural_cost = alignment.structural_cost(),
            "floorplan analysed"
        );

        Ok(FloorplanAnalysis {
            alignment,
            partition,
            openings,
            turning_function,
        })
    }
}

/// Results of one pipeline run. Serializes as its [`AnalysisReport`].
#[derive(Debug, Clone)]
pub struct FloorplanAnalysis<'a> {
    alignment: Alignment<'a>,
    partition: RoomPartition,
    openings: Openings,
    turning_function: TurningFunction,
}

impl<'a> FloorplanAnalysis<'a> {
    #[must_use]
    pub fn alignment(&self) -> &Alignment<'a> {
        &self.alignment
    }

    #[must_use]
    pub fn partition(&self) -> &RoomPartition {
        &self.partition
    }

    #[must_use]
    pub fn doors(&self) -> &[Opening] {
        &self.openings.doors
    }

    #[must_use]
    pub fn windows(&self) -> &[Opening] {
        &self.openings.windows
    }

    #[must_use]
    pub fn turning_function(&self) -> &TurningFunction {
        &self.turning_function
    }

    /// Flat, serializable view of the results.
    #[must_use]
    pub fn report(&self) -> AnalysisReport<'_> {
        AnalysisReport {
            order: self.alignment.order(),
            boxes_aligned: self.alignment.boxes_aligned(),
            unmatched_nodes: self.alignment.unmatched_nodes(),
            unmatched_boxes: self.alignment.unmatched_boxes(),
            structural_cost: self.alignment.structural_cost(),
            room_boundaries: self.partition.rooms(),
            rooms_with_holes: self.partition.rooms_with_holes(),
            residual_fraction: self.partition.residual_fraction(),
            doors: &self.openings.doors,
            windows: &self.openings.windows,
            turning_function: &self.turning_function,
        }
    }
}

impl Serialize for FloorplanAnalysis<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.report().serialize(serializer)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisReport<'r> {
    /// Detected box index per node; absent for partial alignments.
    pub order: Option<Vec<usize>>,
    pub boxes_aligned: Vec<Option<&'r RoomBox>>,
    pub unmatched_nodes: &'r [usize],
    pub unmatched_boxes: &'r [usize],
    pub structural_cost: usize,
    pub room_boundaries: &'r BTreeMap<usize, Polygon>,
    pub rooms_with_holes: &'r [usize],
    pub residual_fraction: f64,
    pub doors: &'r [Opening],
    pub windows: &'r [Opening],
    pub turning_function: &'r TurningFunction,
}
