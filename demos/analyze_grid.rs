//! Analyzes a synthetic 2x2 floorplan and prints the report as JSON.
//!
//! ```text
//! cargo run --example analyze_grid
//! RUST_LOG=floorplan_align=debug cargo run --example analyze_grid
//! ```

use floorplan_align::geometry::{AdjacencyGraph, RoomType};
use floorplan_align::math::Point2;
use floorplan_align::{AnalyzeFloorplan, FloorplanSample, PipelineConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Default: WARN for everything, INFO for the library.
    // Override with RUST_LOG env var.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("floorplan_align=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let types = vec![
        RoomType::LivingRoom,
        RoomType::Kitchen,
        RoomType::MasterRoom,
        RoomType::Bathroom,
    ];
    let graph = AdjacencyGraph::new(types, [(0, 1), (0, 2), (1, 3), (2, 3)])?;

    // Detected boxes arrive in arbitrary order and slightly off the walls.
    let sample = FloorplanSample::from_parts(
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ],
        [
            ([5.2, 5.0, 10.0, 10.0], RoomType::Bathroom),
            ([0.0, 0.0, 5.3, 5.1], RoomType::LivingRoom),
            ([0.0, 5.1, 4.9, 10.0], RoomType::MasterRoom),
            ([5.0, 0.0, 10.0, 4.8], RoomType::Kitchen),
        ],
        graph,
        1e-6,
    )?;

    let config: PipelineConfig = serde_json::from_str(r#"{"matching": {"adjacency_gap": 0.5}}"#)?;
    let analysis = AnalyzeFloorplan::new(&sample).with_config(config).execute()?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
